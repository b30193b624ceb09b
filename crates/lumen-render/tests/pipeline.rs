use lumen_render::{
    Alignment, BlockquoteNode, CodeNode, LiteralMath, MathNode, RenderNode, RenderOptions,
    RenderTree, Renderer, SanitizeMode, StructureNode, TableNode,
};
use pretty_assertions::assert_eq;

fn render(content: &str) -> RenderTree {
    Renderer::new(RenderOptions::default())
        .render(content)
        .unwrap()
}

fn html(text: &str) -> RenderNode {
    RenderNode::Html(text.to_owned())
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_owned()).collect()
}

#[test]
fn test_nested_blockquote_closes_inner_level_first() {
    let tree = render("> level1\n>> level2\n> back to 1");
    assert_eq!(
        tree.nodes,
        vec![RenderNode::Blockquote(BlockquoteNode {
            nested: false,
            children: vec![
                html("level1"),
                RenderNode::Blockquote(BlockquoteNode {
                    nested: true,
                    children: vec![html("level2")],
                }),
                html("back to 1"),
            ],
        })]
    );
}

#[test]
fn test_fenced_pipes_stay_code() {
    let tree = render("```\n| a | b |\n|---|---|\n| 1 | 2 |\n```");
    assert_eq!(
        tree.nodes,
        vec![RenderNode::Code(CodeNode {
            lines: strings(&["| a | b |", "|---|---|", "| 1 | 2 |"]),
            language: None,
            filename: None,
            show_line_numbers: false,
        })]
    );
}

#[test]
fn test_table_alignments() {
    let tree = render("| a | b | c |\n|:---|:---:|---:|\n| 1 | 2 | 3 |");
    assert_eq!(
        tree.nodes,
        vec![RenderNode::Table(TableNode {
            headers: strings(&["a", "b", "c"]),
            rows: vec![strings(&["1", "2", "3"])],
            alignments: vec![Alignment::Left, Alignment::Center, Alignment::Right],
        })]
    );
}

#[test]
fn test_table_alignments_with_fewer_headers() {
    let tree = render("| long header | b |\n|:---|:---:|---:|\n| 1 | 2 | 3 |");
    let RenderNode::Table(table) = &tree.nodes[0] else {
        panic!("expected table, got {:?}", tree.nodes);
    };
    assert_eq!(table.alignments, vec![Alignment::Left, Alignment::Center]);
    assert_eq!(table.rows, vec![strings(&["1", "2", "3"])]);

    let html = tree.to_html(lumen_render::Theme::Light);
    assert!(!html.contains("<td>3</td>"));
}

#[test]
fn test_escaped_emphasis_is_literal() {
    let tree = render(r"\*not bold\*");
    assert_eq!(tree.nodes, vec![html("<p>*not bold*</p>")]);
}

#[test]
fn test_footnote_numbering() {
    let tree = render("One[^b] two[^a] three[^b]\n\n[^a]: Note A\n[^b]: Note B");
    let [RenderNode::Html(body)] = tree.nodes.as_slice() else {
        panic!("expected one html node, got {:?}", tree.nodes);
    };

    assert!(body.contains(r##"One<sup class="footnote-ref"><a href="#fn-1" id="fnref-1">1</a></sup>"##));
    assert!(body.contains(r##"two<sup class="footnote-ref"><a href="#fn-2" id="fnref-2">2</a></sup>"##));
    assert!(body.contains(r##"three<sup class="footnote-ref"><a href="#fn-1" id="fnref-1-2">1</a></sup>"##));

    let first = body.find(r#"<li id="fn-1">Note B"#).unwrap();
    let second = body.find(r#"<li id="fn-2">Note A"#).unwrap();
    assert!(first < second);
}

#[test]
fn test_quoted_table_and_code() {
    let tree = render("> | a |\n> |---|\n> | 1 |\n>\n> ```js\n> let x = 1;\n> ```");
    assert_eq!(
        tree.nodes,
        vec![RenderNode::Blockquote(BlockquoteNode {
            nested: false,
            children: vec![
                RenderNode::Table(TableNode {
                    headers: strings(&["a"]),
                    rows: vec![strings(&["1"])],
                    alignments: vec![Alignment::Left],
                }),
                html("<br>"),
                html("<br>"),
                RenderNode::Code(CodeNode {
                    lines: strings(&["let x = 1;"]),
                    language: Some("js".to_owned()),
                    filename: None,
                    show_line_numbers: false,
                }),
            ],
        })]
    );
}

#[test]
fn test_block_and_inline_math() {
    let renderer = Renderer::new(RenderOptions::default().with_math(LiteralMath));
    let tree = renderer
        .render("Inline $x^2$ here.\n\n$$\n\\int_0^1 f\n$$")
        .unwrap();

    assert_eq!(
        tree.nodes,
        vec![
            html(r#"<p>Inline <span class="math math-inline">$x^2$</span> here.</p>"#),
            RenderNode::Math(MathNode {
                source: "$$\n\\int_0^1 f\n$$".to_owned(),
                inline: false,
                html: "$$\n\\int_0^1 f\n$$".to_owned(),
            }),
        ]
    );
}

#[test]
fn test_structure_fence() {
    let tree = render("Ethanol:\n\n```smiles\nCCO\n```");
    assert_eq!(
        tree.nodes,
        vec![
            html("<p>Ethanol:</p>"),
            RenderNode::Structure(StructureNode::new("CCO")),
        ]
    );
}

#[test]
fn test_script_stripped_when_sanitized() {
    let tree = render("<script>alert(1)</script>hello");
    assert_eq!(tree.nodes, vec![html("<p>hello</p>")]);
}

#[test]
fn test_trusted_mode_keeps_raw_html() {
    let renderer =
        Renderer::new(RenderOptions::default().with_sanitize(SanitizeMode::Trusted));
    let tree = renderer.render("<u>raw</u>").unwrap();
    assert_eq!(tree.nodes, vec![html("<p><u>raw</u></p>")]);
}

#[test]
fn test_external_links_against_current_host() {
    let renderer = Renderer::new(RenderOptions::default().with_current_host("docs.example.com"));
    let tree = renderer
        .render("[in](https://docs.example.com/a) [out](https://other.org/b)")
        .unwrap();
    assert_eq!(
        tree.nodes,
        vec![html(concat!(
            r#"<p><a href="https://docs.example.com/a">in</a> "#,
            r#"<a href="https://other.org/b" target="_blank" rel="noopener noreferrer">out</a></p>"#,
        ))]
    );
}

#[test]
fn test_document_mix() {
    let tree = render("# Title\n\nSome *text* with `code`.\n\n- one\n- two\n\n---");
    assert_eq!(
        tree.nodes,
        vec![html(concat!(
            "<h1 id=\"title\">Title</h1>\n",
            "<p>Some <em>text</em> with <code>code</code>.</p>\n",
            "<ul>\n<li>one</li>\n<li>two</li>\n</ul>\n",
            "<hr>",
        ))]
    );
}

#[test]
fn test_malformed_input_never_panics() {
    let renderer = Renderer::new(RenderOptions::default().with_math(LiteralMath));
    let inputs = [
        "```",
        "```rust\nfn main() {",
        "> ",
        ">>>>>",
        "|",
        "|---|",
        "| a |\n|---|\n|",
        "$$",
        "$ $",
        "\\[ unterminated",
        "{{TABLE0}} {{QUOTE3}} {{NOPE}}",
        "[^",
        "[^a]:",
        "\\",
        "**",
        "[link](",
        "![img](",
        "[[",
        "- [ ]",
        "\u{E000}0\u{E001}",
        "#",
        "> > ```\n> > |a|\n",
    ];

    for input in inputs {
        let _ = renderer.render(input);
    }
}

#[test]
fn test_author_placeholder_text_stays_literal() {
    let tree = render("before\n\n{{CODE5}}\n\nafter");
    assert_eq!(
        tree.nodes,
        vec![html("<p>before</p>\n<p>{{CODE5}}</p>\n<p>after</p>")]
    );
}

#[test]
fn test_author_placeholder_text_beside_real_table() {
    let tree = render("| a |\n|---|\n| 1 |\n\nThe token {{TABLE0}} is our syntax.");
    assert_eq!(
        tree.nodes,
        vec![
            RenderNode::Table(TableNode {
                headers: strings(&["a"]),
                rows: vec![strings(&["1"])],
                alignments: vec![Alignment::Left],
            }),
            html("<p>The token {{TABLE0}} is our syntax.</p>"),
        ]
    );

    let tree = render("Write {{CODE0}} literally");
    assert_eq!(tree.nodes, vec![html("<p>Write {{CODE0}} literally</p>")]);
}

#[test]
fn test_author_placeholder_text_inside_code_and_cells() {
    let tree = render("| t |\n|---|\n| `{{MATH0}}` |\n\n```\n{{QUOTE0}}\n```");
    assert_eq!(
        tree.nodes,
        vec![
            RenderNode::Table(TableNode {
                headers: strings(&["t"]),
                rows: vec![strings(&["<code>{{MATH0}}</code>"])],
                alignments: vec![Alignment::Left],
            }),
            RenderNode::Code(CodeNode {
                lines: strings(&["{{QUOTE0}}"]),
                language: None,
                filename: None,
                show_line_numbers: false,
            }),
        ]
    );
}

#[test]
fn test_block_math_inside_sentence_splits_paragraph() {
    let renderer = Renderer::new(RenderOptions::default().with_math(LiteralMath));
    let tree = renderer.render("The formula $$E=mc^2$$ shows it").unwrap();
    assert_eq!(
        tree.nodes,
        vec![
            html("<p>The formula</p>"),
            RenderNode::Math(MathNode {
                source: "$$E=mc^2$$".to_owned(),
                inline: false,
                html: "$$E=mc^2$$".to_owned(),
            }),
            html("<p>shows it</p>"),
        ]
    );
}

#[test]
fn test_tilde_fence_is_code() {
    let tree = render("~~~\n# not a header\n| a |\n|---|\n~~~");
    assert_eq!(
        tree.nodes,
        vec![RenderNode::Code(CodeNode {
            lines: strings(&["# not a header", "| a |", "|---|"]),
            language: None,
            filename: None,
            show_line_numbers: false,
        })]
    );
}
