//! `lumen render` command implementation.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use lumen_cache::{Cache, MemoryCache};
use lumen_config::{CliSettings, Config, RenderConfig, StructuresConfig};
use lumen_render::{LiteralMath, RenderOptions, RenderTree, Renderer, SanitizeMode, Theme};
use lumen_structures::{HttpTransport, StructureBatcher, hydrate};

use crate::error::CliError;
use crate::output::Output;

/// Output format of the render command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum Format {
    /// Themed HTML document fragment.
    Html,
    /// Render tree as JSON.
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ThemeArg {
    Light,
    Dark,
}

impl From<ThemeArg> for Theme {
    fn from(theme: ThemeArg) -> Self {
        match theme {
            ThemeArg::Light => Self::Light,
            ThemeArg::Dark => Self::Dark,
        }
    }
}

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Markdown file to render.
    file: PathBuf,

    /// Path to configuration file (default: auto-discover lumen.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Html)]
    format: Format,

    /// Color theme (overrides config).
    #[arg(long, value_enum)]
    theme: Option<ThemeArg>,

    /// Skip HTML sanitization. Only for content you control.
    #[arg(long)]
    trusted: bool,

    /// Disable math extraction.
    #[arg(long)]
    no_math: bool,

    /// Structure rendering service URL (overrides config).
    #[arg(long, env = "LUMEN_STRUCTURE_SERVICE")]
    structure_service: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the file cannot be read, or
    /// the output cannot be written.
    pub(crate) async fn execute(self, output: &Output) -> Result<(), CliError> {
        let cli_settings = self.cli_settings();
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let content = std::fs::read_to_string(&self.file).map_err(|source| CliError::Read {
            path: self.file.display().to_string(),
            source,
        })?;

        let renderer = Renderer::new(render_options(&config.render));
        let mut tree = renderer.render(&content).unwrap_or_default();

        if let Some(structures) = &config.structures {
            hydrate_structures(&mut tree, structures).await;
        }

        let document = match self.format {
            Format::Html => tree.to_html(renderer.options().theme),
            Format::Json => serde_json::to_string_pretty(&tree)?,
        };
        output.document(&document)?;

        Ok(())
    }

    fn cli_settings(&self) -> CliSettings {
        CliSettings {
            theme: self.theme.map(Theme::from),
            sanitize: self.trusted.then_some(false),
            math: self.no_math.then_some(false),
            structure_service: self.structure_service.clone(),
        }
    }
}

/// Build renderer options from the `[render]` section.
fn render_options(config: &RenderConfig) -> RenderOptions {
    let sanitize = if config.sanitize {
        SanitizeMode::Sanitized
    } else {
        SanitizeMode::Trusted
    };
    let mut options = RenderOptions::default()
        .with_theme(config.theme)
        .with_sanitize(sanitize)
        .with_line_numbers(config.line_numbers);
    if config.math {
        options = options.with_math(LiteralMath);
    }
    if let Some(host) = &config.current_host {
        options = options.with_current_host(host.clone());
    }
    options
}

async fn hydrate_structures(tree: &mut RenderTree, config: &StructuresConfig) {
    let cache = MemoryCache::new(config.cache_capacity);
    let batcher = StructureBatcher::builder(HttpTransport::new(
        config.service_url.clone(),
        config.timeout(),
    ))
    .with_window(config.window())
    .with_cache(cache.bucket("structures"))
    .with_cache_etag(config.service_url.clone())
    .build();

    let hydrated = hydrate(tree, &batcher).await;
    tracing::info!(hydrated, service = %config.service_url, "rendered structures");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: RenderArgs,
    }

    fn parse(argv: &[&str]) -> RenderArgs {
        TestCli::parse_from(std::iter::once("lumen").chain(argv.iter().copied())).args
    }

    #[test]
    fn test_default_args() {
        let args = parse(&["doc.md"]);
        assert_eq!(args.file, PathBuf::from("doc.md"));
        assert_eq!(args.format, Format::Html);
        assert!(!args.verbose);

        let settings = args.cli_settings();
        assert_eq!(settings.theme, None);
        assert_eq!(settings.sanitize, None);
        assert_eq!(settings.math, None);
    }

    #[test]
    fn test_flags_become_overrides() {
        let args = parse(&[
            "doc.md",
            "--format",
            "json",
            "--theme",
            "dark",
            "--trusted",
            "--no-math",
            "--structure-service",
            "http://localhost:9000",
        ]);
        assert_eq!(args.format, Format::Json);

        let settings = args.cli_settings();
        assert_eq!(settings.theme, Some(Theme::Dark));
        assert_eq!(settings.sanitize, Some(false));
        assert_eq!(settings.math, Some(false));
        assert_eq!(
            settings.structure_service.as_deref(),
            Some("http://localhost:9000")
        );
    }

    #[test]
    fn test_render_options_from_config() {
        let config = RenderConfig {
            theme: Theme::Dark,
            sanitize: false,
            math: false,
            current_host: Some("docs.example.com".to_owned()),
            line_numbers: true,
        };
        let options = render_options(&config);

        assert_eq!(options.theme, Theme::Dark);
        assert_eq!(options.sanitize, SanitizeMode::Trusted);
        assert!(options.math.is_none());
        assert_eq!(options.current_host.as_deref(), Some("docs.example.com"));
        assert!(options.line_numbers_default);
    }

    #[test]
    fn test_default_config_enables_math() {
        let options = render_options(&RenderConfig::default());
        assert!(options.math.is_some());
        assert_eq!(options.sanitize, SanitizeMode::Sanitized);
    }
}
