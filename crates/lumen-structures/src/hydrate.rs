//! Hydration of structure nodes in a render tree.

use std::collections::{BTreeSet, HashMap};

use lumen_render::RenderTree;

use crate::batcher::StructureBatcher;
use crate::transport::StructureTransport;

/// Fill in the image URL of every pending structure node in `tree`.
///
/// All requests are registered before any is awaited, so a whole document
/// goes out in one batch. Nodes that fail keep no URL and carry the error
/// message instead. Returns the number of nodes that received a URL.
pub async fn hydrate<T: StructureTransport>(
    tree: &mut RenderTree,
    batcher: &StructureBatcher<T>,
) -> usize {
    let mut contents = BTreeSet::new();
    tree.for_each_structure(&mut |node| {
        if node.url.is_none() {
            contents.insert(node.content.clone());
        }
    });
    if contents.is_empty() {
        return 0;
    }

    let requests: Vec<_> = contents
        .into_iter()
        .map(|content| {
            let request = batcher.request(&content);
            (content, request)
        })
        .collect();

    let mut outcomes = HashMap::with_capacity(requests.len());
    for (content, request) in requests {
        let outcome = request.await;
        if let Err(error) = &outcome {
            tracing::warn!(%error, "structure rendering failed");
        }
        outcomes.insert(content, outcome);
    }

    let mut hydrated = 0;
    tree.for_each_structure_mut(&mut |node| {
        if node.url.is_some() {
            return;
        }
        match outcomes.get(&node.content) {
            Some(Ok(url)) => {
                node.url = Some(url.clone());
                node.error = None;
                hydrated += 1;
            }
            Some(Err(error)) => node.error = Some(error.to_string()),
            None => {}
        }
    });
    hydrated
}
