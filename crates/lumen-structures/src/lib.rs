//! Batched rendering of chemical structures.
//!
//! Render trees contain [`StructureNode`](lumen_render::StructureNode)s for
//! notation the local pipeline cannot draw. Their images come from a remote
//! service, and [`StructureBatcher`] coalesces every request made within a
//! short window into a single outbound call:
//!
//! - identical content requested several times in one window is sent once
//! - every caller receives the result for its content
//! - a failed call rejects all callers of that window and caches nothing
//! - successful results are cached, so later requests skip the queue
//!
//! [`hydrate`] fills in all structure nodes of a tree through the batcher.

mod batcher;
mod error;
mod hydrate;
mod transport;

pub use batcher::{DEFAULT_WINDOW, StructureBatcher, StructureBatcherBuilder};
pub use error::StructureError;
pub use hydrate::hydrate;
pub use transport::{BatchRequest, BatchResponse, HttpTransport, StructureResult, StructureTransport};
