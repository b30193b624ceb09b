//! Errors delivered to structure requests.

/// Outcome of a failed structure request.
///
/// `Clone` because one failure is fanned out to every caller waiting on the
/// same batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructureError {
    /// The whole batched call failed.
    #[error("structure service request failed: {0}")]
    Transport(String),
    /// The service answered with an error for this content.
    #[error("structure service could not render {content:?}: {message}")]
    Render { content: String, message: String },
    /// The service answered but left this content out.
    #[error("structure service returned no result for {0:?}")]
    MissingResult(String),
    /// The batcher went away before the batch completed.
    #[error("structure request was dropped before completion")]
    Cancelled,
}
