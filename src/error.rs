// seekcore/src/error.rs
//
// Error taxonomy shared by the index, store, corpus and retriever.

use thiserror::Error;

/// Failures reported by an embedding provider.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("provider timed out")]
    Timeout,

    #[error("malformed provider output: {0}")]
    Malformed(String),
}

/// Errors returned by retrieval operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RetrievalError {
    /// A vector's length disagrees with the index dimension.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Zero-norm (or non-finite) vector hit during normalization.
    /// `position` is the input row for build failures, `None` for queries.
    #[error("degenerate vector{}", at_position(.position))]
    DegenerateVector { position: Option<usize> },

    #[error("index not ready")]
    IndexNotReady,

    #[error("embedding unavailable: {0}")]
    EmbeddingUnavailable(#[source] ProviderError),

    /// Search referenced an id the document store does not hold.
    #[error("document {0} not found")]
    NotFound(u32),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("corpus error: {0}")]
    Corpus(String),
}

impl From<ProviderError> for RetrievalError {
    fn from(e: ProviderError) -> Self {
        Self::EmbeddingUnavailable(e)
    }
}

fn at_position(position: &Option<usize>) -> String {
    match position {
        Some(p) => format!(" at position {}", p),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, RetrievalError>;
