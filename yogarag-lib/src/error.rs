//! Error types for YogaRAG

use thiserror::Error;

/// Result type alias for YogaRAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in YogaRAG operations
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to load or run the embedding model
    #[error("embedding error: {0}")]
    Embedding(String),

    /// A vector did not have the expected number of dimensions
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A zero-norm vector cannot be compared by cosine similarity
    #[error("degenerate vector: norm is zero")]
    DegenerateVector,

    /// Failed to read from or write to the corpus store
    #[error("store error: {0}")]
    Store(String),

    /// Invalid input provided
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration could not be loaded or failed validation
    #[error("config error: {0}")]
    Config(String),

    /// The answer generator failed
    #[error("generation error: {0}")]
    Generation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
