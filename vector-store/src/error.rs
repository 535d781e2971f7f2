//! Error types for vector storage.

use thiserror::Error;

/// Result type alias for vector store operations.
pub type Result<T> = std::result::Result<T, VectorStoreError>;

/// Errors that can occur while talking to a vector store.
#[derive(Error, Debug)]
pub enum VectorStoreError {
    /// The store cannot be used at all (missing URL or credential).
    #[error("vector store unavailable: {0}")]
    Unavailable(String),

    /// Server-side or rate-limit failure worth retrying.
    #[error("vector store temporarily unavailable: {0}")]
    Transient(String),

    /// Request rejected by the store.
    #[error("vector store API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// Response did not have the expected shape.
    #[error("malformed vector store response: {0}")]
    Malformed(String),

    /// The named collection does not exist.
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    /// Vector length does not match the collection.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// HTTP error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl VectorStoreError {
    /// Whether the failure is transient (network, timeout, 429, 5xx).
    pub fn is_transient(&self) -> bool {
        match self {
            VectorStoreError::Transient(_) => true,
            VectorStoreError::Http(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            _ => false,
        }
    }
}
