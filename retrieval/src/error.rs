//! Error types for retrieval and configuration.

use docrag_embeddings::EmbeddingError;
use docrag_vector_store::VectorStoreError;
use thiserror::Error;

/// Result type alias for retrieval operations.
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Errors that can occur in the retrieval engine.
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// The query cannot be searched (empty or whitespace only).
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Query embedding failed.
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Vector search failed.
    #[error("vector store error: {0}")]
    Store(#[from] VectorStoreError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Problems with environment configuration, reported before any network call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("{0} must be set")]
    Missing(String),

    /// A variable holds a value that cannot be parsed.
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: String, value: String },
}
