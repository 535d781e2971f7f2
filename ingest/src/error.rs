//! Error types for ingestion.

use docrag_embeddings::EmbeddingError;
use docrag_retrieval::ConfigError;
use docrag_vector_store::VectorStoreError;
use thiserror::Error;

/// Result type alias for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

/// Errors that can occur while ingesting documentation.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Chunk size and overlap are inconsistent.
    #[error("chunk overlap {overlap} is larger than chunk size {size}")]
    InvalidChunking { size: usize, overlap: usize },

    /// A page answered with an error status.
    #[error("{url} returned {status}")]
    PageStatus { url: String, status: u16 },

    /// A sitemap could not be read.
    #[error("sitemap error: {0}")]
    Sitemap(String),

    /// A CSS selector failed to parse.
    #[error("invalid selector {selector}: {message}")]
    Selector { selector: String, message: String },

    /// Embedding failed.
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Storing vectors failed.
    #[error("vector store error: {0}")]
    Store(#[from] VectorStoreError),

    /// The collection is empty after storing.
    #[error("verification failed: {0}")]
    VerificationFailed(String),

    /// HTTP error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl IngestError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            IngestError::PageStatus { status, .. } => *status == 429 || *status >= 500,
            IngestError::Http(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            IngestError::Embedding(err) => err.is_transient(),
            IngestError::Store(err) => err.is_transient(),
            _ => false,
        }
    }
}
