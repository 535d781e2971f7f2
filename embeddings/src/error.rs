//! Error types for the embeddings system.

use thiserror::Error;

/// Result type alias for embedding operations.
pub type Result<T> = std::result::Result<T, EmbeddingError>;

/// Errors that can occur in the embeddings system.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// No credential available for the provider.
    #[error("embedding provider not configured: missing API key")]
    ProviderNotConfigured,

    /// Empty text or empty batch where a result is required.
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// API request was rejected.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// Server-side failure worth retrying.
    #[error("embedding service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Invalid response from provider.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Dimension mismatch.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl EmbeddingError {
    /// Whether the failure is transient (network, timeout, 429, 5xx).
    pub fn is_transient(&self) -> bool {
        match self {
            EmbeddingError::RateLimited { .. } | EmbeddingError::ServiceUnavailable(_) => true,
            EmbeddingError::Http(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            _ => false,
        }
    }
}
