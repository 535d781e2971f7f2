//! Error types for the agent.

use thiserror::Error;

/// Result type alias for agent operations.
pub type Result<T> = std::result::Result<T, AgentError>;

/// Errors that can occur while talking to the chat model.
#[derive(Error, Debug)]
pub enum AgentError {
    /// No API key for the chat-completions endpoint.
    #[error("agent not configured: missing API key")]
    NotConfigured,

    /// The endpoint rejected the request.
    #[error("chat completion failed with status {status}: {body}")]
    Api { status: u16, body: String },

    /// Rate limiting or a server-side failure worth retrying.
    #[error("chat service unavailable: {0}")]
    Transient(String),

    /// The response did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The model kept requesting tools without answering.
    #[error("no answer after {0} turns")]
    TurnLimit(usize),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl AgentError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            AgentError::Transient(_) => true,
            AgentError::Http(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            _ => false,
        }
    }
}
