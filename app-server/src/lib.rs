//! HTTP service for the documentation assistant.
//!
//! Serves `POST /chat` and `GET /health` over a [`ChatService`] built once
//! at startup.
//!
//! [`ChatService`]: docrag_agent::ChatService

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{ChatRequest, MAX_QUERY_CHARS, router, validate_query};
pub use state::AppState;
