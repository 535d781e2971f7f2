use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use docrag_agent::{ChatOutcome, DEFAULT_TOOL_TOP_K};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

/// Longest accepted query, in characters.
pub const MAX_QUERY_CHARS: usize = 1000;

pub const SERVICE_NAME: &str = "RAG Pipeline API";

/// Origins of the documentation site in development.
pub const ALLOWED_ORIGINS: [&str; 4] = [
    "http://localhost:3000",
    "http://127.0.0.1:3000",
    "http://localhost:3001",
    "http://127.0.0.1:3001",
];

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    DEFAULT_TOOL_TOP_K
}

/// Build the application router.
///
/// - `POST /chat`: answer a question with sources
/// - `GET /health`: liveness
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/health", get(health))
        .with_state(state)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
    }))
}

async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatOutcome>, ApiError> {
    let length = validate_query(&request.query)?.chars().count();
    info!("Received chat request ({length} characters)");

    // The query is answered and echoed as sent; trimming only gates validation.
    // A panic inside the agent surfaces as a 500 instead of a dropped connection.
    let ChatRequest { query, top_k } = request;
    let chat = state.chat.clone();
    let outcome = tokio::spawn(async move { chat.answer(&query, top_k).await })
        .await
        .map_err(ApiError::internal)?;
    Ok(Json(outcome))
}

/// Trimmed query, or the reason it is rejected.
pub fn validate_query(query: &str) -> Result<&str, ApiError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest("Query cannot be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_QUERY_CHARS {
        return Err(ApiError::BadRequest(format!(
            "Query too long (max {MAX_QUERY_CHARS} characters)"
        )));
    }
    Ok(trimmed)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(ALLOWED_ORIGINS.map(HeaderValue::from_static))
        .allow_methods(Any)
        .allow_headers(Any)
}
