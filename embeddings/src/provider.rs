//! Embedding providers.
//!
//! The retrieval engine and the ingestion pipeline only see the
//! [`EmbeddingProvider`] trait; [`CohereProvider`] is the hosted
//! implementation used in production.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{EmbeddingError, Result};
use crate::{DEFAULT_DIMENSION, DEFAULT_MODEL, Embedding};

/// Default Cohere API base URL.
pub const DEFAULT_COHERE_BASE_URL: &str = "https://api.cohere.ai";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Encoding profile hint passed to the embedding service.
///
/// Queries and stored documents are embedded by the same model, but the
/// service biases the encoding depending on which side of the search a text
/// is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingRole {
    /// A search query.
    Query,
    /// A document chunk to be stored.
    Document,
}

impl EmbeddingRole {
    /// Cohere `input_type` value for this role.
    pub fn input_type(self) -> &'static str {
        match self {
            EmbeddingRole::Query => "search_query",
            EmbeddingRole::Document => "search_document",
        }
    }
}

/// Trait for embedding providers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Get the name of this provider.
    fn name(&self) -> &str;

    /// Model used for every request.
    fn model(&self) -> &str;

    /// Dimension of the vectors the model produces.
    fn dimension(&self) -> usize;

    /// Check if the provider is available (API key set, etc.).
    fn is_available(&self) -> bool;

    /// Embed `texts` in one request. Output order matches input order.
    async fn embed(&self, texts: &[String], role: EmbeddingRole) -> Result<Vec<Embedding>>;

    /// Embed a single search query.
    async fn embed_query(&self, query: &str) -> Result<Embedding> {
        if query.trim().is_empty() {
            return Err(EmbeddingError::EmptyInput("query cannot be empty".to_string()));
        }

        self.embed(&[query.to_string()], EmbeddingRole::Query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::InvalidResponse("no embedding for query".to_string()))
    }
}

/// Cohere embedding provider.
pub struct CohereProvider {
    /// API key.
    api_key: Option<String>,

    /// API base URL.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,

    /// Model name.
    model: String,

    /// Per-request timeout.
    timeout: Duration,
}

impl CohereProvider {
    /// Create a new Cohere provider with no credential.
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_COHERE_BASE_URL.to_string(),
            client: reqwest::Client::new(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for CohereProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for CohereProvider {
    fn name(&self) -> &str {
        "cohere"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        match self.model.as_str() {
            "embed-english-light-v3.0" | "embed-multilingual-light-v3.0" => 384,
            "embed-english-v2.0" => 4096,
            _ => DEFAULT_DIMENSION,
        }
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn embed(&self, texts: &[String], role: EmbeddingRole) -> Result<Vec<Embedding>> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(EmbeddingError::ProviderNotConfigured)?;

        if texts.is_empty() {
            return Err(EmbeddingError::EmptyInput("no texts to embed".to_string()));
        }
        if let Some(index) = texts.iter().position(|t| t.trim().is_empty()) {
            return Err(EmbeddingError::EmptyInput(format!(
                "text at position {index} is empty"
            )));
        }

        debug!(
            "Embedding {} texts with model {} as {}",
            texts.len(),
            self.model,
            role.input_type()
        );

        let body = CohereEmbedRequest {
            texts,
            model: &self.model,
            input_type: role.input_type(),
        };

        let response = self
            .client
            .post(format!("{}/v1/embed", self.base_url))
            .bearer_auth(api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(EmbeddingError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            if status.is_server_error() {
                return Err(EmbeddingError::ServiceUnavailable(format!(
                    "{status}: {error_text}"
                )));
            }
            return Err(EmbeddingError::ApiRequest(format!(
                "API error ({status}): {error_text}"
            )));
        }

        let payload = response.text().await?;
        let result: CohereEmbedResponse = serde_json::from_str(&payload)?;

        if result.embeddings.len() != texts.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                result.embeddings.len()
            )));
        }

        info!("Generated {} embeddings", result.embeddings.len());

        Ok(result.embeddings)
    }
}

/// Cohere `/v1/embed` request body.
#[derive(Debug, Serialize)]
struct CohereEmbedRequest<'a> {
    texts: &'a [String],
    model: &'a str,
    input_type: &'static str,
}

/// Cohere `/v1/embed` response body (float embeddings).
#[derive(Debug, Deserialize)]
struct CohereEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}
