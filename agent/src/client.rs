//! OpenAI-compatible chat-completions client.

use std::time::Duration;

use async_trait::async_trait;
use docrag_async_utils::RetryPolicy;
use docrag_retrieval::config::AgentSettings;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{AgentError, Result};
use crate::message::ChatMessage;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A model that continues a conversation.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier sent with each request.
    fn model(&self) -> &str;

    /// Next assistant message for `messages`, with `tools` on offer.
    async fn complete(&self, messages: &[ChatMessage], tools: &[Value]) -> Result<ChatMessage>;
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

/// Client for `POST {base_url}/chat/completions`.
#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
    retry: RetryPolicy,
}

impl ChatCompletionsClient {
    /// Create a client for the default endpoint and model.
    ///
    /// # Errors
    /// Returns [`AgentError::NotConfigured`] if the API key is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AgentError::NotConfigured);
        }
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: docrag_retrieval::config::DEFAULT_AGENT_BASE_URL.to_string(),
            api_key,
            model: docrag_retrieval::config::DEFAULT_AGENT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        })
    }

    /// Create a client from agent settings.
    pub fn from_settings(settings: &AgentSettings) -> Result<Self> {
        let api_key = settings.api_key.as_deref().ok_or(AgentError::NotConfigured)?;
        Ok(Self::new(api_key)?
            .with_base_url(&settings.base_url)
            .with_model(&settings.model))
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    async fn send(&self, body: &Value) -> Result<ChatMessage> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if status.as_u16() == 429 || status.is_server_error() {
            return Err(AgentError::Transient(format!("{status}: {text}")));
        }
        if !status.is_success() {
            return Err(AgentError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: CompletionResponse = serde_json::from_str(&text)
            .map_err(|err| AgentError::InvalidResponse(format!("{err}: {text}")))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| AgentError::InvalidResponse("no choices in response".to_string()))
    }
}

#[async_trait]
impl ChatModel for ChatCompletionsClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[ChatMessage], tools: &[Value]) -> Result<ChatMessage> {
        let mut body = json!({
            "model": self.model,
            "messages": messages,
        });
        if !tools.is_empty() {
            body["tools"] = Value::from(tools.to_vec());
        }
        debug!(
            "Sending {} messages to {} ({})",
            messages.len(),
            self.endpoint(),
            self.model
        );

        self.retry
            .run_if(|| self.send(&body), AgentError::is_transient)
            .await
    }
}
