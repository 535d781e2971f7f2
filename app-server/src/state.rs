use std::sync::Arc;

use anyhow::Context;
use docrag_agent::{
    ChatCompletionsClient, ChatService, DocumentationAgent, RetrieveDocumentationTool,
};
use docrag_retrieval::{RetrievalEngine, Settings};
use tracing::info;

/// Shared state for request handlers.
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
}

impl AppState {
    pub fn new(chat: ChatService) -> Self {
        Self {
            chat: Arc::new(chat),
        }
    }

    /// Build the engine, chat client and agent once for the process.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let engine = Arc::new(
            RetrievalEngine::from_settings(settings)
                .context("failed to create retrieval engine")?,
        );
        let client = ChatCompletionsClient::from_settings(&settings.agent)
            .context("OPENROUTER_API_KEY must be set to serve chat requests")?;
        info!(
            "Using model {} for collection {}",
            settings.agent.model, settings.retrieval.collection
        );

        let agent = DocumentationAgent::new(Arc::new(client))
            .with_tool(Arc::new(RetrieveDocumentationTool::new(engine.clone())));
        Ok(Self::new(ChatService::new(engine, agent)))
    }
}
