//! Question answering for the chat endpoint.

use std::sync::Arc;

use docrag_retrieval::{RetrievalEngine, SearchResult};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::agent::DocumentationAgent;

/// Whether a chat request produced an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatStatus {
    Success,
    Error,
}

/// Answer to one chat request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatOutcome {
    pub query: String,
    pub response: String,

    /// Chunks retrieved for the query, independent of what the agent used.
    pub sources: Vec<SearchResult>,

    pub status: ChatStatus,
}

/// Pairs source retrieval with the agent's answer.
pub struct ChatService {
    engine: Arc<RetrievalEngine>,
    agent: DocumentationAgent,
}

impl ChatService {
    pub fn new(engine: Arc<RetrievalEngine>, agent: DocumentationAgent) -> Self {
        Self { engine, agent }
    }

    /// Answer `query`, listing up to `top_k` sources.
    ///
    /// Never fails: a retrieval failure leaves `sources` empty and an agent
    /// failure is reported through `status` and `response`.
    pub async fn answer(&self, query: &str, top_k: usize) -> ChatOutcome {
        info!("Received chat request: {query}");
        let (sources, answer) = tokio::join!(self.sources(query, top_k), self.agent.run(query));

        match answer {
            Ok(response) => {
                info!("Agent response generated successfully");
                ChatOutcome {
                    query: query.to_string(),
                    response,
                    sources,
                    status: ChatStatus::Success,
                }
            }
            Err(err) => {
                error!("Error processing chat request: {err}");
                ChatOutcome {
                    query: query.to_string(),
                    response: format!("Error processing query: {err}"),
                    sources: Vec::new(),
                    status: ChatStatus::Error,
                }
            }
        }
    }

    async fn sources(&self, query: &str, top_k: usize) -> Vec<SearchResult> {
        let threshold = self.engine.config().similarity_threshold;
        match self.engine.retrieve(query, top_k, threshold).await {
            Ok(results) => results,
            Err(err) => {
                warn!("Could not retrieve sources: {err}");
                Vec::new()
            }
        }
    }
}
