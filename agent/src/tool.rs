//! Tools the agent can call.

use std::sync::Arc;

use async_trait::async_trait;
use docrag_retrieval::RetrievalEngine;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{error, info};

/// Results requested when the model does not say.
pub const DEFAULT_TOOL_TOP_K: usize = 3;

/// A function the model may call.
///
/// Failures are reported in the returned value so the model can react to
/// them; `invoke` itself never fails.
#[async_trait]
pub trait AgentTool: Send + Sync {
    /// Function name the model calls.
    fn name(&self) -> &str;

    /// OpenAI tool definition (`{"type": "function", "function": {...}}`).
    fn definition(&self) -> Value;

    /// Run the tool with the model's JSON-encoded arguments.
    async fn invoke(&self, arguments: &str) -> Value;
}

#[derive(Debug, Deserialize)]
struct RetrieveArgs {
    query: String,
    #[serde(default = "default_top_k")]
    top_k: usize,
}

fn default_top_k() -> usize {
    DEFAULT_TOOL_TOP_K
}

/// Searches the documentation collection.
pub struct RetrieveDocumentationTool {
    engine: Arc<RetrievalEngine>,
}

impl RetrieveDocumentationTool {
    pub const NAME: &'static str = "retrieve_documentation";

    pub fn new(engine: Arc<RetrievalEngine>) -> Self {
        Self { engine }
    }

    /// Search with the engine's configured threshold.
    pub async fn search(&self, query: &str, top_k: usize) -> Value {
        let threshold = self.engine.config().similarity_threshold;
        match self.engine.retrieve(query, top_k, threshold).await {
            Ok(results) => {
                info!("Documentation tool returned {} results", results.len());
                json!({
                    "status": "success",
                    "results": results,
                    "query": query,
                })
            }
            Err(err) => {
                error!("Error calling RAG function: {err}");
                tool_error(&err.to_string(), query)
            }
        }
    }
}

#[async_trait]
impl AgentTool for RetrieveDocumentationTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn definition(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": Self::NAME,
                "description": "Search the documentation database for relevant information.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "The search query to find relevant documentation"
                        },
                        "top_k": {
                            "type": "integer",
                            "description": "Number of results to return (default 3)",
                            "default": DEFAULT_TOOL_TOP_K
                        }
                    },
                    "required": ["query"]
                }
            }
        })
    }

    async fn invoke(&self, arguments: &str) -> Value {
        match serde_json::from_str::<RetrieveArgs>(arguments) {
            Ok(args) => self.search(&args.query, args.top_k).await,
            Err(err) => {
                let query = serde_json::from_str::<Value>(arguments)
                    .ok()
                    .and_then(|v| v.get("query").and_then(Value::as_str).map(str::to_string))
                    .unwrap_or_default();
                tool_error(&format!("invalid arguments: {err}"), &query)
            }
        }
    }
}

fn tool_error(message: &str, query: &str) -> Value {
    json!({
        "status": "error",
        "error": message,
        "query": query,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docrag_embeddings::{Embedding, EmbeddingError, EmbeddingProvider, EmbeddingRole};
    use docrag_retrieval::RetrievalConfig;
    use docrag_vector_store::{
        CollectionSpec, InMemoryStore, PointId, PointPayload, StoredPoint, VectorStore,
    };
    use pretty_assertions::assert_eq;

    /// Maps "sidebar" queries onto the sidebar page; rejects "fail".
    struct KeywordEmbedder;

    #[async_trait]
    impl EmbeddingProvider for KeywordEmbedder {
        fn name(&self) -> &str {
            "keyword"
        }

        fn model(&self) -> &str {
            "keyword-v1"
        }

        fn dimension(&self) -> usize {
            2
        }

        fn is_available(&self) -> bool {
            true
        }

        async fn embed(
            &self,
            texts: &[String],
            _role: EmbeddingRole,
        ) -> docrag_embeddings::Result<Vec<Embedding>> {
            texts
                .iter()
                .map(|text| match text.as_str() {
                    "fail" => Err(EmbeddingError::ServiceUnavailable("503".to_string())),
                    t if t.contains("sidebar") => Ok(vec![0.0, 1.0]),
                    _ => Ok(vec![1.0, 0.0]),
                })
                .collect()
        }
    }

    async fn engine() -> Arc<RetrievalEngine> {
        let store = InMemoryStore::new();
        store
            .ensure_collection("docs", &CollectionSpec::cosine(2))
            .await
            .unwrap();
        let points: Vec<StoredPoint> = (0..5)
            .map(|i| StoredPoint {
                id: PointId::Num(i),
                vector: vec![0.1 * i as f32, 1.0],
                payload: PointPayload {
                    text: format!("Sidebar section {i}"),
                    source_url: "https://docusaurus.io/docs/sidebar".to_string(),
                    ..PointPayload::default()
                },
            })
            .collect();
        store.upsert("docs", &points).await.unwrap();

        Arc::new(RetrievalEngine::new(
            Arc::new(KeywordEmbedder),
            Arc::new(store),
            RetrievalConfig::new("docs").with_similarity_threshold(0.3),
        ))
    }

    #[tokio::test]
    async fn test_definition_shape() {
        let definition = RetrieveDocumentationTool::new(engine().await).definition();
        assert_eq!(definition["function"]["name"], "retrieve_documentation");
        assert_eq!(
            definition["function"]["parameters"]["required"],
            json!(["query"])
        );
        assert_eq!(
            definition["function"]["parameters"]["properties"]["top_k"]["default"],
            3
        );
    }

    #[tokio::test]
    async fn test_invoke_defaults_to_three_results() {
        let tool = RetrieveDocumentationTool::new(engine().await);
        let output = tool.invoke(r#"{"query": "sidebar setup"}"#).await;

        assert_eq!(output["status"], "success");
        assert_eq!(output["query"], "sidebar setup");
        let results = output["results"].as_array().unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0]["text"], "Sidebar section 0");
    }

    #[tokio::test]
    async fn test_invoke_honours_top_k() {
        let tool = RetrieveDocumentationTool::new(engine().await);
        let output = tool.invoke(r#"{"query": "sidebar", "top_k": 5}"#).await;
        assert_eq!(output["results"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_failures_become_error_values() {
        let tool = RetrieveDocumentationTool::new(engine().await);

        let output = tool.invoke(r#"{"query": "fail"}"#).await;
        assert_eq!(output["status"], "error");
        assert_eq!(output["query"], "fail");
        assert!(output["error"].as_str().unwrap().contains("unavailable"));

        let output = tool.invoke(r#"{"top_k": 2}"#).await;
        assert_eq!(output["status"], "error");
        assert_eq!(output["query"], "");

        let output = tool.invoke(r#"{"query": "   "}"#).await;
        assert_eq!(output["status"], "error");
    }
}
