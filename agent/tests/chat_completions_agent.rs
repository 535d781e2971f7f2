//! Agent loop against a mocked chat-completions endpoint, with retrieval
//! served from an in-memory collection.

use std::sync::Arc;

use async_trait::async_trait;
use docrag_agent::{
    ChatCompletionsClient, ChatService, ChatStatus, DocumentationAgent, RetrieveDocumentationTool,
};
use docrag_async_utils::RetryPolicy;
use docrag_embeddings::{Embedding, EmbeddingProvider, EmbeddingRole};
use docrag_retrieval::{RetrievalConfig, RetrievalEngine};
use docrag_vector_store::{
    CollectionSpec, InMemoryStore, PointId, PointPayload, StoredPoint, VectorStore,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct StaticEmbedder;

#[async_trait]
impl EmbeddingProvider for StaticEmbedder {
    fn name(&self) -> &str {
        "static"
    }

    fn model(&self) -> &str {
        "static-v1"
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
        Ok(texts.iter().map(|_| vec![0.0, 1.0]).collect())
    }
}

async fn engine() -> Arc<RetrievalEngine> {
    let store = InMemoryStore::new();
    store
        .ensure_collection("docs", &CollectionSpec::cosine(2))
        .await
        .unwrap();
    store
        .upsert(
            "docs",
            &[StoredPoint {
                id: PointId::Uuid("0b7d2a56-0f5e-4f4c-9c4e-6f1e0b1c2d3e".to_string()),
                vector: vec![0.1, 1.0],
                payload: PointPayload {
                    text: "Sidebars are defined in sidebars.js.".to_string(),
                    source_url: "https://docusaurus.io/docs/sidebar".to_string(),
                    embedding_model: "static-v1".to_string(),
                    ..PointPayload::default()
                },
            }],
        )
        .await
        .unwrap();

    Arc::new(RetrievalEngine::new(
        Arc::new(StaticEmbedder),
        Arc::new(store),
        RetrievalConfig::new("docs"),
    ))
}

fn tool_call_reply() -> Value {
    json!({
        "choices": [{
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_sidebar",
                    "type": "function",
                    "function": {
                        "name": "retrieve_documentation",
                        "arguments": "{\"query\": \"sidebar configuration\", \"top_k\": 2}"
                    }
                }]
            }
        }]
    })
}

fn final_reply() -> Value {
    json!({
        "choices": [{
            "message": {
                "role": "assistant",
                "content": "According to the documentation, sidebars live in sidebars.js."
            }
        }]
    })
}

async fn chat_server() -> MockServer {
    let server = MockServer::start().await;
    // Registered first so it wins once the conversation carries a tool result.
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("tool_call_id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(final_reply()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tool_call_reply()))
        .mount(&server)
        .await;
    server
}

fn service(server: &MockServer, engine: Arc<RetrievalEngine>) -> ChatService {
    let client = ChatCompletionsClient::new("test-key")
        .unwrap()
        .with_base_url(server.uri())
        .with_retry(RetryPolicy::none());
    let agent = DocumentationAgent::new(Arc::new(client))
        .with_tool(Arc::new(RetrieveDocumentationTool::new(engine.clone())));
    ChatService::new(engine, agent)
}

#[tokio::test]
async fn test_tool_round_trip_produces_answer_and_sources() {
    let server = chat_server().await;
    let outcome = service(&server, engine().await)
        .answer("How do I configure the sidebar?", 3)
        .await;

    assert_eq!(outcome.status, ChatStatus::Success);
    assert_eq!(
        outcome.response,
        "According to the documentation, sidebars live in sidebars.js."
    );
    assert_eq!(outcome.sources.len(), 1);
    assert_eq!(outcome.sources[0].id, "0b7d2a56-0f5e-4f4c-9c4e-6f1e0b1c2d3e");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);

    let first: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(first["model"], "mistralai/devstral-2512:free");
    assert_eq!(first["tools"][0]["function"]["name"], "retrieve_documentation");
    assert_eq!(first["messages"][1]["content"], "How do I configure the sidebar?");

    let second: Value = serde_json::from_slice(&requests[1].body).unwrap();
    let tool_message = &second["messages"][3];
    assert_eq!(tool_message["role"], "tool");
    assert_eq!(tool_message["tool_call_id"], "call_sidebar");
    let output: Value = serde_json::from_str(tool_message["content"].as_str().unwrap()).unwrap();
    assert_eq!(output["status"], "success");
    assert_eq!(output["query"], "sidebar configuration");
    assert_eq!(
        output["results"][0]["text"],
        "Sidebars are defined in sidebars.js."
    );
}

#[tokio::test]
async fn test_endpoint_failure_is_reported_not_raised() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(402).set_body_string("insufficient credits"))
        .mount(&server)
        .await;

    let outcome = service(&server, engine().await)
        .answer("How do I configure the sidebar?", 3)
        .await;

    assert_eq!(outcome.status, ChatStatus::Error);
    assert!(outcome.response.contains("insufficient credits"));
    assert!(outcome.sources.is_empty());
}
