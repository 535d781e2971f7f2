//! The HTTP contract, served on an ephemeral port.

use std::sync::Arc;

use async_trait::async_trait;
use docrag_agent::{AgentError, ChatMessage, ChatModel, ChatService, DocumentationAgent};
use docrag_app_server::{AppState, router};
use docrag_embeddings::{Embedding, EmbeddingProvider, EmbeddingRole};
use docrag_retrieval::{RetrievalConfig, RetrievalEngine};
use docrag_vector_store::{
    CollectionSpec, InMemoryStore, PointId, PointPayload, StoredPoint, VectorStore,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio::net::TcpListener;

struct UnitEmbedder;

#[async_trait]
impl EmbeddingProvider for UnitEmbedder {
    fn name(&self) -> &str {
        "unit"
    }

    fn model(&self) -> &str {
        "unit-v1"
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
        Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
    }
}

/// Echoes the question back as the answer; fails on "explode".
struct EchoModel;

#[async_trait]
impl ChatModel for EchoModel {
    fn model(&self) -> &str {
        "echo"
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        _tools: &[Value],
    ) -> docrag_agent::Result<ChatMessage> {
        let question = messages
            .last()
            .and_then(|m| m.content.clone())
            .unwrap_or_default();
        if question == "explode" {
            return Err(AgentError::Transient("503: upstream down".to_string()));
        }
        Ok(ChatMessage::assistant(format!("You asked: {question}")))
    }
}

async fn spawn_server() -> String {
    let store = InMemoryStore::new();
    store
        .ensure_collection("docs", &CollectionSpec::cosine(2))
        .await
        .unwrap();
    let points: Vec<StoredPoint> = (1..=4)
        .map(|i| StoredPoint {
            id: PointId::Num(i),
            vector: vec![1.0, 0.1 * i as f32],
            payload: PointPayload {
                text: format!("Deployment guide part {i}."),
                source_url: format!("https://docusaurus.io/docs/deployment#{i}"),
                embedding_model: "unit-v1".to_string(),
                ..PointPayload::default()
            },
        })
        .collect();
    store.upsert("docs", &points).await.unwrap();

    let engine = Arc::new(RetrievalEngine::new(
        Arc::new(UnitEmbedder),
        Arc::new(store),
        RetrievalConfig::new("docs"),
    ));
    let state = AppState::new(ChatService::new(
        engine,
        DocumentationAgent::new(Arc::new(EchoModel)),
    ));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_health() {
    let base = spawn_server().await;
    let response = reqwest::get(format!("{base}/health")).await.unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({"status": "healthy", "service": "RAG Pipeline API"})
    );
}

#[tokio::test]
async fn test_chat_returns_answer_and_sources() {
    let base = spawn_server().await;
    let response = reqwest::Client::new()
        .post(format!("{base}/chat"))
        .json(&json!({"query": "How do I deploy?"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["query"], "How do I deploy?");
    assert_eq!(body["response"], "You asked: How do I deploy?");
    assert_eq!(body["status"], "success");

    let sources = body["sources"].as_array().unwrap();
    assert_eq!(sources.len(), 3);
    assert_eq!(sources[0]["text"], "Deployment guide part 1.");
    assert_eq!(sources[0]["id"], "1");
}

#[tokio::test]
async fn test_chat_echoes_query_as_sent() {
    let base = spawn_server().await;
    let body: Value = reqwest::Client::new()
        .post(format!("{base}/chat"))
        .json(&json!({"query": "  How do I deploy?\n"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "success");
    assert_eq!(body["query"], "  How do I deploy?\n");
    assert_eq!(body["response"], "You asked:   How do I deploy?\n");
}

#[tokio::test]
async fn test_chat_honours_top_k() {
    let base = spawn_server().await;
    let body: Value = reqwest::Client::new()
        .post(format!("{base}/chat"))
        .json(&json!({"query": "deploy", "top_k": 1}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["sources"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_agent_failure_is_reported_in_body() {
    let base = spawn_server().await;
    let response = reqwest::Client::new()
        .post(format!("{base}/chat"))
        .json(&json!({"query": "explode"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "error");
    assert_eq!(body["sources"], json!([]));
    assert!(
        body["response"]
            .as_str()
            .unwrap()
            .starts_with("Error processing query: ")
    );
}

#[tokio::test]
async fn test_rejects_blank_and_oversized_queries() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    for query in ["", "   \n\t"] {
        let response = client
            .post(format!("{base}/chat"))
            .json(&json!({ "query": query }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Query cannot be empty");
    }

    let response = client
        .post(format!("{base}/chat"))
        .json(&json!({ "query": "q".repeat(1001) }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let response = client
        .post(format!("{base}/chat"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_cors_allows_docs_dev_origin() {
    let base = spawn_server().await;
    let response = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, format!("{base}/chat"))
        .header("origin", "http://localhost:3000")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .send()
        .await
        .unwrap();

    assert!(response.status().is_success());
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "http://localhost:3000"
    );

    let response = reqwest::Client::new()
        .get(format!("{base}/health"))
        .header("origin", "http://evil.example")
        .send()
        .await
        .unwrap();
    assert!(response.headers().get("access-control-allow-origin").is_none());
}
