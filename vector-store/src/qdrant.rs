//! Qdrant REST client.

use std::time::Duration;

use async_trait::async_trait;
use docrag_async_utils::RetryPolicy;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::DEFAULT_UPSERT_BATCH_SIZE;
use crate::error::{Result, VectorStoreError};
use crate::store::VectorStore;
use crate::types::{
    CollectionSpec, CollectionStatus, PointId, PointPayload, ScoredPoint, StoredPoint,
};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// [`VectorStore`] backed by a Qdrant cluster over its REST API.
pub struct QdrantStore {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
    timeout: Duration,
    upsert_batch_size: usize,
    retry: RetryPolicy,
}

impl QdrantStore {
    /// Create a client for the cluster at `url`.
    ///
    /// Fails with [`VectorStoreError::Unavailable`] when the URL or key is
    /// empty, before any request is made.
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let url = url.into();
        let api_key = api_key.into();

        if url.trim().is_empty() {
            return Err(VectorStoreError::Unavailable("missing Qdrant URL".to_string()));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(VectorStoreError::Unavailable(format!(
                "Qdrant URL must be http(s): {url}"
            )));
        }
        if api_key.trim().is_empty() {
            return Err(VectorStoreError::Unavailable(
                "missing Qdrant API key".to_string(),
            ));
        }

        Ok(Self {
            base_url: url.trim_end_matches('/').to_string(),
            api_key: api_key.trim().to_string(),
            client: reqwest::Client::new(),
            timeout: DEFAULT_TIMEOUT,
            upsert_batch_size: DEFAULT_UPSERT_BATCH_SIZE,
            retry: RetryPolicy::default(),
        })
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the number of points per upsert request.
    pub fn with_upsert_batch_size(mut self, size: usize) -> Self {
        self.upsert_batch_size = size.max(1);
        self
    }

    /// Set the retry policy applied to each upsert batch.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn collection_url(&self, collection: &str, suffix: &str) -> String {
        format!("{}/collections/{collection}{suffix}", self.base_url)
    }

    /// Send `request` and unwrap Qdrant's `{"result": ...}` envelope.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, collection: &str) -> Result<T> {
        let response = request
            .header("api-key", &self.api_key)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status == StatusCode::NOT_FOUND {
                return Err(VectorStoreError::CollectionNotFound(collection.to_string()));
            }
            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                return Err(VectorStoreError::Transient(format!("{status}: {body}")));
            }
            return Err(VectorStoreError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let envelope: QdrantResponse<T> = serde_json::from_str(&body)
            .map_err(|err| VectorStoreError::Malformed(format!("{err}: {body}")))?;
        Ok(envelope.result)
    }

    async fn upsert_batch(&self, collection: &str, batch: &[StoredPoint]) -> Result<()> {
        let request = self
            .client
            .put(self.collection_url(collection, "/points"))
            .query(&[("wait", "true")])
            .json(&UpsertRequest { points: batch });
        let _: IgnoredAny = self.send(request, collection).await?;
        Ok(())
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    fn name(&self) -> &str {
        "qdrant"
    }

    async fn collection_status(&self, collection: &str) -> Result<CollectionStatus> {
        let request = self.client.get(self.collection_url(collection, "/exists"));
        let result: ExistsResult = self.send(request, collection).await?;
        Ok(if result.exists {
            CollectionStatus::Exists
        } else {
            CollectionStatus::Absent
        })
    }

    async fn create_collection(&self, collection: &str, spec: &CollectionSpec) -> Result<()> {
        let body = json!({
            "vectors": {
                "size": spec.dimension,
                "distance": spec.distance,
            }
        });
        let request = self.client.put(self.collection_url(collection, "")).json(&body);
        let created: bool = self.send(request, collection).await?;
        if !created {
            return Err(VectorStoreError::Malformed(format!(
                "collection {collection} was not created"
            )));
        }
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: &[StoredPoint]) -> Result<()> {
        let total_batches = points.len().div_ceil(self.upsert_batch_size);

        for (index, batch) in points.chunks(self.upsert_batch_size).enumerate() {
            self.retry
                .run_if(
                    || self.upsert_batch(collection, batch),
                    VectorStoreError::is_transient,
                )
                .await?;
            info!(
                "Stored batch {}/{total_batches} ({} points)",
                index + 1,
                batch.len()
            );
        }

        info!("Stored {} points in collection {collection}", points.len());
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredPoint>> {
        let body = json!({
            "vector": vector,
            "limit": top_k,
            "with_payload": true,
        });
        let request = self
            .client
            .post(self.collection_url(collection, "/points/search"))
            .json(&body);
        let hits: Vec<QdrantScoredPoint> = self.send(request, collection).await?;
        debug!("Qdrant returned {} hits from {collection}", hits.len());

        Ok(hits
            .into_iter()
            .map(|hit| ScoredPoint {
                id: hit.id,
                score: hit.score,
                payload: hit.payload.unwrap_or_default(),
            })
            .collect())
    }

    async fn count(&self, collection: &str) -> Result<u64> {
        let request = self
            .client
            .post(self.collection_url(collection, "/points/count"))
            .json(&json!({ "exact": true }));
        let result: CountResult = self.send(request, collection).await?;
        Ok(result.count)
    }
}

#[derive(Debug, Deserialize)]
struct QdrantResponse<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct ExistsResult {
    exists: bool,
}

#[derive(Debug, Deserialize)]
struct CountResult {
    count: u64,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    points: &'a [StoredPoint],
}

#[derive(Debug, Deserialize)]
struct QdrantScoredPoint {
    id: PointId,
    score: f32,
    #[serde(default)]
    payload: Option<PointPayload>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EnsureOutcome;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store_for(server: &MockServer) -> QdrantStore {
        QdrantStore::new(server.uri(), "qdrant-key")
            .unwrap()
            .with_retry(RetryPolicy::default().with_base_delay(Duration::ZERO))
    }

    fn ok(result: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "result": result,
            "status": "ok",
            "time": 0.001
        }))
    }

    fn points(n: usize) -> Vec<StoredPoint> {
        (0..n)
            .map(|i| StoredPoint {
                id: PointId::Num(i as u64),
                vector: vec![i as f32, 1.0],
                payload: PointPayload {
                    text: format!("chunk {i}"),
                    source_url: "https://docusaurus.io/docs".to_string(),
                    ..PointPayload::default()
                },
            })
            .collect()
    }

    #[test]
    fn test_missing_configuration_is_unavailable() {
        assert!(matches!(
            QdrantStore::new("", "key"),
            Err(VectorStoreError::Unavailable(_))
        ));
        assert!(matches!(
            QdrantStore::new("https://qdrant.example", " "),
            Err(VectorStoreError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_ensure_collection_creates_when_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/collections/docs/exists"))
            .and(header("api-key", "qdrant-key"))
            .respond_with(ok(json!({"exists": false})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/collections/docs"))
            .and(body_json(json!({"vectors": {"size": 1024, "distance": "Cosine"}})))
            .respond_with(ok(json!(true)))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = store_for(&server)
            .ensure_collection("docs", &CollectionSpec::cosine(1024))
            .await
            .unwrap();
        assert_eq!(outcome, EnsureOutcome::Created);
    }

    #[tokio::test]
    async fn test_ensure_collection_skips_existing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/collections/docs/exists"))
            .respond_with(ok(json!({"exists": true})))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/collections/docs"))
            .respond_with(ok(json!(true)))
            .expect(0)
            .mount(&server)
            .await;

        let outcome = store_for(&server)
            .ensure_collection("docs", &CollectionSpec::cosine(1024))
            .await
            .unwrap();
        assert_eq!(outcome, EnsureOutcome::AlreadyExists);
    }

    #[tokio::test]
    async fn test_upsert_batches_of_fifty() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/collections/docs/points"))
            .and(query_param("wait", "true"))
            .respond_with(ok(json!({"operation_id": 7, "status": "completed"})))
            .expect(3)
            .mount(&server)
            .await;

        store_for(&server).upsert("docs", &points(120)).await.unwrap();

        let requests = server.received_requests().await.unwrap_or_default();
        let sizes: Vec<usize> = requests
            .iter()
            .map(|r| {
                let body: serde_json::Value = serde_json::from_slice(&r.body).unwrap();
                body["points"].as_array().map_or(0, Vec::len)
            })
            .collect();
        assert_eq!(sizes, vec![50, 50, 20]);

        let first: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(
            first["points"][1],
            json!({
                "id": 1,
                "vector": [1.0, 1.0],
                "payload": {
                    "text": "chunk 1",
                    "source_url": "https://docusaurus.io/docs",
                    "metadata": {},
                    "embedding_model": "unknown"
                }
            })
        );
    }

    #[tokio::test]
    async fn test_upsert_retries_transient_failure() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .respond_with(ok(json!({"operation_id": 8, "status": "completed"})))
            .mount(&server)
            .await;

        store_for(&server).upsert("docs", &points(3)).await.unwrap();
        assert_eq!(server.received_requests().await.unwrap_or_default().len(), 2);
    }

    #[tokio::test]
    async fn test_upsert_does_not_retry_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(400).set_body_string("wrong vector size"))
            .mount(&server)
            .await;

        let err = store_for(&server).upsert("docs", &points(3)).await.unwrap_err();
        assert!(matches!(err, VectorStoreError::Api { status: 400, .. }));
        assert_eq!(server.received_requests().await.unwrap_or_default().len(), 1);
    }

    #[tokio::test]
    async fn test_search_request_and_payload_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/collections/docs/points/search"))
            .and(body_json(json!({
                "vector": [0.5, 0.5],
                "limit": 2,
                "with_payload": true
            })))
            .respond_with(ok(json!([
                {
                    "id": "5c56c793-69f3-4fbf-87e6-c4bf54c28c26",
                    "version": 3,
                    "score": 0.91,
                    "payload": {
                        "text": "Docusaurus is a static site generator.",
                        "source_url": "https://docusaurus.io/docs",
                        "metadata": {"chunk_index": 0},
                        "embedding_model": "embed-english-v3.0"
                    }
                },
                {"id": 17, "version": 1, "score": 0.42, "payload": null}
            ])))
            .mount(&server)
            .await;

        let hits = store_for(&server)
            .search("docs", &[0.5, 0.5], 2)
            .await
            .unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].payload.embedding_model, "embed-english-v3.0");
        assert_eq!(hits[0].payload.metadata["chunk_index"], json!(0));
        assert_eq!(hits[1].id, PointId::Num(17));
        assert_eq!(hits[1].payload, PointPayload::default());
    }

    #[tokio::test]
    async fn test_count_and_missing_collection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/collections/docs/points/count"))
            .and(body_json(json!({"exact": true})))
            .respond_with(ok(json!({"count": 312})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/collections/gone/points/count"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "status": {"error": "Not found: Collection `gone` doesn't exist!"}
            })))
            .mount(&server)
            .await;

        let store = store_for(&server);
        assert_eq!(store.count("docs").await.unwrap(), 312);
        assert!(matches!(
            store.count("gone").await.unwrap_err(),
            VectorStoreError::CollectionNotFound(name) if name == "gone"
        ));
    }

    #[tokio::test]
    async fn test_unexpected_shape_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"points": 3})))
            .mount(&server)
            .await;

        let err = store_for(&server).count("docs").await.unwrap_err();
        assert!(matches!(err, VectorStoreError::Malformed(_)));
        assert!(!err.is_transient());
    }
}
