//! Process-local vector store.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use docrag_embeddings::top_k_by_cosine;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{Result, VectorStoreError};
use crate::store::VectorStore;
use crate::types::{
    CollectionSpec, CollectionStatus, Distance, PointId, ScoredPoint, StoredPoint,
};

struct Collection {
    spec: CollectionSpec,
    points: BTreeMap<PointId, StoredPoint>,
}

impl Collection {
    fn check_dimension(&self, len: usize) -> Result<()> {
        if len != self.spec.dimension {
            return Err(VectorStoreError::DimensionMismatch {
                expected: self.spec.dimension,
                actual: len,
            });
        }
        Ok(())
    }
}

/// A [`VectorStore`] held entirely in memory.
///
/// Ranking is exhaustive; fine for tests and small offline corpora.
#[derive(Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn collection_status(&self, collection: &str) -> Result<CollectionStatus> {
        Ok(if self.collections.read().await.contains_key(collection) {
            CollectionStatus::Exists
        } else {
            CollectionStatus::Absent
        })
    }

    async fn create_collection(&self, collection: &str, spec: &CollectionSpec) -> Result<()> {
        let mut collections = self.collections.write().await;
        if collections.contains_key(collection) {
            return Err(VectorStoreError::Api {
                status: 409,
                body: format!("collection {collection} already exists"),
            });
        }
        collections.insert(
            collection.to_string(),
            Collection {
                spec: *spec,
                points: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: &[StoredPoint]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| VectorStoreError::CollectionNotFound(collection.to_string()))?;

        for point in points {
            target.check_dimension(point.vector.len())?;
        }
        for point in points {
            target.points.insert(point.id.clone(), point.clone());
        }

        debug!("Upserted {} points into {collection}", points.len());
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredPoint>> {
        let collections = self.collections.read().await;
        let target = collections
            .get(collection)
            .ok_or_else(|| VectorStoreError::CollectionNotFound(collection.to_string()))?;
        target.check_dimension(vector.len())?;

        let ranked: Vec<(&StoredPoint, f32)> = match target.spec.distance {
            Distance::Cosine => {
                let candidates = target.points.values().map(|p| (p, p.vector.as_slice()));
                top_k_by_cosine(vector, candidates, top_k).map_err(|err| {
                    VectorStoreError::Malformed(format!("similarity failed: {err}"))
                })?
            }
            Distance::Dot => {
                let mut scored: Vec<(&StoredPoint, f32)> = target
                    .points
                    .values()
                    .map(|p| (p, p.vector.iter().zip(vector).map(|(a, b)| a * b).sum()))
                    .collect();
                scored.sort_by(|a, b| b.1.total_cmp(&a.1));
                scored.truncate(top_k);
                scored
            }
        };

        Ok(ranked
            .into_iter()
            .map(|(point, score)| ScoredPoint {
                id: point.id.clone(),
                score,
                payload: point.payload.clone(),
            })
            .collect())
    }

    async fn count(&self, collection: &str) -> Result<u64> {
        let collections = self.collections.read().await;
        let target = collections
            .get(collection)
            .ok_or_else(|| VectorStoreError::CollectionNotFound(collection.to_string()))?;
        Ok(target.points.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EnsureOutcome, PointPayload};
    use pretty_assertions::assert_eq;

    fn point(id: &str, vector: Vec<f32>, text: &str) -> StoredPoint {
        StoredPoint {
            id: id.into(),
            vector,
            payload: PointPayload {
                text: text.to_string(),
                ..PointPayload::default()
            },
        }
    }

    async fn store_with_docs() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .ensure_collection("docs", &CollectionSpec::cosine(2))
            .await
            .unwrap();
        store
            .upsert(
                "docs",
                &[
                    point("a", vec![1.0, 0.0], "east"),
                    point("b", vec![0.0, 1.0], "north"),
                    point("c", vec![0.8, 0.6], "north-east"),
                ],
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_ensure_collection_creates_once() {
        let store = InMemoryStore::new();
        let spec = CollectionSpec::cosine(3);

        assert_eq!(
            store.collection_status("docs").await.unwrap(),
            CollectionStatus::Absent
        );
        assert_eq!(
            store.ensure_collection("docs", &spec).await.unwrap(),
            EnsureOutcome::Created
        );
        assert_eq!(
            store.ensure_collection("docs", &spec).await.unwrap(),
            EnsureOutcome::AlreadyExists
        );
        assert_eq!(store.count("docs").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_search_orders_by_similarity() {
        let store = store_with_docs().await;

        let hits = store.search("docs", &[1.0, 0.1], 2).await.unwrap();
        let texts: Vec<&str> = hits.iter().map(|h| h.payload.text.as_str()).collect();

        assert_eq!(texts, vec!["east", "north-east"]);
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_by_id() {
        let store = store_with_docs().await;

        store
            .upsert("docs", &[point("a", vec![1.0, 0.0], "east, revised")])
            .await
            .unwrap();
        store
            .upsert("docs", &[point("a", vec![1.0, 0.0], "east, revised")])
            .await
            .unwrap();

        assert_eq!(store.count("docs").await.unwrap(), 3);
        let hits = store.search("docs", &[1.0, 0.0], 1).await.unwrap();
        assert_eq!(hits[0].payload.text, "east, revised");
    }

    #[tokio::test]
    async fn test_dimension_and_missing_collection_errors() {
        let store = store_with_docs().await;

        let err = store
            .upsert("docs", &[point("d", vec![1.0, 0.0, 0.0], "too long")])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VectorStoreError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
        assert_eq!(store.count("docs").await.unwrap(), 3);

        let err = store.search("missing", &[1.0, 0.0], 5).await.unwrap_err();
        assert!(matches!(err, VectorStoreError::CollectionNotFound(_)));
    }

    #[tokio::test]
    async fn test_dot_product_collection() {
        let store = InMemoryStore::new();
        store
            .create_collection(
                "dot",
                &CollectionSpec {
                    dimension: 2,
                    distance: Distance::Dot,
                },
            )
            .await
            .unwrap();
        store
            .upsert(
                "dot",
                &[point("small", vec![1.0, 0.0], "small"), point("big", vec![3.0, 0.0], "big")],
            )
            .await
            .unwrap();

        let hits = store.search("dot", &[1.0, 0.0], 5).await.unwrap();
        assert_eq!(hits[0].id, PointId::from("big"));
        assert_eq!(hits[0].score, 3.0);
    }
}
