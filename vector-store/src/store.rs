//! The storage trait shared by all backends.

use async_trait::async_trait;
use tracing::info;

use crate::error::Result;
use crate::types::{CollectionSpec, CollectionStatus, EnsureOutcome, ScoredPoint, StoredPoint};

/// A store of named vector collections.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Backend name, for logs.
    fn name(&self) -> &str;

    /// Whether `collection` exists.
    async fn collection_status(&self, collection: &str) -> Result<CollectionStatus>;

    /// Create `collection`. Fails if it already exists.
    async fn create_collection(&self, collection: &str, spec: &CollectionSpec) -> Result<()>;

    /// Insert or overwrite `points` by id.
    async fn upsert(&self, collection: &str, points: &[StoredPoint]) -> Result<()>;

    /// Up to `top_k` nearest points, most similar first.
    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredPoint>>;

    /// Exact number of points in `collection`.
    async fn count(&self, collection: &str) -> Result<u64>;

    /// Create `collection` unless it already exists.
    ///
    /// Two writers racing here may both attempt creation; ingestion is
    /// single-writer.
    async fn ensure_collection(
        &self,
        collection: &str,
        spec: &CollectionSpec,
    ) -> Result<EnsureOutcome> {
        match self.collection_status(collection).await? {
            CollectionStatus::Exists => Ok(EnsureOutcome::AlreadyExists),
            CollectionStatus::Absent => {
                self.create_collection(collection, spec).await?;
                info!(
                    "Created collection {collection} ({} dims, {:?})",
                    spec.dimension, spec.distance
                );
                Ok(EnsureOutcome::Created)
            }
        }
    }
}
