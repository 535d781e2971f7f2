//! # Vector Store
//!
//! Collections of embedded documentation chunks, searchable by cosine
//! similarity.
//!
//! ## Features
//!
//! - **Typed existence check**: [`VectorStore::collection_status`] answers
//!   "does this collection exist" directly instead of probing with a failing
//!   read
//! - **Lazy creation**: [`VectorStore::ensure_collection`] creates a
//!   collection only when it is absent
//! - **Batched upserts**: points are written in batches, overwriting by id
//! - **Backends**: [`QdrantStore`] for the hosted service, [`InMemoryStore`]
//!   for tests and offline development
//!
//! ## Usage
//!
//! ```rust,ignore
//! use docrag_vector_store::{CollectionSpec, QdrantStore, VectorStore};
//!
//! let store = QdrantStore::new(url, api_key)?;
//! store.ensure_collection("docs", &CollectionSpec::cosine(1024)).await?;
//! store.upsert("docs", &points).await?;
//! let hits = store.search("docs", &query_vector, 5).await?;
//! ```

pub mod error;
pub mod memory;
pub mod qdrant;
pub mod store;
pub mod types;

pub use error::{Result, VectorStoreError};
pub use memory::InMemoryStore;
pub use qdrant::QdrantStore;
pub use store::VectorStore;
pub use types::{
    CollectionSpec, CollectionStatus, Distance, EnsureOutcome, PointId, PointPayload, ScoredPoint,
    StoredPoint,
};

/// Points written per upsert request.
pub const DEFAULT_UPSERT_BATCH_SIZE: usize = 50;
