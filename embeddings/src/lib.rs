//! # Embeddings
//!
//! This crate turns text into dense vectors for the docrag pipeline.
//!
//! ## Features
//!
//! - **Embedding Generation**: Cohere `embed` API behind the [`EmbeddingProvider`] trait
//! - **Encoding Roles**: queries and stored documents use different input types
//! - **Batching**: [`BatchEmbedder`] splits document sets into API-sized batches
//! - **Similarity**: cosine similarity helpers for in-process ranking
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Embeddings System                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  BatchEmbedder ──► EmbeddingProvider ──► Vec<Embedding>        │
//! │       │                   │                                     │
//! │       ▼                   ▼                                     │
//! │  RetryPolicy        CohereProvider                              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod batch;
pub mod error;
pub mod provider;
pub mod similarity;

pub use batch::{BatchEmbedder, BatchFailure, BatchFailurePolicy, BatchOutcome};
pub use error::{EmbeddingError, Result};
pub use provider::{CohereProvider, EmbeddingProvider, EmbeddingRole};
pub use similarity::{cosine_similarity, top_k_by_cosine};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;

/// Default Cohere embedding model.
pub const DEFAULT_MODEL: &str = "embed-english-v3.0";

/// Dimension of [`DEFAULT_MODEL`] embeddings.
pub const DEFAULT_DIMENSION: usize = 1024;
