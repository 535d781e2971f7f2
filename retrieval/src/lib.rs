//! # Retrieval Engine
//!
//! This crate answers "which documentation chunks are relevant to this
//! question" for the docrag service:
//!
//! - **Query embedding**: through an injected [`EmbeddingProvider`]
//! - **Vector search**: against an injected [`VectorStore`]
//! - **Filtering and shaping**: threshold on similarity, truncated text,
//!   rounded scores
//!
//! It also owns process configuration ([`Settings`]), since every binary
//! needs the same embedding and store settings the engine uses.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Retrieval Engine                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  query ──► EmbeddingProvider ──► VectorStore::search            │
//! │                                        │                        │
//! │                                        ▼                        │
//! │                         score >= threshold, take(top_k)         │
//! │                                        │                        │
//! │                                        ▼                        │
//! │                               Vec<SearchResult>                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use docrag_retrieval::{RetrievalEngine, Settings};
//!
//! let settings = Settings::from_env()?;
//! let engine = RetrievalEngine::from_settings(&settings)?;
//!
//! let results = engine.retrieve("How do I add a sidebar?", 5, 0.3).await?;
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod quality;
pub mod result;

pub use config::{RetrievalConfig, Settings};
pub use engine::RetrievalEngine;
pub use error::{ConfigError, Result, RetrievalError};
pub use quality::{QualityCheck, run_quality_check};
pub use result::{SearchResult, ValidatedResult};

// Re-export from dependencies for convenience
pub use docrag_embeddings::EmbeddingProvider;
pub use docrag_vector_store::VectorStore;
