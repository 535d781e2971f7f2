//! # Ingestion
//!
//! Populates the documentation collection that retrieval searches:
//!
//! - **Sources**: configured URLs, with sitemaps expanded into the pages
//!   they list
//! - **Crawling**: fetch each page and extract its main text
//! - **Chunking**: overlapping character chunks tagged with their position
//! - **Storage**: embed chunks in batches and upsert them as points, then
//!   read back the collection size
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Ingestion Pipeline                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  sources ──► SitemapReader ──► Crawler ──► TextChunker          │
//! │                                                 │               │
//! │                                                 ▼               │
//! │            VectorStore::count ◄── upsert ◄── BatchEmbedder      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use docrag_ingest::{IngestionPipeline, resolve_sources};
//! use docrag_retrieval::Settings;
//!
//! let settings = Settings::from_env()?;
//! let pipeline = IngestionPipeline::from_settings(&settings)?;
//! let report = pipeline.run(&resolve_sources(settings.source_urls.as_deref())).await?;
//! ```

pub mod chunker;
pub mod crawler;
pub mod error;
pub mod pipeline;
pub mod sitemap;
pub mod sources;

pub use chunker::{Chunk, ChunkMetadata, TextChunker};
pub use crawler::{CrawledPage, Crawler, PageSelectors, extract_page};
pub use error::{IngestError, Result};
pub use pipeline::{EmbeddedChunk, IngestReport, IngestionPipeline, StageTimings};
pub use sitemap::{SitemapDocument, SitemapReader, parse_sitemap};
pub use sources::{DEFAULT_SOURCE_URLS, expand_sources, resolve_sources};
