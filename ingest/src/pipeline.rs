//! Ingestion pipeline orchestration.
//!
//! Runs the whole flow for a set of source URLs:
//! sitemap expansion, crawl, chunk, embed, store, verify.

use std::sync::Arc;
use std::time::{Duration, Instant};

use docrag_embeddings::{BatchEmbedder, CohereProvider};
use docrag_retrieval::Settings;
use docrag_vector_store::{
    CollectionSpec, PointId, PointPayload, QdrantStore, StoredPoint, VectorStore,
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::chunker::{Chunk, TextChunker};
use crate::crawler::Crawler;
use crate::error::{IngestError, Result};
use crate::sitemap::SitemapReader;
use crate::sources::expand_sources;

/// A chunk with its embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
    pub embedding_model: String,
}

impl EmbeddedChunk {
    /// The point written to the vector store.
    pub fn into_point(self) -> StoredPoint {
        StoredPoint {
            id: PointId::Uuid(self.chunk.id),
            vector: self.vector,
            payload: PointPayload {
                text: self.chunk.text,
                source_url: self.chunk.source_url,
                metadata: self.chunk.metadata.to_map(),
                embedding_model: self.embedding_model,
            },
        }
    }
}

/// Time spent in each stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StageTimings {
    pub sources: Duration,
    pub crawl: Duration,
    pub embed: Duration,
    pub store: Duration,
    pub verify: Duration,
    pub total: Duration,
}

/// Summary of one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestReport {
    /// Pages crawled successfully.
    pub urls_processed: usize,

    /// Pages that could not be crawled.
    pub urls_failed: Vec<String>,

    pub chunks_produced: usize,
    pub chunks_embedded: usize,

    /// Chunks whose embedding batch failed under best-effort policy.
    pub chunks_lost: usize,

    pub points_stored: usize,

    /// Point count read back after storing.
    pub verified_count: Option<u64>,

    pub timings: StageTimings,
}

impl IngestReport {
    /// Whether vectors were stored and found again.
    pub fn is_verified(&self) -> bool {
        self.verified_count.is_some_and(|count| count > 0)
    }

    /// Log the run summary.
    pub fn log_summary(&self) {
        info!("Ingestion summary:");
        info!(
            "  - URLs: {} processed, {} failed",
            self.urls_processed,
            self.urls_failed.len()
        );
        info!(
            "  - Chunks: {} produced, {} embedded, {} lost",
            self.chunks_produced, self.chunks_embedded, self.chunks_lost
        );
        info!("  - Points stored: {}", self.points_stored);
        if let Some(count) = self.verified_count {
            info!("  - Collection size: {count}");
        }
        let t = &self.timings;
        info!("  - URL retrieval: {:.2}s", t.sources.as_secs_f64());
        info!("  - Crawling: {:.2}s", t.crawl.as_secs_f64());
        info!("  - Embedding: {:.2}s", t.embed.as_secs_f64());
        info!("  - Storage: {:.2}s", t.store.as_secs_f64());
        info!("  - Verification: {:.2}s", t.verify.as_secs_f64());
        info!("  - Total: {:.2}s", t.total.as_secs_f64());
    }
}

/// Populates a collection from documentation sites.
pub struct IngestionPipeline {
    sitemaps: SitemapReader,
    crawler: Crawler,
    chunker: TextChunker,
    embedder: BatchEmbedder,
    store: Arc<dyn VectorStore>,
    collection: String,
}

impl IngestionPipeline {
    /// Create a pipeline from explicit components.
    pub fn new(
        crawler: Crawler,
        chunker: TextChunker,
        embedder: BatchEmbedder,
        store: Arc<dyn VectorStore>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            sitemaps: SitemapReader::new(),
            crawler,
            chunker,
            embedder,
            store,
            collection: collection.into(),
        }
    }

    /// Create a pipeline backed by Cohere and Qdrant.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut provider = CohereProvider::new()
            .with_api_key(&settings.cohere.api_key)
            .with_model(&settings.cohere.model);
        if let Some(base_url) = &settings.cohere.base_url {
            provider = provider.with_base_url(base_url);
        }
        let embedder =
            BatchEmbedder::new(Arc::new(provider)).with_failure_policy(settings.cohere.failure_policy);
        let store = QdrantStore::new(&settings.qdrant.url, &settings.qdrant.api_key)?;
        let chunker = TextChunker::new(
            settings.chunking.chunk_size,
            settings.chunking.chunk_overlap,
        )?;

        Ok(Self::new(
            Crawler::new()?,
            chunker,
            embedder,
            Arc::new(store),
            &settings.retrieval.collection,
        ))
    }

    /// Set the sitemap reader.
    pub fn with_sitemaps(mut self, sitemaps: SitemapReader) -> Self {
        self.sitemaps = sitemaps;
        self
    }

    /// Collection written by this pipeline.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Run the pipeline over `urls`.
    ///
    /// Pages that fail to crawl are skipped. No chunks at all is a warning
    /// and an empty report, not an error.
    pub async fn run(&self, urls: &[String]) -> Result<IngestReport> {
        let start = Instant::now();
        let mut report = IngestReport::default();
        info!("Starting ingestion into collection {}", self.collection);

        let stage = Instant::now();
        let pages = expand_sources(urls, &self.sitemaps).await;
        report.timings.sources = stage.elapsed();

        let stage = Instant::now();
        let mut chunks = Vec::new();
        for url in &pages {
            match self.crawler.crawl(url).await {
                Ok(page) => {
                    let page_chunks = self.chunker.chunk(&page.content, url);
                    info!(
                        "Extracted and chunked content from {url}, got {} chunks",
                        page_chunks.len()
                    );
                    chunks.extend(page_chunks);
                    report.urls_processed += 1;
                }
                Err(err) => {
                    error!("Failed to crawl {url}: {err}");
                    report.urls_failed.push(url.clone());
                }
            }
        }
        report.timings.crawl = stage.elapsed();
        report.chunks_produced = chunks.len();

        if chunks.is_empty() {
            warn!("No content chunks were generated from the URLs");
            report.timings.total = start.elapsed();
            return Ok(report);
        }
        info!("Total content chunks generated: {}", chunks.len());

        let stage = Instant::now();
        let embedded = self.embed(chunks, &mut report).await?;
        report.timings.embed = stage.elapsed();

        let stage = Instant::now();
        self.store(embedded, &mut report).await?;
        report.timings.store = stage.elapsed();

        let stage = Instant::now();
        let count = self.verify().await?;
        report.verified_count = Some(count);
        report.timings.verify = stage.elapsed();

        report.timings.total = start.elapsed();
        report.log_summary();
        Ok(report)
    }

    /// Exact point count of the collection; fails when it is empty.
    pub async fn verify(&self) -> Result<u64> {
        let count = self.store.count(&self.collection).await?;
        info!(
            "Verification: collection '{}' contains {count} vectors",
            self.collection
        );
        if count == 0 {
            return Err(IngestError::VerificationFailed(format!(
                "no vectors found in collection {}",
                self.collection
            )));
        }
        Ok(count)
    }

    async fn embed(
        &self,
        chunks: Vec<Chunk>,
        report: &mut IngestReport,
    ) -> Result<Vec<EmbeddedChunk>> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let outcome = self.embedder.embed_documents(&texts).await?;

        report.chunks_embedded = outcome.embedded_count();
        report.chunks_lost = outcome.lost_count();
        if !outcome.is_complete() {
            warn!(
                "{} of {} chunks were not embedded and will not be stored",
                outcome.lost_count(),
                texts.len()
            );
        }

        let model = self.embedder.model().to_string();
        Ok(chunks
            .into_iter()
            .zip(outcome.embeddings)
            .filter_map(|(chunk, vector)| {
                vector.map(|vector| EmbeddedChunk {
                    chunk,
                    vector,
                    embedding_model: model.clone(),
                })
            })
            .collect())
    }

    async fn store(&self, embedded: Vec<EmbeddedChunk>, report: &mut IngestReport) -> Result<()> {
        let Some(first) = embedded.first() else {
            info!("No embeddings to store");
            return Ok(());
        };

        let spec = CollectionSpec::cosine(first.vector.len());
        self.store.ensure_collection(&self.collection, &spec).await?;

        let points: Vec<StoredPoint> = embedded.into_iter().map(EmbeddedChunk::into_point).collect();
        self.store.upsert(&self.collection, &points).await?;
        report.points_stored = points.len();
        Ok(())
    }
}
