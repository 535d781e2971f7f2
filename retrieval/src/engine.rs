//! Retrieval engine implementation.

use std::sync::Arc;
use std::time::Instant;

use docrag_embeddings::{CohereProvider, EmbeddingProvider};
use docrag_vector_store::{QdrantStore, VectorStore};
use tracing::{debug, info};

use crate::config::{RetrievalConfig, Settings};
use crate::error::{Result, RetrievalError};
use crate::result::{SearchResult, ValidatedResult, term_overlap};

/// Retrieval engine: embeds a query, searches the collection and shapes
/// what passes the similarity threshold.
///
/// The engine holds injected clients and is built once per process, then
/// shared behind an `Arc`. Nothing on the query path is retried.
pub struct RetrievalEngine {
    /// Query embedder.
    embedder: Arc<dyn EmbeddingProvider>,

    /// Vector store searched by every query.
    store: Arc<dyn VectorStore>,

    /// Configuration.
    config: RetrievalConfig,
}

impl RetrievalEngine {
    /// Create an engine from explicit clients.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            embedder,
            store,
            config,
        }
    }

    /// Create an engine backed by Cohere and Qdrant.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut embedder = CohereProvider::new()
            .with_api_key(&settings.cohere.api_key)
            .with_model(&settings.cohere.model);
        if let Some(base_url) = &settings.cohere.base_url {
            embedder = embedder.with_base_url(base_url);
        }
        let store = QdrantStore::new(&settings.qdrant.url, &settings.qdrant.api_key)?;

        Ok(Self::new(
            Arc::new(embedder),
            Arc::new(store),
            settings.retrieval.clone(),
        ))
    }

    /// Get the configuration.
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// The embedder used for queries.
    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// The store searched by queries.
    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    /// Retrieve up to `top_k` chunks scoring at least `similarity_threshold`.
    ///
    /// Results keep the store's order (most similar first). An empty list
    /// means nothing cleared the threshold.
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
        similarity_threshold: f32,
    ) -> Result<Vec<SearchResult>> {
        if query.trim().is_empty() {
            return Err(RetrievalError::InvalidQuery(
                "query cannot be empty".to_string(),
            ));
        }

        info!("Starting retrieval for query: {query}");
        info!(
            "Query length: {} characters, top_k: {top_k}, threshold: {similarity_threshold}",
            query.chars().count()
        );
        let start = Instant::now();

        let query_vector = self.embedder.embed_query(query).await?;
        let raw = self
            .store
            .search(&self.config.collection, &query_vector, top_k)
            .await?;
        debug!("Store returned {} candidates", raw.len());

        let results: Vec<SearchResult> = raw
            .into_iter()
            .filter(|point| {
                let keep = point.score >= similarity_threshold;
                if !keep {
                    debug!("Filtered out result with low similarity score: {}", point.score);
                }
                keep
            })
            .take(top_k)
            .map(SearchResult::from)
            .collect();

        log_summary(&results, similarity_threshold, start);
        Ok(results)
    }

    /// Retrieve with the configured `top_k` and threshold.
    pub async fn retrieve_default(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.retrieve(query, self.config.top_k, self.config.similarity_threshold)
            .await
    }

    /// Retrieve and report how many query words each result contains.
    ///
    /// The overlap is informational; no result is dropped because of it.
    pub async fn retrieve_with_validation(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<ValidatedResult>> {
        let results = self
            .retrieve(query, top_k, self.config.similarity_threshold)
            .await?;

        Ok(results
            .into_iter()
            .map(|result| {
                let overlap = term_overlap(query, &result.text);
                debug!(
                    "Relevance check for result {}: {:.2} of query words matched",
                    result.id, overlap
                );
                ValidatedResult {
                    result,
                    term_overlap: overlap,
                }
            })
            .collect())
    }
}

fn log_summary(results: &[SearchResult], threshold: f32, start: Instant) {
    info!(
        "Retrieval completed in {:.2}s",
        start.elapsed().as_secs_f64()
    );
    info!("Found {} results above threshold {threshold}", results.len());

    let scores = results.iter().map(|r| r.similarity_score);
    if let (Some(highest), Some(lowest)) = (
        scores.clone().reduce(f32::max),
        scores.reduce(f32::min),
    ) {
        info!("Highest similarity score: {highest:.4}");
        info!("Lowest similarity score: {lowest:.4}");
    }

    for (index, result) in results.iter().enumerate() {
        debug!(
            "Result {}: score={}, url={}",
            index + 1,
            result.similarity_score,
            result.source_url
        );
    }
}
