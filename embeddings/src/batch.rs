//! Batched document embedding.
//!
//! Document sets are split into batches that fit the provider's request
//! limit. Each batch goes through the retry policy; what happens when a
//! batch still fails is governed by [`BatchFailurePolicy`].

use std::str::FromStr;
use std::sync::Arc;

use docrag_async_utils::RetryPolicy;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::Embedding;
use crate::error::{EmbeddingError, Result};
use crate::provider::{EmbeddingProvider, EmbeddingRole};

/// Maximum texts per embedding request.
pub const DEFAULT_BATCH_SIZE: usize = 96;

/// What to do when a batch after the first one fails.
///
/// A failure on the first batch is always returned as an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchFailurePolicy {
    /// Return the error.
    #[default]
    FailFast,
    /// Keep what succeeded and record the failed batch as lost.
    BestEffort,
}

impl FromStr for BatchFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail_fast" | "fail-fast" => Ok(BatchFailurePolicy::FailFast),
            "best_effort" | "best-effort" => Ok(BatchFailurePolicy::BestEffort),
            other => Err(format!("unknown batch failure policy: {other}")),
        }
    }
}

/// A batch that could not be embedded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    /// Zero-based batch number.
    pub batch_index: usize,

    /// Position of the batch's first text in the input.
    pub start: usize,

    /// Number of texts in the batch.
    pub len: usize,

    /// Error message of the final attempt.
    pub error: String,
}

/// Result of embedding a document set.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// One slot per input text, `None` where the batch was lost.
    pub embeddings: Vec<Option<Embedding>>,

    /// Batches that failed under [`BatchFailurePolicy::BestEffort`].
    pub failures: Vec<BatchFailure>,
}

impl BatchOutcome {
    /// Number of texts that received an embedding.
    pub fn embedded_count(&self) -> usize {
        self.embeddings.iter().filter(|e| e.is_some()).count()
    }

    /// Number of texts whose batch failed.
    pub fn lost_count(&self) -> usize {
        self.embeddings.len() - self.embedded_count()
    }

    /// Whether every input was embedded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Embeds document sets in fixed-size batches.
pub struct BatchEmbedder {
    provider: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
    failure_policy: BatchFailurePolicy,
    retry: RetryPolicy,
}

impl BatchEmbedder {
    /// Create a batch embedder with the default batch size and policies.
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            batch_size: DEFAULT_BATCH_SIZE,
            failure_policy: BatchFailurePolicy::default(),
            retry: RetryPolicy::default(),
        }
    }

    /// Set the maximum texts per request.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Set the policy for failures after the first batch.
    pub fn with_failure_policy(mut self, policy: BatchFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Set the retry policy applied to each batch request.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Model name of the underlying provider.
    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Embed `texts` as documents.
    ///
    /// An empty input yields an empty outcome; there is nothing to embed.
    pub async fn embed_documents(&self, texts: &[String]) -> Result<BatchOutcome> {
        if texts.is_empty() {
            info!("No texts to embed");
            return Ok(BatchOutcome::default());
        }

        let total_batches = texts.len().div_ceil(self.batch_size);
        let mut outcome = BatchOutcome {
            embeddings: Vec::with_capacity(texts.len()),
            failures: Vec::new(),
        };

        for (batch_index, batch) in texts.chunks(self.batch_size).enumerate() {
            let start = batch_index * self.batch_size;
            let result = self
                .retry
                .run_if(
                    || self.provider.embed(batch, EmbeddingRole::Document),
                    EmbeddingError::is_transient,
                )
                .await;

            match result {
                Ok(vectors) => {
                    outcome.embeddings.extend(vectors.into_iter().map(Some));
                    info!("Embedded batch {}/{total_batches}", batch_index + 1);
                }
                Err(err) => {
                    error!("Error embedding batch {}: {err}", batch_index + 1);
                    if batch_index == 0 || self.failure_policy == BatchFailurePolicy::FailFast {
                        return Err(err);
                    }
                    warn!(
                        "Dropping {} texts (positions {start}..{}) from failed batch {}",
                        batch.len(),
                        start + batch.len(),
                        batch_index + 1
                    );
                    outcome.embeddings.extend(std::iter::repeat_n(None, batch.len()));
                    outcome.failures.push(BatchFailure {
                        batch_index,
                        start,
                        len: batch.len(),
                        error: err.to_string(),
                    });
                }
            }
        }

        info!(
            "Successfully embedded {} of {} texts",
            outcome.embedded_count(),
            texts.len()
        );

        Ok(outcome)
    }
}
