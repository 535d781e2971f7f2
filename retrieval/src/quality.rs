//! Retrieval quality check against a populated collection.
//!
//! Two fixed queries: one that should match nothing and one generic enough
//! to match any documentation site. Results are logged, not asserted.

use tracing::{error, info};

use crate::engine::RetrievalEngine;
use crate::error::Result;
use crate::result::{SearchResult, truncate_text};

/// Query that no documentation chunk should resemble.
pub const NO_MATCH_QUERY: &str = "asdasdasdasdasdasdasdasdasdasd";

/// Query that any documentation collection should answer.
pub const SIMPLE_QUERY: &str = "documentation";

/// Results requested per check.
pub const CHECK_TOP_K: usize = 3;

const PREVIEW_CHARS: usize = 100;

/// One check and what retrieval returned for it.
#[derive(Debug)]
pub struct QualityCheck {
    pub name: &'static str,
    pub query: &'static str,
    pub outcome: Result<Vec<SearchResult>>,
}

impl QualityCheck {
    /// Number of results, zero when retrieval failed.
    pub fn result_count(&self) -> usize {
        self.outcome.as_ref().map_or(0, Vec::len)
    }
}

/// Run the no-match and simple-query checks in order.
///
/// A failing check is logged and recorded; the next one still runs.
pub async fn run_quality_check(engine: &RetrievalEngine) -> Vec<QualityCheck> {
    info!(
        "Starting retrieval quality checks ({} embeddings, {} store, collection {})",
        engine.embedder().model(),
        engine.store().name(),
        engine.config().collection
    );

    let mut checks = Vec::with_capacity(2);
    for (name, query) in [("No match", NO_MATCH_QUERY), ("Simple", SIMPLE_QUERY)] {
        info!("Checking {name} query: {query}");
        let outcome = engine
            .retrieve(query, CHECK_TOP_K, engine.config().similarity_threshold)
            .await;
        match &outcome {
            Ok(results) => log_results(name, results),
            Err(err) => error!("Error in {name} query check: {err}"),
        }
        checks.push(QualityCheck {
            name,
            query,
            outcome,
        });
    }

    info!("Retrieval quality checks completed");
    checks
}

fn log_results(name: &str, results: &[SearchResult]) {
    info!("{name} query results: {} results found", results.len());
    for (index, result) in results.iter().enumerate() {
        info!(
            "  Result {}: Score={}, Text='{}'",
            index + 1,
            result.similarity_score,
            truncate_text(&result.text, PREVIEW_CHARS)
        );
    }
}
