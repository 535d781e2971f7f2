//! Search results returned to callers.

use docrag_vector_store::ScoredPoint;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Maximum characters of chunk text kept in a result.
pub const MAX_RESULT_TEXT_CHARS: usize = 500;

/// A retrieved chunk, shaped for output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,

    /// Chunk text, cut to [`MAX_RESULT_TEXT_CHARS`] characters plus `"..."`.
    pub text: String,

    pub source_url: String,

    /// Store score rounded to four decimal places.
    pub similarity_score: f32,

    pub metadata: Map<String, Value>,

    pub embedding_model: String,
}

impl From<ScoredPoint> for SearchResult {
    fn from(point: ScoredPoint) -> Self {
        let payload = point.payload;
        Self {
            id: point.id.to_string(),
            text: truncate_text(&payload.text, MAX_RESULT_TEXT_CHARS),
            source_url: payload.source_url,
            similarity_score: round_score(point.score),
            metadata: payload.metadata,
            embedding_model: payload.embedding_model,
        }
    }
}

/// A result with the share of query words found in its text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedResult {
    #[serde(flatten)]
    pub result: SearchResult,

    /// Fraction of lower-cased query words that occur in the result text.
    pub term_overlap: f32,
}

/// Keep the first `max_chars` characters of `text`, appending `"..."` when
/// anything was cut.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
        None => text.to_string(),
    }
}

/// Round to four decimal places.
pub fn round_score(score: f32) -> f32 {
    ((f64::from(score) * 10_000.0).round() / 10_000.0) as f32
}

/// Fraction of the whitespace-separated words of `query` that appear as
/// substrings of `text`, ignoring case.
pub fn term_overlap(query: &str, text: &str) -> f32 {
    let text = text.to_lowercase();
    let query = query.to_lowercase();
    let words: Vec<&str> = query.split_whitespace().collect();
    if words.is_empty() {
        return 0.0;
    }
    let matched = words.iter().filter(|word| text.contains(*word)).count();
    matched as f32 / words.len() as f32
}
