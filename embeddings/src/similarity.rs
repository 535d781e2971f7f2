//! Similarity computation for embeddings.

use ordered_float::OrderedFloat;

use crate::error::{EmbeddingError, Result};

/// Compute the cosine similarity between two embeddings.
///
/// Returns a value between -1.0 and 1.0, where:
/// - 1.0 means identical direction
/// - 0.0 means orthogonal vectors
/// - -1.0 means opposite vectors
///
/// A zero vector has similarity 0.0 with everything.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = magnitude(a);
    let norm_b = magnitude(b);

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot / (norm_a * norm_b))
}

/// Euclidean length of a vector.
pub fn magnitude(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Rank `candidates` by cosine similarity to `query` and keep the best `k`.
///
/// Results are ordered by descending similarity; ties keep their input
/// order.
pub fn top_k_by_cosine<'a, T, I>(query: &[f32], candidates: I, k: usize) -> Result<Vec<(T, f32)>>
where
    I: IntoIterator<Item = (T, &'a [f32])>,
{
    let mut scored = Vec::new();
    for (item, vector) in candidates {
        let score = cosine_similarity(query, vector)?;
        scored.push((item, score));
    }

    scored.sort_by_key(|(_, score)| std::cmp::Reverse(OrderedFloat(*score)));
    scored.truncate(k);

    Ok(scored)
}
