//! Points, payloads and collection descriptions.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier of a stored point.
///
/// Qdrant accepts either an unsigned integer or a UUID string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointId {
    Num(u64),
    Uuid(String),
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointId::Num(n) => write!(f, "{n}"),
            PointId::Uuid(s) => f.write_str(s),
        }
    }
}

impl From<String> for PointId {
    fn from(value: String) -> Self {
        PointId::Uuid(value)
    }
}

impl From<&str> for PointId {
    fn from(value: &str) -> Self {
        PointId::Uuid(value.to_string())
    }
}

impl From<u64> for PointId {
    fn from(value: u64) -> Self {
        PointId::Num(value)
    }
}

fn unknown_model() -> String {
    "unknown".to_string()
}

/// Data stored alongside each vector.
///
/// Fields missing on read fall back to empty text, an empty metadata
/// object and an `"unknown"` model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointPayload {
    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub source_url: String,

    #[serde(default)]
    pub metadata: Map<String, Value>,

    #[serde(default = "unknown_model")]
    pub embedding_model: String,
}

impl Default for PointPayload {
    fn default() -> Self {
        Self {
            text: String::new(),
            source_url: String::new(),
            metadata: Map::new(),
            embedding_model: unknown_model(),
        }
    }
}

/// A vector with its id and payload, as written by ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPoint {
    pub id: PointId,
    pub vector: Vec<f32>,
    pub payload: PointPayload,
}

/// A search hit before any filtering or shaping.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPoint {
    pub id: PointId,
    pub score: f32,
    pub payload: PointPayload,
}

/// Similarity metric of a collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Distance {
    #[default]
    Cosine,
    Dot,
}

/// Vector configuration of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionSpec {
    pub dimension: usize,
    pub distance: Distance,
}

impl CollectionSpec {
    /// Cosine collection of the given dimension.
    pub fn cosine(dimension: usize) -> Self {
        Self {
            dimension,
            distance: Distance::Cosine,
        }
    }
}

/// Answer to an existence query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStatus {
    Exists,
    Absent,
}

/// What [`crate::VectorStore::ensure_collection`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    Created,
    AlreadyExists,
}
