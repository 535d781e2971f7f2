//! Recursive character chunking.
//!
//! Text is split on the coarsest separator that occurs in it (paragraph
//! breaks, then line breaks, then spaces, then between characters). Pieces
//! that are still too long are split again with the next separator, and
//! short neighbours are merged back up to `chunk_size` characters with
//! `chunk_overlap` characters carried into the next chunk.

use std::collections::VecDeque;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{IngestError, Result};

/// Separators tried in order. The empty separator splits between characters.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// A piece of page text ready for embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Trimmed chunk text, never empty.
    pub text: String,

    /// Page the text came from.
    pub source_url: String,

    pub metadata: ChunkMetadata,
}

/// Position of a chunk within its page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub chunk_index: usize,
    pub total_chunks: usize,

    /// Unix timestamp in seconds.
    pub created_at: f64,
}

impl ChunkMetadata {
    /// Metadata as a JSON object, the form stored with each vector.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("chunk_index".to_string(), Value::from(self.chunk_index));
        map.insert("total_chunks".to_string(), Value::from(self.total_chunks));
        map.insert("created_at".to_string(), Value::from(self.created_at));
        map
    }
}

/// Splits text into overlapping chunks measured in characters.
#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl TextChunker {
    /// Create a chunker. `chunk_overlap` must not exceed `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_overlap > chunk_size || chunk_size == 0 {
            return Err(IngestError::InvalidChunking {
                size: chunk_size,
                overlap: chunk_overlap,
            });
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Chunk page `content`, tagging every chunk with `source_url`.
    ///
    /// Empty or whitespace-only content yields no chunks.
    pub fn chunk(&self, content: &str, source_url: &str) -> Vec<Chunk> {
        if content.trim().is_empty() {
            return Vec::new();
        }

        let texts = self.split_text(content);
        let total_chunks = texts.len();
        let created_at = Utc::now().timestamp_micros() as f64 / 1_000_000.0;

        let chunks: Vec<Chunk> = texts
            .into_iter()
            .enumerate()
            .map(|(chunk_index, text)| Chunk {
                id: uuid::Uuid::new_v4().to_string(),
                text,
                source_url: source_url.to_string(),
                metadata: ChunkMetadata {
                    chunk_index,
                    total_chunks,
                    created_at,
                },
            })
            .collect();

        debug!("Content split into {} chunks", chunks.len());
        chunks
    }

    /// Split `text` into trimmed, non-empty pieces of at most `chunk_size`
    /// characters (unless a single unsplittable piece is longer).
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut separator = "";
        let mut remaining: &[String] = &[];
        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = "";
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let splits: Vec<&str> = if separator.is_empty() {
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else {
            text.split(separator).filter(|s| !s.is_empty()).collect()
        };

        let mut output = Vec::new();
        let mut short: Vec<&str> = Vec::new();
        for split in splits {
            if char_len(split) < self.chunk_size {
                short.push(split);
                continue;
            }
            if !short.is_empty() {
                output.extend(self.merge_splits(&short, separator));
                short.clear();
            }
            if remaining.is_empty() {
                output.push(split.trim().to_string());
            } else {
                output.extend(self.split_recursive(split, remaining));
            }
        }
        if !short.is_empty() {
            output.extend(self.merge_splits(&short, separator));
        }

        output.retain(|chunk| !chunk.is_empty());
        output
    }

    /// Join consecutive splits into chunks of at most `chunk_size`,
    /// starting each new chunk with up to `chunk_overlap` characters of the
    /// previous one.
    fn merge_splits(&self, splits: &[&str], separator: &str) -> Vec<String> {
        let separator_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0;

        for &split in splits {
            let len = char_len(split);
            let joiner = if current.is_empty() { 0 } else { separator_len };

            if total + len + joiner > self.chunk_size {
                if total > self.chunk_size {
                    warn!(
                        "Created a chunk of size {total}, which is longer than the specified {}",
                        self.chunk_size
                    );
                }
                if !current.is_empty() {
                    push_joined(&mut chunks, &current, separator);
                    while total > self.chunk_overlap
                        || (total + len + separator_len > self.chunk_size && total > 0)
                    {
                        let Some(front) = current.pop_front() else {
                            break;
                        };
                        let joiner = if current.is_empty() { 0 } else { separator_len };
                        total -= char_len(front) + joiner;
                    }
                }
            }

            current.push_back(split);
            total += len + if current.len() > 1 { separator_len } else { 0 };
        }

        push_joined(&mut chunks, &current, separator);
        chunks
    }
}

fn push_joined(chunks: &mut Vec<String>, parts: &VecDeque<&str>, separator: &str) {
    let joined = parts.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
