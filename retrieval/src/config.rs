//! Configuration loaded from the environment.
//!
//! Every binary calls `dotenvy::dotenv()` first and then
//! [`Settings::from_env`]. Tests use [`Settings::from_lookup`] with a map.

use std::str::FromStr;

use docrag_embeddings::BatchFailurePolicy;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default collection name.
pub const DEFAULT_COLLECTION: &str = "rag_pipeline_docs";

/// Default number of results per query.
pub const DEFAULT_TOP_K: usize = 5;

/// Default minimum similarity score.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.3;

/// Default chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 800;

/// Default overlap between consecutive chunks in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;

/// Default chat-completions endpoint.
pub const DEFAULT_AGENT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Default agent model.
pub const DEFAULT_AGENT_MODEL: &str = "mistralai/devstral-2512:free";

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

/// Configuration for the retrieval engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Collection searched by every query.
    pub collection: String,

    /// Results per query when the caller does not say.
    pub top_k: usize,

    /// Minimum similarity score (inclusive) when the caller does not say.
    pub similarity_threshold: f32,
}

impl RetrievalConfig {
    /// Configuration for `collection` with default limits.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            top_k: DEFAULT_TOP_K,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }

    /// Set the default result count.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the default similarity threshold.
    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self::new(DEFAULT_COLLECTION)
    }
}

/// Cohere embedding settings.
#[derive(Debug, Clone, PartialEq)]
pub struct CohereSettings {
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: String,
    pub failure_policy: BatchFailurePolicy,
}

/// Qdrant connection settings.
#[derive(Debug, Clone, PartialEq)]
pub struct QdrantSettings {
    pub url: String,
    pub api_key: String,
}

/// Chunking settings for ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// Chat-completions agent settings.
///
/// The key is optional here; only the HTTP server needs it.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

/// All process settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub cohere: CohereSettings,
    pub qdrant: QdrantSettings,
    pub retrieval: RetrievalConfig,
    pub chunking: ChunkingSettings,

    /// Documentation URLs from `DOCUSAURUS_URLS`, if set.
    pub source_urls: Option<Vec<String>>,

    pub agent: AgentSettings,
    pub bind_addr: String,
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read settings through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| {
            lookup(var)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let require = |var: &str| get(var).ok_or_else(|| ConfigError::Missing(var.to_string()));

        let cohere = CohereSettings {
            api_key: require("COHERE_API_KEY")?,
            base_url: get("COHERE_BASE_URL"),
            model: get("EMBEDDING_MODEL")
                .unwrap_or_else(|| docrag_embeddings::DEFAULT_MODEL.to_string()),
            failure_policy: parse_or(
                "EMBED_FAILURE_POLICY",
                get("EMBED_FAILURE_POLICY"),
                BatchFailurePolicy::default(),
            )?,
        };

        let qdrant = QdrantSettings {
            url: require("QDRANT_URL")?,
            api_key: require("QDRANT_API_KEY")?,
        };

        let retrieval = RetrievalConfig {
            collection: get("QDRANT_COLLECTION")
                .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            top_k: parse_or("RETRIEVAL_TOP_K", get("RETRIEVAL_TOP_K"), DEFAULT_TOP_K)?,
            similarity_threshold: parse_or(
                "SIMILARITY_THRESHOLD",
                get("SIMILARITY_THRESHOLD"),
                DEFAULT_SIMILARITY_THRESHOLD,
            )?,
        };

        let chunking = ChunkingSettings {
            chunk_size: parse_or("CHUNK_SIZE", get("CHUNK_SIZE"), DEFAULT_CHUNK_SIZE)?,
            chunk_overlap: parse_or("CHUNK_OVERLAP", get("CHUNK_OVERLAP"), DEFAULT_CHUNK_OVERLAP)?,
        };

        let source_urls = get("DOCUSAURUS_URLS").map(|raw| parse_url_list(&raw));

        let agent = AgentSettings {
            api_key: get("OPENROUTER_API_KEY"),
            base_url: get("OPENROUTER_BASE_URL")
                .unwrap_or_else(|| DEFAULT_AGENT_BASE_URL.to_string()),
            model: get("AGENT_MODEL").unwrap_or_else(|| DEFAULT_AGENT_MODEL.to_string()),
        };

        Ok(Self {
            cohere,
            qdrant,
            retrieval,
            chunking,
            source_urls,
            agent,
            bind_addr: get("DOCRAG_BIND").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        })
    }
}

/// Split a comma-separated URL list, dropping empty entries.
pub fn parse_url_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_or<T: FromStr>(var: &str, value: Option<String>, default: T) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
            var: var.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("COHERE_API_KEY", "cohere-key"),
        ("QDRANT_URL", "https://cluster.qdrant.example:6333"),
        ("QDRANT_API_KEY", "qdrant-key"),
    ];

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&REQUIRED)).unwrap();

        assert_eq!(settings.retrieval, RetrievalConfig::default());
        assert_eq!(settings.retrieval.collection, "rag_pipeline_docs");
        assert_eq!(settings.retrieval.top_k, 5);
        assert_eq!(settings.chunking, ChunkingSettings::default());
        assert_eq!(settings.cohere.model, "embed-english-v3.0");
        assert_eq!(settings.cohere.failure_policy, BatchFailurePolicy::FailFast);
        assert_eq!(settings.source_urls, None);
        assert_eq!(settings.agent.api_key, None);
        assert_eq!(settings.agent.base_url, "https://openrouter.ai/api/v1");
        assert_eq!(settings.bind_addr, "0.0.0.0:8000");
    }

    #[test]
    fn test_missing_required_variable() {
        let err = Settings::from_lookup(lookup(&REQUIRED[..2])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("QDRANT_API_KEY".to_string()));

        let mut blank = REQUIRED.to_vec();
        blank[0] = ("COHERE_API_KEY", "   ");
        let err = Settings::from_lookup(lookup(&blank)).unwrap_err();
        assert_eq!(err, ConfigError::Missing("COHERE_API_KEY".to_string()));
    }

    #[test]
    fn test_overrides_and_invalid_numbers() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("RETRIEVAL_TOP_K", "8"),
            ("SIMILARITY_THRESHOLD", "0.55"),
            ("EMBED_FAILURE_POLICY", "best_effort"),
            ("DOCUSAURUS_URLS", "https://a.example/docs, ,https://b.example/sitemap.xml"),
        ]);
        let settings = Settings::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(settings.retrieval.top_k, 8);
        assert_eq!(settings.retrieval.similarity_threshold, 0.55);
        assert_eq!(settings.cohere.failure_policy, BatchFailurePolicy::BestEffort);
        assert_eq!(
            settings.source_urls,
            Some(vec![
                "https://a.example/docs".to_string(),
                "https://b.example/sitemap.xml".to_string()
            ])
        );

        vars.push(("CHUNK_SIZE", "large"));
        let err = Settings::from_lookup(lookup(&vars)).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                var: "CHUNK_SIZE".to_string(),
                value: "large".to_string()
            }
        );
    }
}
