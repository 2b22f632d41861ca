//! Request and response DTOs for the memory API.

use crate::MemoryNote;
use serde::{Deserialize, Serialize};

/// Payload for creating a note. Identifier, timestamp, and embedding are
/// assigned at write time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewNote {
    #[serde(default)]
    pub capsule_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub attachments: Vec<serde_json::Value>,
}

/// Payload for creating a link between two existing notes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLink {
    pub source_id: String,
    pub target_id: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
}

/// Distance metric passed through to the store's similarity procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    #[default]
    Cosine,
    InnerProduct,
    Euclidean,
}

impl SimilarityMetric {
    pub fn as_str(self) -> &'static str {
        match self {
            SimilarityMetric::Cosine => "cosine",
            SimilarityMetric::InnerProduct => "inner_product",
            SimilarityMetric::Euclidean => "euclidean",
        }
    }
}

impl std::fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for a semantic search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOptions {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default)]
    pub min_score: f64,
    #[serde(default)]
    pub capsule_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub metric: SimilarityMetric,
}

fn default_top_k() -> usize {
    10
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            min_score: 0.0,
            capsule_id: None,
            user_id: None,
            metric: SimilarityMetric::default(),
        }
    }
}

/// One ranked search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticHit {
    pub note: MemoryNote,
    pub score: f64,
}

/// Which tier of the search pipeline produced the results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchTier {
    /// Embedding + native store similarity procedure.
    Semantic,
    /// In-process case-insensitive substring scan.
    Lexical,
}

impl SearchTier {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchTier::Semantic => "semantic",
            SearchTier::Lexical => "lexical",
        }
    }
}

/// Search results together with the tier that served them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub tier: SearchTier,
    pub hits: Vec<SemanticHit>,
}

/// Base response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(default = "default_code")]
    pub code: i32,
    pub message: String,
    #[serde(default)]
    pub data: Option<T>,
}

fn default_code() -> i32 {
    200
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            code: 200,
            message: "Success".to_string(),
            data: Some(data),
        }
    }

    pub fn error(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}
