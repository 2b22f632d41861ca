//! Domain entities: notes, links, and the ephemeral graph context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted unit of captured knowledge.
///
/// `title` is never empty once persisted: a missing title is derived from the
/// first 40 characters of `content`, or falls back to `"Untitled"`.
/// `created_at` is set once at creation and never changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryNote {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capsule_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Opaque attachment records, order-preserving.
    #[serde(default)]
    pub attachments: Vec<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    /// Fixed-length vector computed at write time; absent when the embedding
    /// provider was unavailable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl MemoryNote {
    /// The canonical text blob embeddings are computed from.
    pub fn canonical_text(&self) -> String {
        let mut blob = String::new();
        blob.push_str(&self.title);
        blob.push('\n');
        blob.push_str(&self.content);
        if !self.tags.is_empty() {
            blob.push('\n');
            blob.push_str(&self.tags.join(" "));
        }
        if let Some(ref summary) = self.summary {
            blob.push('\n');
            blob.push_str(summary);
        }
        blob
    }
}

/// A directed, typed relationship between two notes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryLink {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    /// Free-text rationale for the link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Relevance weight; rendering scales stroke width by `sqrt(score)`,
    /// defaulting to 1 when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// A request-scoped neighborhood snapshot: the focal note, the edges reached
/// by a bounded traversal, and the neighbor notes those edges touch.
///
/// Never persisted; `edges` and `neighbors` are deduplicated by id and
/// `neighbors` never contains the focal note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphContext {
    pub node: MemoryNote,
    pub edges: Vec<MemoryLink>,
    pub neighbors: Vec<MemoryNote>,
}
