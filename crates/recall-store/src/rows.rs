//! Typed wire rows and pure row <-> domain mapping.
//!
//! Columns are snake_case on the wire, 1:1 with the domain fields. The
//! duck-typed JSON coming back from the store never leaves this module
//! unparsed.

use chrono::{DateTime, Utc};
use recall_types::{AdapterError, MemoryLink, MemoryNote};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wire shape of a note row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteRow {
    /// Empty on insert; assigned by the store.
    #[serde(default, skip_serializing_if = "String::is_empty")]
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
    #[serde(default)]
    pub attachments: Vec<Value>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

/// Wire shape of a link row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkRow {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl From<&MemoryNote> for NoteRow {
    fn from(note: &MemoryNote) -> Self {
        Self {
            id: note.id.clone(),
            capsule_id: note.capsule_id.clone(),
            user_id: note.user_id.clone(),
            title: note.title.clone(),
            content: note.content.clone(),
            summary: note.summary.clone(),
            tags: note.tags.clone(),
            attachments: note.attachments.clone(),
            created_at: note.created_at,
            embedding: note.embedding.clone(),
        }
    }
}

impl From<NoteRow> for MemoryNote {
    fn from(row: NoteRow) -> Self {
        Self {
            id: row.id,
            capsule_id: row.capsule_id,
            user_id: row.user_id,
            title: row.title,
            content: row.content,
            summary: row.summary,
            tags: row.tags,
            attachments: row.attachments,
            created_at: row.created_at,
            embedding: row.embedding,
        }
    }
}

impl From<&MemoryLink> for LinkRow {
    fn from(link: &MemoryLink) -> Self {
        Self {
            id: link.id.clone(),
            source_id: link.source_id.clone(),
            target_id: link.target_id.clone(),
            reason: link.reason.clone(),
            score: link.score,
        }
    }
}

impl From<LinkRow> for MemoryLink {
    fn from(row: LinkRow) -> Self {
        Self {
            id: row.id,
            source_id: row.source_id,
            target_id: row.target_id,
            reason: row.reason,
            score: row.score,
        }
    }
}

/// Parse a raw store row into a note.
pub fn note_from_value(value: Value) -> Result<MemoryNote, AdapterError> {
    let row: NoteRow = serde_json::from_value(value)
        .map_err(|e| AdapterError::MalformedRow(format!("note: {e}")))?;
    Ok(row.into())
}

/// Parse a raw store row into a link.
pub fn link_from_value(value: Value) -> Result<MemoryLink, AdapterError> {
    let row: LinkRow = serde_json::from_value(value)
        .map_err(|e| AdapterError::MalformedRow(format!("link: {e}")))?;
    Ok(row.into())
}

/// Serialize a note for insertion.
pub fn note_to_value(note: &MemoryNote) -> Result<Value, AdapterError> {
    serde_json::to_value(NoteRow::from(note))
        .map_err(|e| AdapterError::Provider(e.to_string()))
}

/// Serialize a link for insertion.
pub fn link_to_value(link: &MemoryLink) -> Result<Value, AdapterError> {
    serde_json::to_value(LinkRow::from(link))
        .map_err(|e| AdapterError::Provider(e.to_string()))
}
