//! The memory store adapter: domain operations over a [`StoreClient`].

use crate::client::StoreClient;
use crate::rows::{link_from_value, link_to_value, note_from_value, note_to_value};
use recall_types::{AdapterError, MemoryLink, MemoryNote, SearchOptions, SemanticHit};
use serde_json::{json, Value};
use std::sync::Arc;

/// Collection holding note rows.
pub const NOTES_COLLECTION: &str = "memory_notes";
/// Collection holding link rows.
pub const LINKS_COLLECTION: &str = "memory_links";
/// Named procedure for native vector similarity search.
pub const SIMILARITY_RPC: &str = "match_memory_notes";

/// Narrow translation layer between domain operations and the store client.
///
/// Performs no business validation; failures propagate as [`AdapterError`]
/// with provider detail. Constructed explicitly and passed by reference --
/// there is no ambient client instance.
pub struct MemoryStore {
    client: Arc<dyn StoreClient>,
}

impl MemoryStore {
    pub fn new(client: Arc<dyn StoreClient>) -> Self {
        Self { client }
    }

    /// Persist a note and return it as stored (id assigned by the store).
    pub async fn create_note(&self, note: &MemoryNote) -> Result<MemoryNote, AdapterError> {
        let row = note_to_value(note)?;
        let mut stored = self.client.insert(NOTES_COLLECTION, vec![row]).await?;
        let first = stored
            .pop()
            .ok_or_else(|| AdapterError::Provider("insert returned no rows".to_string()))?;
        note_from_value(first)
    }

    pub async fn delete_note(&self, id: &str) -> Result<(), AdapterError> {
        self.client
            .delete_eq(NOTES_COLLECTION, "id", &json!(id))
            .await
    }

    pub async fn note_by_id(&self, id: &str) -> Result<Option<MemoryNote>, AdapterError> {
        let mut rows = self
            .client
            .select_eq(NOTES_COLLECTION, "id", &json!(id))
            .await?;
        match rows.pop() {
            Some(row) => Ok(Some(note_from_value(row)?)),
            None => Ok(None),
        }
    }

    /// Batched fetch; ids the store no longer knows are silently absent from
    /// the result.
    pub async fn notes_by_ids(&self, ids: &[String]) -> Result<Vec<MemoryNote>, AdapterError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let values: Vec<Value> = ids.iter().map(|id| json!(id)).collect();
        let rows = self
            .client
            .select_in(NOTES_COLLECTION, "id", &values)
            .await?;
        rows.into_iter().map(note_from_value).collect()
    }

    pub async fn notes_by_capsule(
        &self,
        capsule_id: &str,
    ) -> Result<Vec<MemoryNote>, AdapterError> {
        let rows = self
            .client
            .select_eq(NOTES_COLLECTION, "capsule_id", &json!(capsule_id))
            .await?;
        rows.into_iter().map(note_from_value).collect()
    }

    pub async fn all_notes(&self) -> Result<Vec<MemoryNote>, AdapterError> {
        let rows = self.client.select_all(NOTES_COLLECTION).await?;
        rows.into_iter().map(note_from_value).collect()
    }

    /// Persist a link and return it as stored.
    pub async fn create_link(&self, link: &MemoryLink) -> Result<MemoryLink, AdapterError> {
        let row = link_to_value(link)?;
        let mut stored = self.client.insert(LINKS_COLLECTION, vec![row]).await?;
        let first = stored
            .pop()
            .ok_or_else(|| AdapterError::Provider("insert returned no rows".to_string()))?;
        link_from_value(first)
    }

    /// All links with either endpoint in `ids`: the source-side and
    /// target-side queries run in parallel and their results are
    /// concatenated. Callers deduplicate by link id.
    pub async fn links_touching(&self, ids: &[String]) -> Result<Vec<MemoryLink>, AdapterError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let values: Vec<Value> = ids.iter().map(|id| json!(id)).collect();
        let (sources, targets) = tokio::join!(
            self.client.select_in(LINKS_COLLECTION, "source_id", &values),
            self.client.select_in(LINKS_COLLECTION, "target_id", &values),
        );
        let mut rows = sources?;
        rows.extend(targets?);
        rows.into_iter().map(link_from_value).collect()
    }

    /// Native vector similarity search through the store's named procedure.
    ///
    /// Returns ranked hits; any transport error, missing procedure, or
    /// malformed result surfaces as an [`AdapterError`] for the caller to
    /// fall back on.
    pub async fn similarity_search(
        &self,
        embedding: &[f32],
        opts: &SearchOptions,
    ) -> Result<Vec<SemanticHit>, AdapterError> {
        let mut args = json!({
            "embedding": embedding,
            "top_k": opts.top_k,
            "min_score": opts.min_score,
            "metric": opts.metric.as_str(),
        });
        if let Some(ref capsule_id) = opts.capsule_id {
            args["capsule_id"] = json!(capsule_id);
        }
        if let Some(ref user_id) = opts.user_id {
            args["user_id"] = json!(user_id);
        }

        let result = self.client.rpc(SIMILARITY_RPC, args).await?;
        let rows = match result {
            Value::Array(rows) => rows,
            other => {
                return Err(AdapterError::MalformedRow(format!(
                    "similarity result is not an array: {other}"
                )))
            }
        };

        let mut hits = Vec::with_capacity(rows.len());
        for mut row in rows {
            let score = row
                .as_object_mut()
                .and_then(|obj| obj.remove("score"))
                .and_then(|v| v.as_f64())
                .ok_or_else(|| {
                    AdapterError::MalformedRow("similarity hit missing score".to_string())
                })?;
            let note = note_from_value(row)?;
            hits.push(SemanticHit { note, score });
        }
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStoreClient;
    use chrono::Utc;
    use recall_types::SimilarityMetric;

    fn note(title: &str, embedding: Option<Vec<f32>>) -> MemoryNote {
        MemoryNote {
            id: String::new(),
            capsule_id: None,
            user_id: None,
            title: title.to_string(),
            content: String::new(),
            summary: None,
            tags: Vec::new(),
            attachments: Vec::new(),
            created_at: Utc::now(),
            embedding,
        }
    }

    fn store() -> MemoryStore {
        MemoryStore::new(Arc::new(InMemoryStoreClient::new()))
    }

    #[tokio::test]
    async fn create_note_assigns_an_id() {
        let store = store();
        let created = store.create_note(&note("hello", None)).await.unwrap();
        assert!(!created.id.is_empty());
        let fetched = store.note_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "hello");
    }

    #[tokio::test]
    async fn links_touching_unions_both_directions() {
        let store = store();
        let a = store.create_note(&note("a", None)).await.unwrap();
        let b = store.create_note(&note("b", None)).await.unwrap();
        let c = store.create_note(&note("c", None)).await.unwrap();
        for (src, tgt) in [(&a, &b), (&c, &a)] {
            store
                .create_link(&MemoryLink {
                    id: String::new(),
                    source_id: src.id.clone(),
                    target_id: tgt.id.clone(),
                    reason: None,
                    score: None,
                })
                .await
                .unwrap();
        }
        let links = store.links_touching(&[a.id.clone()]).await.unwrap();
        assert_eq!(links.len(), 2);
    }

    #[tokio::test]
    async fn similarity_search_maps_ranked_hits() {
        let store = store();
        store
            .create_note(&note("near", Some(vec![1.0, 0.0])))
            .await
            .unwrap();
        store
            .create_note(&note("far", Some(vec![0.0, 1.0])))
            .await
            .unwrap();
        let opts = SearchOptions {
            top_k: 5,
            metric: SimilarityMetric::Cosine,
            ..Default::default()
        };
        let hits = store.similarity_search(&[1.0, 0.0], &opts).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].note.title, "near");
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn similarity_search_surfaces_missing_rpc() {
        let store = MemoryStore::new(Arc::new(InMemoryStoreClient::without_rpc()));
        let err = store
            .similarity_search(&[1.0], &SearchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::RpcUnsupported(_)));
    }
}
