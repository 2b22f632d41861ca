//! Semantic memory index: embedding-backed search over notes with a
//! deterministic lexical fallback.

use chrono::Utc;
use recall_store::MemoryStore;
use recall_types::{
    Embedder, EngineError, MemoryNote, NewNote, SearchOptions, SearchOutcome, SearchTier,
    SemanticHit,
};
use std::sync::Arc;

/// Relevance assigned to lexical fallback matches; no ranking signal exists
/// on that path.
const FALLBACK_SCORE: f64 = 0.5;

const TITLE_PREFIX_CHARS: usize = 40;

/// Outcome of the query-embedding stage of the search pipeline.
enum QueryVector {
    Embedded(Vec<f32>),
    Unavailable,
}

/// Stores, lists, and searches memory notes.
///
/// Search runs as an explicit three-stage pipeline: embed the query, ask the
/// store's native similarity procedure, and fall back to an in-process
/// lexical scan. Each stage reports a tagged outcome; the tier that finally
/// served the request is part of the result.
pub struct SemanticIndex {
    store: Arc<MemoryStore>,
    embedder: Arc<dyn Embedder>,
}

impl SemanticIndex {
    pub fn new(store: Arc<MemoryStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self { store, embedder }
    }

    fn derive_title(title: Option<String>, content: &str) -> String {
        if let Some(t) = title {
            if !t.trim().is_empty() {
                return t;
            }
        }
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return "Untitled".to_string();
        }
        trimmed.chars().take(TITLE_PREFIX_CHARS).collect()
    }

    /// Persist a new note.
    ///
    /// The embedding is computed from the canonical text blob at write time.
    /// When the provider is unavailable the note is stored without a vector:
    /// that degrades later search quality, it never fails the write.
    pub async fn add(&self, new: NewNote) -> Result<MemoryNote, EngineError> {
        let title = Self::derive_title(new.title, &new.content);
        let mut note = MemoryNote {
            id: String::new(),
            capsule_id: new.capsule_id,
            user_id: new.user_id,
            title,
            content: new.content,
            summary: new.summary,
            tags: new.tags,
            attachments: new.attachments,
            created_at: Utc::now(),
            embedding: None,
        };
        match self.embedder.embed(&note.canonical_text()).await {
            Ok(vector) => note.embedding = Some(vector),
            Err(e) => {
                tracing::warn!(error = %e, title = %note.title, "storing note without embedding");
            }
        }
        Ok(self.store.create_note(&note).await?)
    }

    pub async fn list(&self, capsule_id: &str) -> Result<Vec<MemoryNote>, EngineError> {
        Ok(self.store.notes_by_capsule(capsule_id).await?)
    }

    pub async fn remove(&self, id: &str) -> Result<(), EngineError> {
        Ok(self.store.delete_note(id).await?)
    }

    /// Search notes for `query`.
    ///
    /// Pipeline, in priority order: embed the query; if embedded, call the
    /// store's similarity procedure; on embedding failure, missing
    /// procedure, transport error, or a malformed result, run the lexical
    /// fallback. The fallback always produces a usable answer, at the cost
    /// of ranking quality.
    pub async fn search(
        &self,
        query: &str,
        opts: &SearchOptions,
    ) -> Result<SearchOutcome, EngineError> {
        if let QueryVector::Embedded(vector) = self.embed_query(query).await {
            match self.store.similarity_search(&vector, opts).await {
                Ok(hits) => {
                    return Ok(SearchOutcome {
                        tier: SearchTier::Semantic,
                        hits,
                    })
                }
                Err(e) => {
                    tracing::warn!(error = %e, "similarity procedure failed, falling back to lexical");
                }
            }
        }
        let hits = self.lexical_fallback(query, opts).await?;
        Ok(SearchOutcome {
            tier: SearchTier::Lexical,
            hits,
        })
    }

    async fn embed_query(&self, query: &str) -> QueryVector {
        match self.embedder.embed(query).await {
            Ok(vector) => QueryVector::Embedded(vector),
            Err(e) => {
                tracing::warn!(error = %e, "query embedding unavailable");
                QueryVector::Unavailable
            }
        }
    }

    /// Case-insensitive substring scan over title, content, and tags.
    async fn lexical_fallback(
        &self,
        query: &str,
        opts: &SearchOptions,
    ) -> Result<Vec<SemanticHit>, EngineError> {
        let notes = match opts.capsule_id {
            Some(ref capsule_id) => self.store.notes_by_capsule(capsule_id).await?,
            None => self.store.all_notes().await?,
        };
        let needle = query.to_lowercase();
        let hits = notes
            .into_iter()
            .filter(|note| match opts.user_id {
                Some(ref uid) => note.user_id.as_deref() == Some(uid.as_str()),
                None => true,
            })
            .filter(|note| {
                note.title.to_lowercase().contains(&needle)
                    || note.content.to_lowercase().contains(&needle)
                    || note
                        .tags
                        .iter()
                        .any(|tag| tag.to_lowercase().contains(&needle))
            })
            .take(opts.top_k)
            .map(|note| SemanticHit {
                note,
                score: FALLBACK_SCORE,
            })
            .collect();
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_embed::{MockEmbedder, UnavailableEmbedder};
    use recall_store::InMemoryStoreClient;

    fn index_with(client: InMemoryStoreClient, embedder: Arc<dyn Embedder>) -> SemanticIndex {
        let store = Arc::new(MemoryStore::new(Arc::new(client)));
        SemanticIndex::new(store, embedder)
    }

    fn new_note(title: Option<&str>, content: &str) -> NewNote {
        NewNote {
            title: title.map(str::to_string),
            content: content.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn title_defaults_to_content_prefix() {
        let index = index_with(InMemoryStoreClient::new(), Arc::new(MockEmbedder::new()));
        let long = "x".repeat(120);
        let note = index.add(new_note(None, &long)).await.unwrap();
        assert_eq!(note.title.chars().count(), 40);
        assert!(long.starts_with(&note.title));
    }

    #[tokio::test]
    async fn title_defaults_to_untitled_when_everything_is_empty() {
        let index = index_with(InMemoryStoreClient::new(), Arc::new(MockEmbedder::new()));
        let note = index.add(new_note(None, "")).await.unwrap();
        assert_eq!(note.title, "Untitled");
    }

    #[tokio::test]
    async fn explicit_title_is_kept() {
        let index = index_with(InMemoryStoreClient::new(), Arc::new(MockEmbedder::new()));
        let note = index
            .add(new_note(Some("My Title"), "some content"))
            .await
            .unwrap();
        assert_eq!(note.title, "My Title");
    }

    #[tokio::test]
    async fn embedding_failure_does_not_fail_the_write() {
        let index = index_with(InMemoryStoreClient::new(), Arc::new(UnavailableEmbedder));
        let note = index.add(new_note(Some("t"), "c")).await.unwrap();
        assert!(note.embedding.is_none());
    }

    #[tokio::test]
    async fn semantic_tier_is_used_when_rpc_is_available() {
        let index = index_with(InMemoryStoreClient::new(), Arc::new(MockEmbedder::new()));
        for i in 0..3 {
            let title = format!("note {i}");
            index
                .add(new_note(Some(title.as_str()), "body"))
                .await
                .unwrap();
        }
        let outcome = index
            .search("note", &SearchOptions { top_k: 2, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(outcome.tier, SearchTier::Semantic);
        assert!(outcome.hits.len() <= 2);
    }

    #[tokio::test]
    async fn missing_rpc_falls_back_to_lexical() {
        let index = index_with(
            InMemoryStoreClient::without_rpc(),
            Arc::new(MockEmbedder::new()),
        );
        index
            .add(new_note(Some("Budget Q1"), "quarterly plan"))
            .await
            .unwrap();
        index.add(new_note(Some("Groceries"), "milk")).await.unwrap();
        index
            .add(new_note(Some("Standup notes"), "daily sync"))
            .await
            .unwrap();

        let outcome = index
            .search("budget", &SearchOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome.tier, SearchTier::Lexical);
        assert_eq!(outcome.hits.len(), 1);
        assert_eq!(outcome.hits[0].note.title, "Budget Q1");
        assert_eq!(outcome.hits[0].score, 0.5);
    }

    #[tokio::test]
    async fn embedding_outage_falls_back_even_with_rpc_present() {
        let index = index_with(InMemoryStoreClient::new(), Arc::new(UnavailableEmbedder));
        index
            .add(new_note(Some("Findable"), "matching text"))
            .await
            .unwrap();
        let outcome = index
            .search("findable", &SearchOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome.tier, SearchTier::Lexical);
        assert_eq!(outcome.hits.len(), 1);
    }

    #[tokio::test]
    async fn fallback_matches_tags_case_insensitively() {
        let index = index_with(
            InMemoryStoreClient::without_rpc(),
            Arc::new(MockEmbedder::new()),
        );
        index
            .add(NewNote {
                title: Some("untagged in title".to_string()),
                content: "nothing relevant".to_string(),
                tags: vec!["ProJect-X".to_string()],
                ..Default::default()
            })
            .await
            .unwrap();
        let outcome = index
            .search("project-x", &SearchOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome.hits.len(), 1);
    }

    #[tokio::test]
    async fn fallback_respects_top_k() {
        let index = index_with(
            InMemoryStoreClient::without_rpc(),
            Arc::new(MockEmbedder::new()),
        );
        for i in 0..5 {
            let title = format!("shared term {i}");
            index
                .add(new_note(Some(title.as_str()), ""))
                .await
                .unwrap();
        }
        let outcome = index
            .search(
                "shared",
                &SearchOptions { top_k: 3, ..Default::default() },
            )
            .await
            .unwrap();
        assert_eq!(outcome.hits.len(), 3);
    }

    #[tokio::test]
    async fn fallback_filters_by_capsule() {
        let index = index_with(
            InMemoryStoreClient::without_rpc(),
            Arc::new(MockEmbedder::new()),
        );
        index
            .add(NewNote {
                capsule_id: Some("c1".to_string()),
                title: Some("match me".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        index
            .add(NewNote {
                capsule_id: Some("c2".to_string()),
                title: Some("match me too".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        let outcome = index
            .search(
                "match",
                &SearchOptions {
                    capsule_id: Some("c1".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(outcome.hits.len(), 1);
        assert_eq!(outcome.hits[0].note.capsule_id.as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn list_and_remove_round_trip() {
        let index = index_with(InMemoryStoreClient::new(), Arc::new(MockEmbedder::new()));
        let note = index
            .add(NewNote {
                capsule_id: Some("c1".to_string()),
                title: Some("keeper".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(index.list("c1").await.unwrap().len(), 1);
        index.remove(&note.id).await.unwrap();
        assert!(index.list("c1").await.unwrap().is_empty());
    }
}
