//! Bounded breadth-first context resolution over the memory graph.

use async_trait::async_trait;
use recall_store::MemoryStore;
use recall_types::{ContextLoader, EngineError, GraphContext, MemoryLink, NewLink};
use std::collections::HashSet;
use std::sync::Arc;

/// Resolves the neighborhood of a focal note with a bounded BFS.
///
/// Round-trips are bounded by `O(depth)`: each round issues one batched edge
/// query for the whole frontier (source side and target side in parallel),
/// and the neighbor fetch at the end is a single in-set query. The
/// visited/frontier split guarantees termination on cyclic graphs.
pub struct ContextResolver {
    store: Arc<MemoryStore>,
}

impl ContextResolver {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    /// Assemble the neighborhood of `node_id`.
    ///
    /// At least one expansion round always runs: `depth = 0` behaves like
    /// `depth = 1`. This is intentional, matching the query surface callers
    /// already rely on, rather than an error.
    pub async fn get_context(
        &self,
        node_id: &str,
        depth: usize,
    ) -> Result<GraphContext, EngineError> {
        let node = self
            .store
            .note_by_id(node_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("note {node_id}")))?;

        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(node_id.to_string());
        let mut frontier: Vec<String> = vec![node_id.to_string()];

        let mut edges: Vec<MemoryLink> = Vec::new();
        let mut seen_edges: HashSet<String> = HashSet::new();

        for _ in 0..depth.max(1) {
            if frontier.is_empty() {
                break;
            }
            let batch = self.store.links_touching(&frontier).await?;

            let mut next: Vec<String> = Vec::new();
            for link in batch {
                for endpoint in [&link.source_id, &link.target_id] {
                    if visited.insert(endpoint.clone()) {
                        next.push(endpoint.clone());
                    }
                }
                // First-seen wins: an edge touching both sides of the
                // frontier comes back from both queries.
                if seen_edges.insert(link.id.clone()) {
                    edges.push(link);
                }
            }
            frontier = next;
        }

        let neighbor_ids: Vec<String> = visited
            .iter()
            .filter(|id| id.as_str() != node_id)
            .cloned()
            .collect();
        let mut neighbors = self.store.notes_by_ids(&neighbor_ids).await?;
        neighbors.sort_by(|a, b| a.id.cmp(&b.id));

        Ok(GraphContext {
            node,
            edges,
            neighbors,
        })
    }

    /// Create a directed link between two existing notes.
    pub async fn link(&self, new: NewLink) -> Result<MemoryLink, EngineError> {
        if new.source_id.trim().is_empty() || new.target_id.trim().is_empty() {
            return Err(EngineError::Validation(
                "link requires source_id and target_id".to_string(),
            ));
        }
        let link = MemoryLink {
            id: String::new(),
            source_id: new.source_id,
            target_id: new.target_id,
            reason: new.reason,
            score: new.score,
        };
        Ok(self.store.create_link(&link).await?)
    }
}

#[async_trait]
impl ContextLoader for ContextResolver {
    async fn load_context(
        &self,
        root_id: &str,
        depth: usize,
    ) -> Result<GraphContext, EngineError> {
        self.get_context(root_id, depth).await
    }
}
