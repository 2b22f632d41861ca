//! Pure merge of a fetched neighborhood into the layout's node/link sets.

use crate::sim::{SimLink, SimNode};
use recall_types::GraphContext;
use std::collections::HashSet;

/// Radius of the ring new nodes are seeded on, around the expansion origin.
const SEED_RADIUS: f64 = 75.0;
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// An immutable snapshot of the simulated sets.
#[derive(Debug, Clone, Default)]
pub struct GraphState {
    pub nodes: Vec<SimNode>,
    pub links: Vec<SimLink>,
}

/// What a merge changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub added_nodes: usize,
    pub added_links: usize,
}

impl MergeStats {
    /// True when the merge changed nothing and the simulation can be left
    /// undisturbed.
    pub fn is_noop(&self) -> bool {
        self.added_nodes == 0 && self.added_links == 0
    }
}

/// Merge `ctx` into `state`, returning the new state and what changed.
///
/// Additive and idempotent: entries already present are never replaced, so
/// merging the same context twice is a no-op. New nodes are seeded on a
/// deterministic ring around `origin`; the focal node itself, when new,
/// lands exactly on `origin`. Links whose endpoints are absent from the
/// merged node set (for example edges to a deleted note) are skipped.
pub fn merge_context(
    state: &GraphState,
    ctx: &GraphContext,
    origin: (f64, f64),
) -> (GraphState, MergeStats) {
    let mut next = state.clone();
    let mut stats = MergeStats::default();

    let mut node_ids: HashSet<String> = next.nodes.iter().map(|n| n.id.clone()).collect();
    if node_ids.insert(ctx.node.id.clone()) {
        next.nodes
            .push(SimNode::new(ctx.node.id.clone(), origin.0, origin.1));
        stats.added_nodes += 1;
    }
    for (i, neighbor) in ctx.neighbors.iter().enumerate() {
        if node_ids.insert(neighbor.id.clone()) {
            let angle = i as f64 * GOLDEN_ANGLE;
            next.nodes.push(SimNode::new(
                neighbor.id.clone(),
                origin.0 + SEED_RADIUS * angle.cos(),
                origin.1 + SEED_RADIUS * angle.sin(),
            ));
            stats.added_nodes += 1;
        }
    }

    let mut link_ids: HashSet<String> = next.links.iter().map(|l| l.id.clone()).collect();
    for edge in &ctx.edges {
        if !node_ids.contains(&edge.source_id) || !node_ids.contains(&edge.target_id) {
            continue;
        }
        if link_ids.insert(edge.id.clone()) {
            next.links.push(SimLink {
                id: edge.id.clone(),
                source_id: edge.source_id.clone(),
                target_id: edge.target_id.clone(),
                weight: edge.score.unwrap_or(1.0),
            });
            stats.added_links += 1;
        }
    }

    (next, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use recall_types::{MemoryLink, MemoryNote};

    fn note(id: &str) -> MemoryNote {
        MemoryNote {
            id: id.to_string(),
            capsule_id: None,
            user_id: None,
            title: id.to_string(),
            content: String::new(),
            summary: None,
            tags: Vec::new(),
            attachments: Vec::new(),
            created_at: Utc::now(),
            embedding: None,
        }
    }

    fn link(id: &str, source: &str, target: &str, score: Option<f64>) -> MemoryLink {
        MemoryLink {
            id: id.to_string(),
            source_id: source.to_string(),
            target_id: target.to_string(),
            reason: None,
            score,
        }
    }

    fn ctx_ab() -> GraphContext {
        GraphContext {
            node: note("a"),
            edges: vec![link("e1", "a", "b", None)],
            neighbors: vec![note("b")],
        }
    }

    #[test]
    fn merge_into_empty_seeds_focal_at_origin() {
        let (state, stats) = merge_context(&GraphState::default(), &ctx_ab(), (10.0, 20.0));
        assert_eq!(stats.added_nodes, 2);
        assert_eq!(stats.added_links, 1);
        let focal = state.nodes.iter().find(|n| n.id == "a").unwrap();
        assert_eq!((focal.x, focal.y), (10.0, 20.0));
    }

    #[test]
    fn merging_the_same_context_twice_is_a_noop() {
        let (state, _) = merge_context(&GraphState::default(), &ctx_ab(), (0.0, 0.0));
        let (again, stats) = merge_context(&state, &ctx_ab(), (0.0, 0.0));
        assert!(stats.is_noop());
        assert_eq!(again.nodes.len(), state.nodes.len());
        assert_eq!(again.links.len(), state.links.len());
    }

    #[test]
    fn existing_nodes_keep_their_positions() {
        let (mut state, _) = merge_context(&GraphState::default(), &ctx_ab(), (0.0, 0.0));
        state.nodes[0].x = 500.0;
        let bigger = GraphContext {
            node: note("a"),
            edges: vec![link("e1", "a", "b", None), link("e2", "a", "c", None)],
            neighbors: vec![note("b"), note("c")],
        };
        let (next, stats) = merge_context(&state, &bigger, (0.0, 0.0));
        assert_eq!(stats.added_nodes, 1);
        assert_eq!(stats.added_links, 1);
        let a = next.nodes.iter().find(|n| n.id == "a").unwrap();
        assert_eq!(a.x, 500.0);
    }

    #[test]
    fn edges_to_absent_nodes_are_skipped() {
        let ctx = GraphContext {
            node: note("a"),
            // "ghost" was deleted: it appears in an edge but not in
            // neighbors.
            edges: vec![link("e1", "a", "ghost", None)],
            neighbors: vec![],
        };
        let (state, stats) = merge_context(&GraphState::default(), &ctx, (0.0, 0.0));
        assert_eq!(stats.added_links, 0);
        assert!(state.links.is_empty());
    }

    #[test]
    fn link_weight_defaults_to_one() {
        let (state, _) = merge_context(&GraphState::default(), &ctx_ab(), (0.0, 0.0));
        assert_eq!(state.links[0].weight, 1.0);
        let weighted = GraphContext {
            node: note("a"),
            edges: vec![link("e9", "a", "b", Some(4.0))],
            neighbors: vec![note("b")],
        };
        let (state, _) = merge_context(&state, &weighted, (0.0, 0.0));
        assert_eq!(state.links[1].weight, 4.0);
    }
}
