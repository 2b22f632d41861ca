//! The layout engine: initialization, click-to-expand, dragging, and
//! zoom-to-fit over one owned simulation.

use crate::merge::{merge_context, MergeStats};
use crate::sim::{ForceParams, ForceSimulation};
use recall_types::{ContextLoader, EngineError};
use std::collections::HashSet;
use std::sync::Arc;

/// Render surface dimensions, provided by the host.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// Scale/translate pair framing the graph in the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub k: f64,
    pub x: f64,
    pub y: f64,
}

const FIT_RATIO: f64 = 0.85;
const NODE_MARGIN: f64 = 24.0;
/// Energy for warm restarts after an expansion or a drag.
const RESTART_ALPHA: f64 = 0.3;

/// One visualization session: owns the simulation exclusively, fetches
/// neighborhoods through an injected [`ContextLoader`], and grows the graph
/// additively as nodes are expanded.
pub struct GraphLayout {
    loader: Arc<dyn ContextLoader>,
    sim: ForceSimulation,
    viewport: Viewport,
    root_id: Option<String>,
    active_drags: HashSet<String>,
}

impl GraphLayout {
    pub fn new(loader: Arc<dyn ContextLoader>, width: f64, height: f64) -> Self {
        let viewport = Viewport { width, height };
        Self {
            loader,
            sim: ForceSimulation::new((width / 2.0, height / 2.0), ForceParams::default()),
            viewport,
            root_id: None,
            active_drags: HashSet::new(),
        }
    }

    fn center(&self) -> (f64, f64) {
        (self.viewport.width / 2.0, self.viewport.height / 2.0)
    }

    /// Load the initial neighborhood and seed the simulation, pinning the
    /// root to the viewport center.
    ///
    /// A failed fetch surfaces to the caller; the engine never starts
    /// simulating an empty graph. A fetch resolving after [`stop`] is
    /// discarded.
    ///
    /// [`stop`]: GraphLayout::stop
    pub async fn init(&mut self, root_id: &str, depth: usize) -> Result<(), EngineError> {
        let ctx = self.loader.load_context(root_id, depth).await?;
        if self.sim.stopped() {
            return Ok(());
        }
        let center = self.center();
        let (state, _) = merge_context(&self.sim.snapshot(), &ctx, center);
        self.sim.bind(state);
        self.sim.pin(root_id, center.0, center.1);
        self.root_id = Some(root_id.to_string());
        Ok(())
    }

    /// Expand the neighborhood of a clicked node at depth 1.
    ///
    /// Additive and idempotent: re-expanding an already-expanded node merges
    /// nothing and leaves the simulation undisturbed. A failed fetch is
    /// non-fatal; the existing graph stays interactive and a later click
    /// retries.
    pub async fn expand(&mut self, node_id: &str) -> MergeStats {
        let origin = self
            .sim
            .nodes()
            .iter()
            .find(|n| n.id == node_id)
            .map(|n| (n.x, n.y))
            .unwrap_or_else(|| self.center());
        let ctx = match self.loader.load_context(node_id, 1).await {
            Ok(ctx) => ctx,
            Err(e) => {
                tracing::warn!(error = %e, node_id, "expansion fetch failed");
                return MergeStats::default();
            }
        };
        if self.sim.stopped() {
            return MergeStats::default();
        }
        let (state, stats) = merge_context(&self.sim.snapshot(), &ctx, origin);
        if stats.is_noop() {
            return stats;
        }
        self.sim.bind(state);
        self.sim.reheat(RESTART_ALPHA);
        stats
    }

    /// Advance the physics one step.
    pub fn tick(&mut self) -> bool {
        self.sim.tick()
    }

    /// Begin dragging a node; returns `false` if the node is unknown or a
    /// drag on it is already in flight.
    pub fn drag_start(&mut self, node_id: &str, x: f64, y: f64) -> bool {
        if self.active_drags.contains(node_id) {
            return false;
        }
        if !self.sim.pin(node_id, x, y) {
            return false;
        }
        self.active_drags.insert(node_id.to_string());
        self.sim.reheat(RESTART_ALPHA);
        true
    }

    pub fn drag_move(&mut self, node_id: &str, x: f64, y: f64) {
        if self.active_drags.contains(node_id) {
            self.sim.pin(node_id, x, y);
        }
    }

    /// Release a drag. The node is unpinned unless it is the root, which
    /// stays pinned permanently.
    pub fn drag_end(&mut self, node_id: &str) {
        if !self.active_drags.remove(node_id) {
            return;
        }
        if self.root_id.as_deref() != Some(node_id) {
            self.sim.unpin(node_id);
        }
    }

    /// Compute the transform that frames every node at [`FIT_RATIO`] of the
    /// viewport. `None` until the graph has nodes.
    pub fn zoom_to_fit(&self) -> Option<Transform> {
        let nodes = self.sim.nodes();
        if nodes.is_empty() {
            return None;
        }
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for node in nodes {
            min_x = min_x.min(node.x);
            min_y = min_y.min(node.y);
            max_x = max_x.max(node.x);
            max_y = max_y.max(node.y);
        }
        min_x -= NODE_MARGIN;
        min_y -= NODE_MARGIN;
        max_x += NODE_MARGIN;
        max_y += NODE_MARGIN;

        let width = max_x - min_x;
        let height = max_y - min_y;
        let k = (self.viewport.width / width).min(self.viewport.height / height) * FIT_RATIO;
        let cx = (min_x + max_x) / 2.0;
        let cy = (min_y + max_y) / 2.0;
        Some(Transform {
            k,
            x: self.viewport.width / 2.0 - k * cx,
            y: self.viewport.height / 2.0 - k * cy,
        })
    }

    /// Tear down the physics loop. Idempotent; guaranteed safe to call on
    /// unmount regardless of in-flight fetches.
    pub fn stop(&mut self) {
        self.sim.stop();
    }

    pub fn node_count(&self) -> usize {
        self.sim.nodes().len()
    }

    pub fn link_count(&self) -> usize {
        self.sim.links().len()
    }

    pub fn simulation(&self) -> &ForceSimulation {
        &self.sim
    }
}
