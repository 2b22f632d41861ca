//! Alpha-cooled force simulation: link attraction, many-body repulsion,
//! centering.

use crate::merge::GraphState;
use std::collections::HashMap;

/// A node under simulation. View-model only; never persisted.
#[derive(Debug, Clone)]
pub struct SimNode {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    /// Pinned coordinates; while set, the node snaps here every tick.
    pub fx: Option<f64>,
    pub fy: Option<f64>,
}

impl SimNode {
    pub fn new(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            fx: None,
            fy: None,
        }
    }
}

/// A link under simulation.
#[derive(Debug, Clone)]
pub struct SimLink {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    /// Relevance weight; 1.0 when the underlying edge carries no score.
    pub weight: f64,
}

/// Visual stroke width for a link.
pub fn stroke_width(link: &SimLink) -> f64 {
    link.weight.sqrt()
}

/// Force coefficients. Defaults match the interactive tuning the
/// visualization ships with.
#[derive(Debug, Clone, Copy)]
pub struct ForceParams {
    /// Preferred link length.
    pub link_distance: f64,
    pub link_strength: f64,
    /// Many-body charge; negative repels.
    pub charge: f64,
    pub center_strength: f64,
    /// Fraction of velocity retained per tick.
    pub velocity_decay: f64,
    pub alpha_decay: f64,
    pub alpha_min: f64,
}

impl Default for ForceParams {
    fn default() -> Self {
        Self {
            link_distance: 150.0,
            link_strength: 0.08,
            charge: -300.0,
            center_strength: 0.03,
            velocity_decay: 0.6,
            alpha_decay: 0.0228,
            alpha_min: 0.001,
        }
    }
}

// Keeps the pairwise term finite when nodes overlap.
const SOFTENING: f64 = 100.0;

/// The one mutable holder of layout state.
///
/// `bind` swaps in a new node/link set (positions travel with the nodes),
/// `reheat` raises the energy for a warm restart, and `stop` is idempotent
/// teardown: once stopped, ticks do nothing until the owner is dropped.
pub struct ForceSimulation {
    nodes: Vec<SimNode>,
    links: Vec<SimLink>,
    index: HashMap<String, usize>,
    center: (f64, f64),
    alpha: f64,
    stopped: bool,
    params: ForceParams,
}

impl ForceSimulation {
    pub fn new(center: (f64, f64), params: ForceParams) -> Self {
        Self {
            nodes: Vec::new(),
            links: Vec::new(),
            index: HashMap::new(),
            center,
            alpha: 1.0,
            stopped: false,
            params,
        }
    }

    /// Replace the simulated sets. Links whose endpoints are missing from
    /// the node set are dropped.
    pub fn bind(&mut self, state: GraphState) {
        self.index = state
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
        self.links = state
            .links
            .into_iter()
            .filter(|l| self.index.contains_key(&l.source_id) && self.index.contains_key(&l.target_id))
            .collect();
        self.nodes = state.nodes;
    }

    /// Clone the current sets for a pure merge.
    pub fn snapshot(&self) -> GraphState {
        GraphState {
            nodes: self.nodes.clone(),
            links: self.links.clone(),
        }
    }

    pub fn nodes(&self) -> &[SimNode] {
        &self.nodes
    }

    pub fn links(&self) -> &[SimLink] {
        &self.links
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Warm restart: raise energy without discarding the current layout.
    pub fn reheat(&mut self, alpha: f64) {
        if !self.stopped {
            self.alpha = self.alpha.max(alpha.clamp(0.0, 1.0));
        }
    }

    /// Idempotent teardown of the physics loop.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn stopped(&self) -> bool {
        self.stopped
    }

    pub fn pin(&mut self, id: &str, x: f64, y: f64) -> bool {
        match self.index.get(id).copied() {
            Some(i) => {
                let node = &mut self.nodes[i];
                node.fx = Some(x);
                node.fy = Some(y);
                node.x = x;
                node.y = y;
                node.vx = 0.0;
                node.vy = 0.0;
                true
            }
            None => false,
        }
    }

    pub fn unpin(&mut self, id: &str) {
        if let Some(i) = self.index.get(id).copied() {
            self.nodes[i].fx = None;
            self.nodes[i].fy = None;
        }
    }

    /// Advance one step. Returns `false` when stopped, empty, or settled
    /// below `alpha_min`.
    pub fn tick(&mut self) -> bool {
        if self.stopped || self.nodes.is_empty() || self.alpha < self.params.alpha_min {
            return false;
        }
        self.alpha += (0.0 - self.alpha) * self.params.alpha_decay;
        let alpha = self.alpha;
        let n = self.nodes.len();

        // Link attraction toward the preferred distance.
        for link in &self.links {
            let (Some(&s), Some(&t)) = (
                self.index.get(&link.source_id),
                self.index.get(&link.target_id),
            ) else {
                continue;
            };
            if s == t {
                continue;
            }
            let dx = self.nodes[t].x - self.nodes[s].x;
            let dy = self.nodes[t].y - self.nodes[s].y;
            let dist = (dx * dx + dy * dy).sqrt().max(1e-6);
            let displacement = (dist - self.params.link_distance) / dist
                * self.params.link_strength
                * alpha;
            let (fx, fy) = (dx * displacement * 0.5, dy * displacement * 0.5);
            self.nodes[s].vx += fx;
            self.nodes[s].vy += fy;
            self.nodes[t].vx -= fx;
            self.nodes[t].vy -= fy;
        }

        // Pairwise many-body force with softening.
        for i in 0..n {
            for j in (i + 1)..n {
                let dx = self.nodes[i].x - self.nodes[j].x;
                let dy = self.nodes[i].y - self.nodes[j].y;
                let dist_sq = dx * dx + dy * dy;
                let (ux, uy) = if dist_sq > 1e-8 {
                    let dist = dist_sq.sqrt();
                    (dx / dist, dy / dist)
                } else {
                    // Coincident nodes: deterministic separation angle.
                    let angle = (i as f64 * 0.618_034 + j as f64 * 0.414_214)
                        * std::f64::consts::TAU;
                    (angle.cos(), angle.sin())
                };
                let magnitude = -self.params.charge * alpha / (dist_sq + SOFTENING);
                self.nodes[i].vx += ux * magnitude;
                self.nodes[i].vy += uy * magnitude;
                self.nodes[j].vx -= ux * magnitude;
                self.nodes[j].vy -= uy * magnitude;
            }
        }

        // Centering.
        for node in &mut self.nodes {
            node.vx -= (node.x - self.center.0) * self.params.center_strength * alpha;
            node.vy -= (node.y - self.center.1) * self.params.center_strength * alpha;
        }

        // Integrate; pinned nodes snap to their pin.
        for node in &mut self.nodes {
            node.vx *= self.params.velocity_decay;
            node.vy *= self.params.velocity_decay;
            match (node.fx, node.fy) {
                (Some(fx), Some(fy)) => {
                    node.x = fx;
                    node.y = fy;
                    node.vx = 0.0;
                    node.vy = 0.0;
                }
                _ => {
                    node.x += node.vx;
                    node.y += node.vy;
                }
            }
        }
        true
    }
}
