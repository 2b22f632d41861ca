//! Incremental force-directed layout for the memory graph.
//!
//! One [`GraphLayout`] instance owns one running [`ForceSimulation`]. The
//! node/link sets grow additively as the user expands nodes; merging is a
//! pure reducer over an immutable snapshot, and the simulation is the only
//! holder of mutable layout state.

mod engine;
mod merge;
mod sim;

pub use engine::{GraphLayout, Transform, Viewport};
pub use merge::{merge_context, GraphState, MergeStats};
pub use sim::{stroke_width, ForceParams, ForceSimulation, SimLink, SimNode};
