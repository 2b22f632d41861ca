//! Axum surface for the recall memory graph.

pub mod server;
