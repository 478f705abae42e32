//! Aggregation of resolved frames into the execution graph and metrics.
//!
//! This module transforms parsed logs into:
//! - Nodes and edges with inclusive per-node statistics
//! - Run totals and recursion counts
//! - Slow-node and query hot-spot rankings

pub mod graph_builder;
pub mod metrics;

// Re-export main types and functions
pub use graph_builder::{build_graph, node_id, EdgeMode, GraphConfig};
pub use metrics::{rank_query_sources, rank_slowest, summarize_run};
