//! Hierarchical layout of the execution graph.
//!
//! Positions feed both the JSON document (for the interactive viewer)
//! and the static SVG diagram.

pub mod tree;

// Re-export main types
pub use tree::{compute_layout, LayoutConfig};
