//! Static rendering of the execution flow.
//!
//! This module converts a laid-out graph into an SVG diagram and a
//! terminal summary.

pub mod generator;

// Re-export main types
pub use generator::{generate_diagram, generate_text_summary, status_color, DiagramConfig};
