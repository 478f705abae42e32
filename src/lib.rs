//! Apex Flow Studio
//!
//! Execution flow graphs from Salesforce Apex debug logs.
//!
//! This crate provides the core implementation for the
//! `apex-flow` CLI tool: log parsing, graph and stats building,
//! tree layout and diagram rendering.
//!
//! ## Getting Started
//!
//! Most users should install and use the CLI:
//!
//! ```bash
//! cargo install apex-flow-studio
//! apex-flow parse --input debug.log --diagram flow.svg --summary
//! ```
//!
//! Library users go through the same pipeline:
//!
//! ```ignore
//! use apex_flow_studio::aggregator::{build_graph, GraphConfig};
//! use apex_flow_studio::layout::{compute_layout, LayoutConfig};
//! use apex_flow_studio::parser::{parse_log, ParserConfig};
//!
//! let parsed = parse_log(&text, &ParserConfig::default())?;
//! let data = build_graph(&parsed, &GraphConfig::default());
//! let positions = compute_layout(&data, &LayoutConfig::default())?;
//! ```

pub mod aggregator;
pub mod commands;
pub mod diagram;
pub mod layout;
pub mod output;
pub mod parser;
pub mod utils;
