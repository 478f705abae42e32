//! Log parsing and schema definitions.
//!
//! This module handles:
//! - Lexing raw Apex debug log lines
//! - Resolving entry/exit markers into nested frames
//! - Attributing SOQL, DML and exceptions to frames
//! - Defining output schema

pub mod apex_log;
pub mod events;
pub mod lexer;
pub mod sample;
pub mod schema;

// Re-export main types
pub use apex_log::{classify, parse_log, parse_log_file, LogEvent, ParsedLog, ParserConfig};
pub use events::{EventKind, FrameKind};
pub use lexer::{lex, lex_line, LogLine};
pub use schema::{
    FlowDocument, IssueKind, LogData, LogEdge, LogNode, NodePosition, NodeStats, NodeStatus,
    NodeType, RunStats, StructuralIssue,
};
