//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Errors that can occur during log parsing
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Log contains no event lines")]
    EmptyLog,

    #[error("Structural error at line {line}: {message}")]
    Structure { line: usize, message: String },

    #[error("Failed to read log: {0}")]
    Io(#[from] std::io::Error),
}

/// Violations of the flow graph invariants
#[derive(Error, Debug, PartialEq)]
pub enum GraphError {
    #[error("Duplicate node id: {0}")]
    DuplicateNode(String),

    #[error("Node {node} references missing parent {parent}")]
    MissingParent { node: String, parent: String },

    #[error("Parent chain of node {0} contains a cycle")]
    Cycle(String),

    #[error("Edge {edge} references missing node {node}")]
    DanglingEdge { edge: String, node: String },

    #[error("Aggregate {field} is {actual}, derived value is {expected}")]
    StatsMismatch {
        field: &'static str,
        expected: u64,
        actual: u64,
    },
}

/// Errors that can occur during layout
#[derive(Error, Debug, PartialEq)]
pub enum LayoutError {
    #[error("Node {node} references missing parent {parent}")]
    DanglingParent { node: String, parent: String },

    #[error("{0} node(s) are not reachable from any root")]
    Unreachable(usize),
}

/// Errors that can occur during diagram generation
#[derive(Error, Debug)]
pub enum DiagramError {
    #[error("Empty graph")]
    EmptyGraph,

    #[error("No position computed for node {0}")]
    MissingPosition(String),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
