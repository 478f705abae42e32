//! Output JSON schema definitions for flow data.
//!
//! This module defines the structure of JSON files we write to disk.
//! Field names are camelCase so the flow viewer can consume the document as-is.
//! Schema is versioned to allow future evolution.

use crate::utils::error::GraphError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Kind of execution node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeType {
    Function,
    Trigger,
    BeforeUpdate,
    AfterUpdate,
    Dml,
}

impl NodeType {
    /// Header text shown on a node card
    pub fn display_label(self) -> &'static str {
        match self {
            NodeType::Function => "Function",
            NodeType::Trigger => "Trigger",
            NodeType::BeforeUpdate => "BeforeUpdate",
            NodeType::AfterUpdate => "AfterUpdate",
            NodeType::Dml => "DML",
        }
    }
}

/// Outcome of an execution node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeStatus {
    Success,
    Error,
    Warning,
    Start,
    End,
}

/// Per-node statistics (inclusive of descendants)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStats {
    /// SOQL queries executed
    pub soql: u64,

    /// Rows returned by those queries
    pub soql_rows: u64,

    /// Wall time between entry and exit, in milliseconds
    pub method_time: f64,

    /// Number of method invocations nested below this node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_method: Option<u64>,
}

/// A single node in the execution graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogNode {
    pub id: String,

    #[serde(rename = "type")]
    pub node_type: NodeType,

    pub status: NodeStatus,

    pub label: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    /// Most recent query executed directly by this node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soql_query: Option<String>,

    pub stats: NodeStats,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

/// Directed edge between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEdge {
    pub id: String,
    pub source: String,
    pub target: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Whole-run summary statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    /// Milliseconds between the first and last event
    pub total_time: f64,
    pub total_soql: u64,
    pub total_function_called: u64,
    pub total_records_fetched: u64,
    /// Number of entries that re-entered a signature already on the stack
    pub recursion_found: u64,
}

/// Nodes, edges and run stats of one parsed log
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogData {
    pub nodes: Vec<LogNode>,
    pub edges: Vec<LogEdge>,
    pub stats: RunStats,
}

impl LogData {
    /// Look up a node by id
    pub fn node(&self, id: &str) -> Option<&LogNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Nodes without a parent, in node order
    pub fn roots(&self) -> impl Iterator<Item = &LogNode> {
        self.nodes.iter().filter(|n| n.parent_id.is_none())
    }

    /// Direct children of `id`, in node order
    pub fn children<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a LogNode> + 'a {
        self.nodes
            .iter()
            .filter(move |n| n.parent_id.as_deref() == Some(id))
    }

    /// Verify the structural invariants and that the run totals agree with the nodes
    ///
    /// **Public** - used by the validate command and tests
    ///
    /// # Errors
    /// The first violated invariant, checked in this order:
    /// unique ids, parent references, acyclic parent chains, edge endpoints,
    /// aggregate sums.
    ///
    /// `totalTime` and `recursionFound` are not rederived: the first needs the
    /// raw log timestamps, the second the call stack at each entry.
    pub fn check_consistency(&self) -> Result<(), GraphError> {
        let mut ids: HashSet<&str> = HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if !ids.insert(node.id.as_str()) {
                return Err(GraphError::DuplicateNode(node.id.clone()));
            }
        }

        let parents: HashMap<&str, &str> = self
            .nodes
            .iter()
            .filter_map(|n| n.parent_id.as_deref().map(|p| (n.id.as_str(), p)))
            .collect();

        for (node, parent) in &parents {
            if !ids.contains(parent) {
                return Err(GraphError::MissingParent {
                    node: node.to_string(),
                    parent: parent.to_string(),
                });
            }
        }

        // Each node is walked once: a chain stops at the first finished node
        let mut visits: HashMap<&str, Visit> = HashMap::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let mut path = Vec::new();
            let mut current = Some(node.id.as_str());
            while let Some(id) = current {
                match visits.get(id) {
                    Some(Visit::Finished) => break,
                    Some(Visit::OnPath) => return Err(GraphError::Cycle(node.id.clone())),
                    None => {}
                }
                visits.insert(id, Visit::OnPath);
                path.push(id);
                current = parents.get(id).copied();
            }
            for id in path {
                visits.insert(id, Visit::Finished);
            }
        }

        for edge in &self.edges {
            for endpoint in [&edge.source, &edge.target] {
                if !ids.contains(endpoint.as_str()) {
                    return Err(GraphError::DanglingEdge {
                        edge: edge.id.clone(),
                        node: endpoint.clone(),
                    });
                }
            }
        }

        let root_soql: u64 = self.roots().map(|n| n.stats.soql).sum();
        let root_rows: u64 = self.roots().map(|n| n.stats.soql_rows).sum();
        let functions = self
            .nodes
            .iter()
            .filter(|n| n.node_type == NodeType::Function)
            .count() as u64;

        check_total("totalSoql", root_soql, self.stats.total_soql)?;
        check_total("totalRecordsFetched", root_rows, self.stats.total_records_fetched)?;
        check_total("totalFunctionCalled", functions, self.stats.total_function_called)?;

        Ok(())
    }
}

/// Cycle check state of a node
///
/// **Private** - internal state for check_consistency
enum Visit {
    OnPath,
    Finished,
}

fn check_total(field: &'static str, expected: u64, actual: u64) -> Result<(), GraphError> {
    if expected == actual {
        Ok(())
    } else {
        Err(GraphError::StatsMismatch {
            field,
            expected,
            actual,
        })
    }
}

/// Kind of nesting problem found while resolving frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IssueKind {
    /// An exit marker with no matching open frame
    UnmatchedExit,
    /// A frame that never saw its exit marker
    UnclosedFrame,
}

/// Non-fatal structural problem recorded in lenient mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralIssue {
    /// 1-based line number in the source log
    pub line: usize,
    pub kind: IssueKind,
    pub message: String,
}

/// Laid-out position of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePosition {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub level: usize,
}

/// Top-level document written to JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowDocument {
    /// Schema version for compatibility checking
    pub version: String,

    /// Name of the log the document was built from
    pub source: String,

    /// Timestamp when the document was generated
    pub generated_at: String,

    pub data: LogData,

    pub positions: Vec<NodePosition>,

    #[serde(default)]
    pub issues: Vec<StructuralIssue>,
}
