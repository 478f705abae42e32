//! Build the execution graph from resolved frames.
//!
//! One node per frame, in entry order. Node statistics are inclusive:
//! a parent's SOQL count, rows and method count fold in every descendant.
//!
//! Example: a trigger whose two methods each run one query reports `soql: 2`,
//! and each method reports `soql: 1`.

use super::metrics::summarize_run;
use crate::parser::{LogData, LogEdge, LogEvent, LogNode, NodeStats, NodeStatus, NodeType, ParsedLog};
use crate::utils::config::NANOS_PER_MILLI;
use log::debug;

/// How edges between nodes are generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeMode {
    /// Chain through the nodes in execution order
    #[default]
    Sequence,
    /// One edge from each parent to each of its children
    Call,
}

impl std::str::FromStr for EdgeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sequence" | "seq" => Ok(Self::Sequence),
            "call" | "calls" => Ok(Self::Call),
            other => Err(format!(
                "unknown edge mode '{}' (expected 'sequence' or 'call')",
                other
            )),
        }
    }
}

/// Graph builder configuration
#[derive(Debug, Clone, Default)]
pub struct GraphConfig {
    pub edge_mode: EdgeMode,
}

impl GraphConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_edge_mode(mut self, edge_mode: EdgeMode) -> Self {
        self.edge_mode = edge_mode;
        self
    }
}

/// Build nodes, edges and run stats from a parsed log
///
/// **Public** - main entry point for graph building
///
/// # Arguments
/// * `parsed` - Resolved frames from the parser
/// * `config` - Edge generation settings
///
/// # Returns
/// Graph data satisfying `LogData::check_consistency`
///
/// # Algorithm
/// 1. Fold SOQL, rows and method counts from children into parents
/// 2. Emit one node per frame with its status and details
/// 3. Emit edges per the configured mode
pub fn build_graph(parsed: &ParsedLog, config: &GraphConfig) -> LogData {
    let events = &parsed.events;
    debug!("Building graph from {} frames", events.len());

    let mut soql: Vec<u64> = events.iter().map(|e| e.soql_count).collect();
    let mut rows: Vec<u64> = events.iter().map(|e| e.soql_rows).collect();
    let mut methods: Vec<u64> = vec![0; events.len()];

    // Children always follow their parent in entry order
    for index in (0..events.len()).rev() {
        if let Some(parent) = events[index].parent {
            soql[parent] += soql[index];
            rows[parent] += rows[index];
            let is_function = u64::from(events[index].node_type == NodeType::Function);
            methods[parent] += methods[index] + is_function;
        }
    }

    let nodes: Vec<LogNode> = events
        .iter()
        .enumerate()
        .map(|(index, event)| LogNode {
            id: node_id(index),
            node_type: event.node_type,
            status: node_status(event),
            label: event.label.clone(),
            details: node_details(event),
            soql_query: event.last_query.clone(),
            stats: NodeStats {
                soql: soql[index],
                soql_rows: rows[index],
                method_time: nanos_to_millis(event.duration_ns()),
                total_method: Some(methods[index]).filter(|&m| m > 0),
            },
            parent_id: event.parent.map(node_id),
        })
        .collect();

    let edges = match config.edge_mode {
        EdgeMode::Sequence => sequence_edges(events.len()),
        EdgeMode::Call => call_edges(events),
    };

    let recursion_found = events.iter().filter(|e| e.recursion > 0).count() as u64;
    let stats = summarize_run(&nodes, parsed.total_ns(), recursion_found);

    debug!(
        "Built graph: {} nodes, {} edges, {} recursive entries",
        nodes.len(),
        edges.len(),
        recursion_found
    );

    LogData {
        nodes,
        edges,
        stats,
    }
}

/// Stable node id for a frame index (`node-1` is the first frame)
pub fn node_id(index: usize) -> String {
    format!("node-{}", index + 1)
}

/// Convert nanoseconds to milliseconds rounded to 3 decimals
pub fn nanos_to_millis(nanos: u64) -> f64 {
    (nanos as f64 / NANOS_PER_MILLI * 1000.0).round() / 1000.0
}

/// **Private** - internal helper for build_graph
fn node_status(event: &LogEvent) -> NodeStatus {
    if event.errored {
        NodeStatus::Error
    } else if !event.closed || event.recursion > 0 {
        NodeStatus::Warning
    } else {
        NodeStatus::Success
    }
}

/// **Private** - internal helper for build_graph
fn node_details(event: &LogEvent) -> Option<String> {
    let mut details = event.details.clone();
    if event.recursion > 0 {
        details.push(format!("Recursive entry (depth {})", event.recursion));
    }
    if !event.closed {
        details.push("Exit not found in log".to_string());
    }

    if details.is_empty() {
        None
    } else {
        Some(details.join("\n"))
    }
}

/// **Private** - edges for EdgeMode::Sequence
fn sequence_edges(count: usize) -> Vec<LogEdge> {
    (1..count)
        .map(|target| edge(target - 1, target, None))
        .collect()
}

/// **Private** - edges for EdgeMode::Call
fn call_edges(events: &[LogEvent]) -> Vec<LogEdge> {
    let mut sibling_counts = vec![0usize; events.len()];
    events
        .iter()
        .enumerate()
        .filter_map(|(index, event)| {
            let parent = event.parent?;
            sibling_counts[parent] += 1;
            Some(edge(parent, index, Some(format!("#{}", sibling_counts[parent]))))
        })
        .collect()
}

/// **Private** - edge constructor
fn edge(source: usize, target: usize, label: Option<String>) -> LogEdge {
    LogEdge {
        id: format!("edge-{}-{}", source + 1, target + 1),
        source: node_id(source),
        target: node_id(target),
        label,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_log, ParserConfig};
    use pretty_assertions::assert_eq;

    fn graph(log: &str, mode: EdgeMode) -> LogData {
        let parsed = parse_log(log, &ParserConfig::default()).unwrap();
        build_graph(&parsed, &GraphConfig::new().with_edge_mode(mode))
    }

    const NESTED: &str = "\
12:00:00.0 (0)|CODE_UNIT_STARTED|[EXTERNAL]|TRIGGERS
12:00:00.0 (1000000)|METHOD_ENTRY|[1]|01p|A.run()
12:00:00.0 (1500000)|SOQL_EXECUTE_BEGIN|[2]|Aggregations:0|SELECT Id FROM Lead
12:00:00.0 (1600000)|SOQL_EXECUTE_END|[2]|Rows:4
12:00:00.0 (2000000)|METHOD_EXIT|[1]|01p|A.run()
12:00:00.0 (2500000)|METHOD_ENTRY|[3]|01p|B.run()
12:00:00.0 (2600000)|SOQL_EXECUTE_BEGIN|[4]|Aggregations:0|SELECT Id FROM Task
12:00:00.0 (2700000)|SOQL_EXECUTE_END|[4]|Rows:1
12:00:00.0 (3000000)|METHOD_EXIT|[3]|01p|B.run()
12:00:00.0 (4000000)|CODE_UNIT_FINISHED|TRIGGERS
";

    #[test]
    fn test_inclusive_stats_fold_into_parent() {
        let data = graph(NESTED, EdgeMode::Sequence);

        let root = &data.nodes[0];
        assert_eq!(root.stats.soql, 2);
        assert_eq!(root.stats.soql_rows, 5);
        assert_eq!(root.stats.total_method, Some(2));
        assert_eq!(root.stats.method_time, 4.0);

        assert_eq!(data.nodes[1].stats.soql, 1);
        assert_eq!(data.nodes[1].stats.total_method, None);
        assert_eq!(data.nodes[1].soql_query.as_deref(), Some("SELECT Id FROM Lead"));
        assert_eq!(data.nodes[2].parent_id.as_deref(), Some("node-1"));

        assert_eq!(data.stats.total_soql, 2);
        assert_eq!(data.stats.total_records_fetched, 5);
        assert_eq!(data.stats.total_function_called, 3);
        assert_eq!(data.stats.total_time, 4.0);
        assert_eq!(data.check_consistency(), Ok(()));
    }

    #[test]
    fn test_sequence_edges_follow_entry_order() {
        let data = graph(NESTED, EdgeMode::Sequence);
        let ids: Vec<&str> = data.edges.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["edge-1-2", "edge-2-3"]);
    }

    #[test]
    fn test_call_edges_label_sibling_order() {
        let data = graph(NESTED, EdgeMode::Call);

        assert_eq!(data.edges.len(), 2);
        assert_eq!(data.edges[0].source, "node-1");
        assert_eq!(data.edges[0].target, "node-2");
        assert_eq!(data.edges[0].label.as_deref(), Some("#1"));
        assert_eq!(data.edges[1].label.as_deref(), Some("#2"));
    }

    #[test]
    fn test_nested_recursion_detected() {
        let log = "\
12:00:00.0 (1)|METHOD_ENTRY|[1]|01p|Walker.visit()
12:00:00.0 (2)|METHOD_ENTRY|[2]|01p|Walker.visit()
12:00:00.0 (3)|METHOD_ENTRY|[2]|01p|Walker.visit()
12:00:00.0 (4)|METHOD_EXIT|[2]|01p|Walker.visit()
12:00:00.0 (5)|METHOD_EXIT|[2]|01p|Walker.visit()
12:00:00.0 (6)|METHOD_EXIT|[1]|01p|Walker.visit()
";
        let data = graph(log, EdgeMode::Sequence);

        assert_eq!(data.stats.recursion_found, 2);
        assert_eq!(data.nodes[0].status, NodeStatus::Success);
        assert_eq!(data.nodes[1].status, NodeStatus::Warning);
        assert_eq!(data.nodes[2].details.as_deref(), Some("Recursive entry (depth 2)"));
    }

    #[test]
    fn test_sequential_repeats_are_not_recursion() {
        let log = "\
12:00:00.0 (1)|METHOD_ENTRY|[1]|01p|Walker.visit()
12:00:00.0 (2)|METHOD_EXIT|[1]|01p|Walker.visit()
12:00:00.0 (3)|METHOD_ENTRY|[1]|01p|Walker.visit()
12:00:00.0 (4)|METHOD_EXIT|[1]|01p|Walker.visit()
";
        let data = graph(log, EdgeMode::Sequence);
        assert_eq!(data.stats.recursion_found, 0);
        assert!(data.nodes.iter().all(|n| n.status == NodeStatus::Success));
    }

    #[test]
    fn test_unclosed_frame_is_warning() {
        let log = "12:00:00.0 (1)|METHOD_ENTRY|[1]|01p|A.run()\n";
        let data = graph(log, EdgeMode::Sequence);

        assert_eq!(data.nodes[0].status, NodeStatus::Warning);
        assert_eq!(data.nodes[0].details.as_deref(), Some("Exit not found in log"));
    }

    #[test]
    fn test_edge_mode_from_str() {
        assert_eq!("sequence".parse::<EdgeMode>(), Ok(EdgeMode::Sequence));
        assert_eq!("Call".parse::<EdgeMode>(), Ok(EdgeMode::Call));
        assert!("tree".parse::<EdgeMode>().is_err());
    }

    #[test]
    fn test_nanos_to_millis_rounds() {
        assert_eq!(nanos_to_millis(1_234_567), 1.235);
        assert_eq!(nanos_to_millis(0), 0.0);
    }
}
