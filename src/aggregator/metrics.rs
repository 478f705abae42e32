//! Run-level statistics and node rankings.
//!
//! Slow nodes and query-heavy nodes are the primary targets when
//! tuning a transaction against platform limits.

use super::graph_builder::nanos_to_millis;
use crate::parser::{LogData, LogNode, NodeType, RunStats};
use log::debug;
use std::collections::HashMap;

/// Derive the run summary from inclusive node stats
///
/// **Public** - used by the graph builder
///
/// # Arguments
/// * `nodes` - Graph nodes with inclusive stats
/// * `total_ns` - Nanoseconds between the first and last log event
/// * `recursion_found` - Number of recursive entries
///
/// # Returns
/// Totals that agree with `LogData::check_consistency`
pub fn summarize_run(nodes: &[LogNode], total_ns: u64, recursion_found: u64) -> RunStats {
    let roots = || nodes.iter().filter(|n| n.parent_id.is_none());

    RunStats {
        total_time: nanos_to_millis(total_ns),
        total_soql: roots().map(|n| n.stats.soql).sum(),
        total_function_called: nodes
            .iter()
            .filter(|n| n.node_type == NodeType::Function)
            .count() as u64,
        total_records_fetched: roots().map(|n| n.stats.soql_rows).sum(),
        recursion_found,
    }
}

/// Nodes ordered by method time, slowest first
///
/// **Public** - hot-node listing for summaries
///
/// Ties keep node order.
pub fn rank_slowest(data: &LogData, top_n: usize) -> Vec<&LogNode> {
    debug!("Ranking top {} of {} nodes by time", top_n, data.nodes.len());

    let mut ranked: Vec<&LogNode> = data.nodes.iter().collect();
    ranked.sort_by(|a, b| b.stats.method_time.total_cmp(&a.stats.method_time));
    ranked.truncate(top_n);
    ranked
}

/// Nodes that issue queries themselves, most queries first
///
/// **Public** - query hot spots for summaries
///
/// Uses exclusive counts (node minus children) so a trigger
/// does not outrank the method that actually runs the query.
pub fn rank_query_sources(data: &LogData, top_n: usize) -> Vec<(&LogNode, u64)> {
    let mut child_soql: HashMap<&str, u64> = HashMap::new();
    for node in &data.nodes {
        if let Some(parent) = node.parent_id.as_deref() {
            *child_soql.entry(parent).or_insert(0) += node.stats.soql;
        }
    }

    let mut sources: Vec<(&LogNode, u64)> = data
        .nodes
        .iter()
        .map(|node| {
            let children = child_soql.get(node.id.as_str()).copied().unwrap_or(0);
            (node, node.stats.soql.saturating_sub(children))
        })
        .filter(|(_, own)| *own > 0)
        .collect();

    sources.sort_by(|a, b| b.1.cmp(&a.1));
    sources.truncate(top_n);
    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{NodeStats, NodeStatus};

    fn node(id: &str, parent: Option<&str>, soql: u64, time: f64) -> LogNode {
        LogNode {
            id: id.to_string(),
            node_type: NodeType::Function,
            status: NodeStatus::Success,
            label: id.to_string(),
            details: None,
            soql_query: None,
            stats: NodeStats {
                soql,
                soql_rows: soql * 10,
                method_time: time,
                total_method: None,
            },
            parent_id: parent.map(str::to_string),
        }
    }

    fn sample() -> LogData {
        let nodes = vec![
            node("node-1", None, 3, 9.0),
            node("node-2", Some("node-1"), 1, 2.0),
            node("node-3", Some("node-1"), 2, 5.0),
            node("node-4", None, 0, 1.0),
        ];
        let stats = summarize_run(&nodes, 12_500_000, 0);
        LogData {
            nodes,
            edges: Vec::new(),
            stats,
        }
    }

    #[test]
    fn test_summarize_run_sums_roots() {
        let data = sample();

        assert_eq!(data.stats.total_soql, 3);
        assert_eq!(data.stats.total_records_fetched, 30);
        assert_eq!(data.stats.total_function_called, 4);
        assert_eq!(data.stats.total_time, 12.5);
        assert_eq!(data.check_consistency(), Ok(()));
    }

    #[test]
    fn test_rank_slowest() {
        let data = sample();
        let ranked = rank_slowest(&data, 2);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].id, "node-1");
        assert_eq!(ranked[1].id, "node-3");
    }

    #[test]
    fn test_rank_query_sources_uses_exclusive_counts() {
        let data = sample();
        let sources = rank_query_sources(&data, 10);

        let ids: Vec<(&str, u64)> = sources.iter().map(|(n, c)| (n.id.as_str(), *c)).collect();
        assert_eq!(ids, vec![("node-3", 2), ("node-2", 1)]);
    }

    #[test]
    fn test_rank_query_sources_over_wide_tree() {
        let mut nodes = vec![node("node-0", None, 60_000, 1.0)];
        nodes.extend((1..=60_000).map(|i| node(&format!("node-{}", i), Some("node-0"), 1, 0.0)));
        let stats = summarize_run(&nodes, 0, 0);
        let data = LogData {
            nodes,
            edges: Vec::new(),
            stats,
        };
        let sources = rank_query_sources(&data, 3);

        assert_eq!(sources.len(), 3);
        assert!(sources.iter().all(|(n, c)| n.id != "node-0" && *c == 1));
    }

    #[test]
    fn test_rank_empty() {
        let data = LogData::default();
        assert!(rank_slowest(&data, 5).is_empty());
        assert!(rank_query_sources(&data, 5).is_empty());
    }
}
