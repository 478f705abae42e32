//! SVG flow diagram generation.
//!
//! Renders laid-out nodes as cards:
//! - Header band coloured by status (success green, error red, warning amber)
//! - Node label and first detail line
//! - SOQL and timing stats
//!
//! Edges are stepped connectors from the bottom of the source card
//! to the top of the target card.

use crate::aggregator::metrics::{rank_query_sources, rank_slowest};
use crate::parser::{LogData, LogNode, NodePosition, NodeStatus};
use crate::utils::config::{DEFAULT_NODE_HEIGHT, DEFAULT_NODE_WIDTH};
use crate::utils::error::DiagramError;
use log::info;
use std::collections::HashMap;
use std::fmt::Write as _;

const MARGIN: f64 = 40.0;
const TITLE_HEIGHT: f64 = 40.0;
const HEADER_HEIGHT: f64 = 26.0;
const CHAR_WIDTH: f64 = 7.0;

/// Diagram configuration
#[derive(Debug, Clone)]
pub struct DiagramConfig {
    pub title: String,
    /// Must match the layout's node width
    pub node_width: f64,
    pub node_height: f64,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            title: "Apex Execution Flow".to_string(),
            node_width: DEFAULT_NODE_WIDTH,
            node_height: DEFAULT_NODE_HEIGHT,
        }
    }
}

impl DiagramConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_node_width(mut self, node_width: f64) -> Self {
        self.node_width = node_width;
        self
    }
}

/// Generate an SVG diagram from laid-out graph data
///
/// **Public** - main entry point for diagram rendering
///
/// # Errors
/// * `DiagramError::EmptyGraph` - no nodes to draw
/// * `DiagramError::MissingPosition` - a node has no computed position
pub fn generate_diagram(
    data: &LogData,
    positions: &[NodePosition],
    config: &DiagramConfig,
) -> Result<String, DiagramError> {
    if data.nodes.is_empty() {
        return Err(DiagramError::EmptyGraph);
    }

    info!("Generating flow diagram with {} nodes", data.nodes.len());

    let by_id: HashMap<&str, &NodePosition> =
        positions.iter().map(|p| (p.id.as_str(), p)).collect();
    for node in &data.nodes {
        if !by_id.contains_key(node.id.as_str()) {
            return Err(DiagramError::MissingPosition(node.id.clone()));
        }
    }

    let max_x = positions.iter().map(|p| p.x).fold(0.0, f64::max);
    let max_y = positions.iter().map(|p| p.y).fold(0.0, f64::max);
    let width = (max_x + config.node_width + 2.0 * MARGIN).max(400.0);
    let legend_height = 40.0;
    let height = max_y + config.node_height + 2.0 * MARGIN + TITLE_HEIGHT + legend_height;

    let mut svg = String::new();

    // Header
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.0}" height="{h:.0}" viewBox="0 0 {w:.0} {h:.0}">"#,
        w = width,
        h = height
    );
    svg.push_str(
        r#"<style>.card { font: 12px sans-serif; } .card:hover rect.body { stroke: #60a5fa; stroke-width: 2; }</style>"#,
    );
    let _ = write!(
        svg,
        r##"<rect x="0" y="0" width="{:.0}" height="{:.0}" fill="#f9fafb"/>"##,
        width, height
    );
    let _ = write!(
        svg,
        r#"<text x="{:.0}" y="28" font-size="16" text-anchor="middle" font-weight="bold">{}</text>"#,
        width / 2.0,
        escape_xml(&config.title)
    );

    let origin = (MARGIN, MARGIN + TITLE_HEIGHT);

    for edge in &data.edges {
        if let (Some(source), Some(target)) =
            (by_id.get(edge.source.as_str()), by_id.get(edge.target.as_str()))
        {
            render_edge(&mut svg, source, target, edge.label.as_deref(), origin, config);
        }
    }

    for node in &data.nodes {
        if let Some(position) = by_id.get(node.id.as_str()) {
            render_node(&mut svg, node, position, origin, config);
        }
    }

    render_legend(&mut svg, height - legend_height / 2.0);

    svg.push_str("</svg>");

    info!("Diagram generated successfully ({} bytes)", svg.len());
    Ok(svg)
}

/// Header colour for a node status
pub fn status_color(status: NodeStatus) -> &'static str {
    match status {
        NodeStatus::Success | NodeStatus::Start => "#22c55e",
        NodeStatus::Error | NodeStatus::End => "#ef4444",
        NodeStatus::Warning => "#f59e0b",
    }
}

fn ansi_color(status: NodeStatus) -> &'static str {
    match status {
        NodeStatus::Success | NodeStatus::Start => "\x1b[32m",
        NodeStatus::Error | NodeStatus::End => "\x1b[31;1m",
        NodeStatus::Warning => "\x1b[33m",
    }
}

fn render_edge(
    out: &mut String,
    source: &NodePosition,
    target: &NodePosition,
    label: Option<&str>,
    origin: (f64, f64),
    config: &DiagramConfig,
) {
    let x1 = origin.0 + source.x + config.node_width / 2.0;
    let y1 = origin.1 + source.y + config.node_height;
    let x2 = origin.0 + target.x + config.node_width / 2.0;
    let y2 = origin.1 + target.y;
    let mid = (y1 + y2) / 2.0;

    let _ = write!(
        out,
        r##"<path d="M {:.1} {:.1} V {:.1} H {:.1} V {:.1}" fill="none" stroke="#b1b1b7" stroke-width="2"/>"##,
        x1, y1, mid, x2, y2
    );

    if let Some(label) = label {
        let _ = write!(
            out,
            r##"<text x="{:.1}" y="{:.1}" font-size="11" fill="#6b7280" dx="4">{}</text>"##,
            (x1 + x2) / 2.0,
            mid - 4.0,
            escape_xml(label)
        );
    }
}

fn render_node(
    out: &mut String,
    node: &LogNode,
    position: &NodePosition,
    origin: (f64, f64),
    config: &DiagramConfig,
) {
    let x = origin.0 + position.x;
    let y = origin.1 + position.y;
    let w = config.node_width;
    let max_chars = ((w - 16.0) / CHAR_WIDTH) as usize;

    let _ = write!(out, r#"<g class="card" id="{}">"#, escape_xml(&node.id));

    // Tooltip with the full label, details and query
    let mut tooltip = node.label.clone();
    for extra in [node.details.as_deref(), node.soql_query.as_deref()].into_iter().flatten() {
        tooltip.push('\n');
        tooltip.push_str(extra);
    }
    let _ = write!(out, "<title>{}</title>", escape_xml(&tooltip));

    let _ = write!(
        out,
        r##"<rect class="body" x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" rx="4" fill="white" stroke="#e5e7eb"/>"##,
        x, y, w, config.node_height
    );
    let _ = write!(
        out,
        r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" rx="4" fill="{}"/>"#,
        x,
        y,
        w,
        HEADER_HEIGHT,
        status_color(node.status)
    );
    let _ = write!(
        out,
        r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-weight="bold" fill="white">{}</text>"#,
        x + w / 2.0,
        y + 17.0,
        node.node_type.display_label()
    );

    let mut lines = vec![(truncate(&node.label, max_chars), "#1f2937", true)];
    if let Some(first) = node.details.as_deref().and_then(|d| d.lines().next()) {
        lines.push((truncate(first, max_chars), "#4b5563", false));
    }
    lines.push((
        format!("{} SOQL | {} SOQL Rows", node.stats.soql, node.stats.soql_rows),
        "#2563eb",
        false,
    ));
    let timing = match node.stats.total_method {
        Some(total) => format!(
            "{} Total Method | {} milliseconds Taken",
            total, node.stats.method_time
        ),
        None => format!("{} milliseconds Taken", node.stats.method_time),
    };
    lines.push((truncate(&timing, max_chars), "#2563eb", false));

    for (i, (text, color, bold)) in lines.iter().enumerate() {
        let _ = write!(
            out,
            r#"<text x="{:.1}" y="{:.1}" fill="{}"{}>{}</text>"#,
            x + 8.0,
            y + HEADER_HEIGHT + 18.0 + i as f64 * 20.0,
            color,
            if *bold { r#" font-weight="bold""# } else { "" },
            escape_xml(text)
        );
    }

    out.push_str("</g>");
}

fn render_legend(out: &mut String, legend_y: f64) {
    let _ = write!(
        out,
        r#"<text x="10" y="{:.0}" font-size="14" font-weight="bold">Legend:</text>"#,
        legend_y
    );

    let items = [
        ("Success", NodeStatus::Success),
        ("Warning", NodeStatus::Warning),
        ("Error", NodeStatus::Error),
    ];

    for (i, (label, status)) in items.iter().enumerate() {
        let x = 80 + i * 120;
        let _ = write!(
            out,
            r#"<rect x="{}" y="{:.0}" width="15" height="15" fill="{}" rx="2"/>"#,
            x,
            legend_y - 12.0,
            status_color(*status)
        );
        let _ = write!(
            out,
            r#"<text x="{}" y="{:.0}" font-size="12">{}</text>"#,
            x + 20,
            legend_y,
            label
        );
    }
}

/// Shorten to `max_chars` characters with a trailing ellipsis
fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars || max_chars <= 3 {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars - 3).collect();
    format!("{}...", kept)
}

/// Escape text for use in SVG content and attributes
pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Create a text summary: run stats, the call tree and the slowest nodes
///
/// `max_nodes` caps the tree and each ranking.
pub fn generate_text_summary(data: &LogData, max_nodes: usize) -> String {
    let reset = "\x1b[0m";
    let mut lines = Vec::new();

    lines.push("  📊 FLOW STATISTICS".to_string());
    lines.push("  ┏━━━━━━━━━━━━━━━━━━━━━━━━━━┳━━━━━━━━━━━━━━━━━━━━━━━━┓".to_string());
    let stats = &data.stats;
    let rows = [
        ("Total Flow Time", format!("{} milliseconds", stats.total_time)),
        ("Total SOQL Used", stats.total_soql.to_string()),
        ("Total Function Called", stats.total_function_called.to_string()),
        ("Total Records Fetched", stats.total_records_fetched.to_string()),
        ("Recursion Found", stats.recursion_found.to_string()),
    ];
    for (label, value) in rows {
        lines.push(format!("  ┃ {:<24} ┃ {:>22} ┃", label, value));
    }
    lines.push("  ┗━━━━━━━━━━━━━━━━━━━━━━━━━━┻━━━━━━━━━━━━━━━━━━━━━━━━┛".to_string());

    lines.push(String::new());
    lines.push("  🌳 EXECUTION TREE".to_string());
    let shown = push_tree(data, &mut lines, max_nodes);
    if data.nodes.len() > shown {
        lines.push(format!(
            "   (Showing {} of {} nodes)",
            shown,
            data.nodes.len()
        ));
    }

    lines.push(String::new());
    lines.push("  🐢 SLOWEST NODES".to_string());
    for node in rank_slowest(data, max_nodes) {
        lines.push(format!(
            "  └─ {}{:<50}{} {:>10} ms",
            ansi_color(node.status),
            truncate(&node.label, 50),
            reset,
            node.stats.method_time
        ));
    }

    let sources = rank_query_sources(data, max_nodes);
    if !sources.is_empty() {
        lines.push(String::new());
        lines.push("  🔎 QUERY SOURCES".to_string());
        for (node, own) in sources {
            lines.push(format!("  └─ {:<50} {:>4} SOQL", truncate(&node.label, 50), own));
        }
    }

    lines.join("\n")
}

/// Append up to `max_nodes` tree lines in pre-order, returning how many were shown
fn push_tree(data: &LogData, lines: &mut Vec<String>, max_nodes: usize) -> usize {
    let mut children: HashMap<&str, Vec<&LogNode>> = HashMap::new();
    for node in &data.nodes {
        if let Some(parent) = node.parent_id.as_deref() {
            children.entry(parent).or_default().push(node);
        }
    }

    let mut stack: Vec<(&LogNode, usize)> = data.roots().map(|root| (root, 0)).collect();
    stack.reverse();
    let mut shown = 0;

    while let Some((node, depth)) = stack.pop() {
        if shown >= max_nodes {
            break;
        }
        shown += 1;

        lines.push(format!(
            "  {}{}{}{} [{} SOQL, {} ms]",
            "  ".repeat(depth),
            ansi_color(node.status),
            node.label,
            "\x1b[0m",
            node.stats.soql,
            node.stats.method_time
        ));

        if let Some(kids) = children.get(node.id.as_str()) {
            stack.extend(kids.iter().rev().map(|&child| (child, depth + 1)));
        }
    }

    shown
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::{build_graph, GraphConfig};
    use crate::layout::{compute_layout, LayoutConfig};
    use crate::parser::{parse_log, NodeStats, NodeType, ParserConfig};

    const LOG: &str = "\
12:00:00.0 (0)|CODE_UNIT_STARTED|[EXTERNAL]|TRIGGERS
12:00:00.0 (100)|METHOD_ENTRY|[1]|01p|Repo.load(List<Id>)
12:00:00.0 (200)|SOQL_EXECUTE_BEGIN|[2]|Aggregations:0|SELECT Id FROM Contact WHERE Name = 'A&B'
12:00:00.0 (300)|SOQL_EXECUTE_END|[2]|Rows:1
12:00:00.0 (400)|METHOD_EXIT|[1]|01p|Repo.load(List<Id>)
12:00:00.0 (500)|CODE_UNIT_FINISHED|TRIGGERS
";

    fn laid_out() -> (LogData, Vec<NodePosition>) {
        let parsed = parse_log(LOG, &ParserConfig::default()).unwrap();
        let data = build_graph(&parsed, &GraphConfig::default());
        let positions = compute_layout(&data, &LayoutConfig::default()).unwrap();
        (data, positions)
    }

    #[test]
    fn test_generate_diagram() {
        let (data, positions) = laid_out();
        let svg = generate_diagram(&data, &positions, &DiagramConfig::default()).unwrap();

        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("Function:Repo.load"));
        assert!(svg.contains("1 SOQL | 1 SOQL Rows"));
        assert!(svg.contains("A&amp;B"));
        assert!(!svg.contains("A&B"));
        assert!(svg.contains("#22c55e"));
    }

    #[test]
    fn test_empty_graph_is_an_error() {
        let result = generate_diagram(&LogData::default(), &[], &DiagramConfig::default());
        assert!(matches!(result, Err(DiagramError::EmptyGraph)));
    }

    #[test]
    fn test_missing_position_is_an_error() {
        let (data, positions) = laid_out();
        let result = generate_diagram(&data, &positions[..1], &DiagramConfig::default());
        assert!(matches!(result, Err(DiagramError::MissingPosition(id)) if id == "node-2"));
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééééééééé", 6), "ééé...");
    }

    #[test]
    fn test_text_summary_lists_stats_and_tree() {
        let (data, _) = laid_out();
        let summary = generate_text_summary(&data, 10);

        assert!(summary.contains("Total SOQL Used"));
        assert!(summary.contains("Function:TRIGGERS"));
        assert!(summary.contains("Function:Repo.load"));
        assert!(summary.contains("QUERY SOURCES"));
    }

    #[test]
    fn test_text_summary_respects_limit() {
        let (data, _) = laid_out();
        let summary = generate_text_summary(&data, 1);
        assert!(summary.contains("(Showing 1 of 2 nodes)"));
    }

    #[test]
    fn test_text_summary_over_deep_chain() {
        let nodes: Vec<LogNode> = (0..100_000usize)
            .map(|i| LogNode {
                id: format!("n{}", i),
                node_type: NodeType::Function,
                status: NodeStatus::Warning,
                label: format!("Function:Step{}", i),
                details: None,
                soql_query: None,
                stats: NodeStats {
                    method_time: 1.0,
                    ..Default::default()
                },
                parent_id: i.checked_sub(1).map(|p| format!("n{}", p)),
            })
            .collect();
        let data = LogData {
            nodes,
            ..Default::default()
        };

        let summary = generate_text_summary(&data, 3);

        assert!(summary.contains("(Showing 3 of 100000 nodes)"));
        assert!(summary.contains("\x1b[33mFunction:Step2\x1b[0m"));
        assert!(!summary.contains("Function:Step3\x1b[0m"));
        let ranked = summary.lines().filter(|l| l.starts_with("  └─ ")).count();
        assert_eq!(ranked, 3);
    }
}
