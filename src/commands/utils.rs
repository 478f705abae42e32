use crate::output::read_document;
use crate::utils::config::SCHEMA_VERSION;
use anyhow::{Context, Result};
use std::path::Path;

/// Validate a flow document JSON file
pub fn validate_document_file(file_path: impl AsRef<Path>) -> Result<()> {
    let file_path = file_path.as_ref();
    println!("Validating flow document: {}", file_path.display());

    let document = read_document(file_path)
        .with_context(|| format!("Failed to read flow document {}", file_path.display()))?;

    document
        .data
        .check_consistency()
        .context("Flow document is inconsistent")?;

    if document.positions.len() != document.data.nodes.len() {
        anyhow::bail!(
            "Flow document has {} positions for {} nodes",
            document.positions.len(),
            document.data.nodes.len()
        );
    }

    if document.version != SCHEMA_VERSION {
        log::warn!(
            "Document schema v{} differs from current v{}",
            document.version,
            SCHEMA_VERSION
        );
    }

    let stats = &document.data.stats;
    println!("✓ Valid flow document");
    println!("  Version: {}", document.version);
    println!("  Source: {}", document.source);
    println!("  Nodes: {}", document.data.nodes.len());
    println!("  Edges: {}", document.data.edges.len());
    println!("  Total Time: {} ms", stats.total_time);
    println!("  Total SOQL: {}", stats.total_soql);
    println!("  Structural Issues: {}", document.issues.len());

    Ok(())
}

/// Display schema information
pub fn display_schema(show_details: bool) {
    println!("Apex Flow Studio Document Schema");
    println!("Current Version: {}", SCHEMA_VERSION);
    println!();

    if show_details {
        println!("Schema Structure:");
        println!("  version: string            - Schema version (e.g., '1.0.0')");
        println!("  source: string             - Name of the parsed log");
        println!("  generatedAt: string        - ISO 8601 timestamp");
        println!("  data: object");
        println!("    nodes: array             - One entry per frame, in entry order");
        println!("      id: string             - 'node-N'");
        println!("      type: string           - function | trigger | beforeUpdate | afterUpdate | dml");
        println!("      label: string          - Display label");
        println!("      status: string         - success | warning | error");
        println!("      stats: object          - soql, soqlRows, methodTime (ms), totalMethod?");
        println!("      details: string?       - Extra notes (exceptions, debug output)");
        println!("      soqlQuery: string?     - Last query issued by the frame");
        println!("      parentId: string?      - Enclosing frame");
        println!("    edges: array             - id, source, target, label?");
        println!("    stats: object            - totalTime, totalSoql, totalFunctionCalled,");
        println!("                               totalRecordsFetched, recursionFound");
        println!("  positions: array           - id, x, y, level per node");
        println!("  issues: array              - line, kind, message");
    } else {
        println!("Use --show for detailed schema information");
    }
}

/// Display version information
pub fn display_version() {
    println!("Apex Flow Studio v{}", env!("CARGO_PKG_VERSION"));
    println!("Document Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Turns Apex debug logs into execution flow graphs.");
}
