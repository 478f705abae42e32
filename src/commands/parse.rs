//! Parse command implementation.
//!
//! The parse command:
//! 1. Reads the debug log (or the built-in sample)
//! 2. Parses it into nested frames
//! 3. Builds the graph and run stats
//! 4. Computes the tree layout
//! 5. Writes output files

use super::models::ParseArgs;
use crate::aggregator::build_graph;
use crate::diagram::{generate_diagram, generate_text_summary};
use crate::layout::compute_layout;
use crate::output::{write_document, write_svg};
use crate::parser::sample::{SAMPLE_LOG, SAMPLE_SOURCE_NAME};
use crate::parser::{parse_log, FlowDocument};
use crate::utils::config::{ACCEPTED_EXTENSIONS, SCHEMA_VERSION};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::path::Path;
use std::time::Instant;

/// Execute the parse command
///
/// **Public** - main entry point called from main.rs
///
/// # Arguments
/// * `args` - Parse command arguments
///
/// # Returns
/// The document that was written, or Err with context if any step fails
///
/// # Errors
/// * Log read failures
/// * Structural errors in strict mode
/// * File write errors
///
/// # Example
/// ```ignore
/// let args = ParseArgs {
///     input: Some(PathBuf::from("debug.log")),
///     output_svg: Some(PathBuf::from("flow.svg")),
///     ..Default::default()
/// };
///
/// execute_parse(args)?;
/// ```
pub fn execute_parse(args: ParseArgs) -> Result<FlowDocument> {
    let start_time = Instant::now();

    // Step 1: Read input
    info!("Step 1/5: Reading log...");
    let (text, source) = read_source(args.input.as_deref())?;

    info!("Processing log: {} ({} bytes)", source, text.len());

    // Steps 2-4
    let document = build_document(&text, &source, &args)?;

    // Step 5: Write outputs
    info!("Step 5/5: Writing output files...");

    write_document(&document, &args.output_json).context("Failed to write flow document JSON")?;

    info!("✓ Flow document written to: {}", args.output_json.display());

    if let Some(svg_path) = &args.output_svg {
        let config = args
            .diagram_config
            .clone()
            .with_node_width(args.layout_config.node_width);
        let svg = generate_diagram(&document.data, &document.positions, &config)
            .context("Failed to generate flow diagram")?;

        write_svg(&svg, svg_path).context("Failed to write flow diagram SVG")?;

        info!("✓ Diagram written to: {}", svg_path.display());
    }

    if args.print_summary {
        let stats = &document.data.stats;
        println!("\n{}", "=".repeat(80));
        println!("FLOW SUMMARY");
        println!("{}", "=".repeat(80));
        println!("Source:            {}", document.source);
        println!("Total Time:        {:.3} ms", stats.total_time);
        println!("SOQL Queries:      {}", stats.total_soql);
        println!("Records Fetched:   {}", stats.total_records_fetched);
        println!("Functions Called:  {}", stats.total_function_called);
        println!("Recursive Entries: {}", stats.recursion_found);
        println!("Structural Issues: {}", document.issues.len());
        println!("\n{}", generate_text_summary(&document.data, args.top_nodes));
        println!("{}", "=".repeat(80));
    }

    let elapsed = start_time.elapsed();
    info!("Parse completed in {:.2}s", elapsed.as_secs_f64());

    Ok(document)
}

/// Run steps 2-4 of the pipeline over already-loaded log text
///
/// **Public** - used by execute_parse and tests
pub fn build_document(text: &str, source: &str, args: &ParseArgs) -> Result<FlowDocument> {
    // Step 2: Parse
    info!("Step 2/5: Parsing log...");
    let parsed = parse_log(text, &args.parser_config)
        .with_context(|| format!("Failed to parse log {}", source))?;

    if !parsed.issues.is_empty() {
        warn!(
            "{} structural issue(s) recorded; the graph may be incomplete",
            parsed.issues.len()
        );
    }

    debug!(
        "Parsed {} frames spanning {} ns",
        parsed.events.len(),
        parsed.total_ns()
    );

    // Step 3: Build graph
    info!("Step 3/5: Building execution graph...");
    let data = build_graph(&parsed, &args.graph_config);
    data.check_consistency()
        .context("Execution graph failed its consistency check")?;

    info!(
        "Graph: {} nodes, {} edges, {} SOQL, {} records",
        data.nodes.len(),
        data.edges.len(),
        data.stats.total_soql,
        data.stats.total_records_fetched
    );

    // Step 4: Layout
    info!("Step 4/5: Computing layout...");
    let positions =
        compute_layout(&data, &args.layout_config).context("Failed to compute layout")?;

    Ok(FlowDocument {
        version: SCHEMA_VERSION.to_string(),
        source: source.to_string(),
        generated_at: chrono::Utc::now().to_rfc3339(),
        data,
        positions,
        issues: parsed.issues,
    })
}

/// Load the log text and a display name for it
///
/// **Private** - internal helper for execute_parse
fn read_source(input: Option<&Path>) -> Result<(String, String)> {
    match input {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to process log file {}", path.display()))?;
            let source = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            Ok((text, source))
        }
        None => {
            debug!("Using built-in sample log");
            Ok((SAMPLE_LOG.to_string(), SAMPLE_SOURCE_NAME.to_string()))
        }
    }
}

/// Validate parse arguments
///
/// **Public** - can be called before execute_parse for early validation
///
/// # Arguments
/// * `args` - Arguments to validate
///
/// # Returns
/// Ok if arguments are valid, Err with message if not
pub fn validate_args(args: &ParseArgs) -> Result<()> {
    if let Some(input) = &args.input {
        let extension = input
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension {
            Some(ext) if ACCEPTED_EXTENSIONS.contains(&ext.as_str()) => {}
            _ => anyhow::bail!(
                "Unsupported log file {} (expected one of: {})",
                input.display(),
                ACCEPTED_EXTENSIONS
                    .iter()
                    .map(|ext| format!(".{}", ext))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }

        if !input.is_file() {
            anyhow::bail!("Log file not found: {}", input.display());
        }
    }

    // Validate top_nodes
    if args.top_nodes == 0 {
        anyhow::bail!("top_nodes must be greater than 0");
    }

    if args.top_nodes > 1000 {
        anyhow::bail!("top_nodes is too large (max 1000)");
    }

    let layout = &args.layout_config;
    if !(layout.node_width.is_finite() && layout.node_width > 0.0) {
        anyhow::bail!("node width must be a positive number");
    }

    if !(layout.gap.is_finite() && layout.gap >= 0.0) {
        anyhow::bail!("gap cannot be negative");
    }

    if !(layout.level_height.is_finite() && layout.level_height > 0.0) {
        anyhow::bail!("level height must be a positive number");
    }

    Ok(())
}
