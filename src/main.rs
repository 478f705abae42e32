//! Apex Flow Studio CLI
//!
//! Turns Apex debug logs into execution flow graphs.
//! Generates JSON flow documents, diagrams and text summaries.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use apex_flow_studio::aggregator::{EdgeMode, GraphConfig};
use apex_flow_studio::commands::{
    display_schema, display_version, execute_parse, validate_args, validate_document_file,
    ParseArgs,
};
use apex_flow_studio::diagram::DiagramConfig;
use apex_flow_studio::layout::LayoutConfig;
use apex_flow_studio::parser::ParserConfig;
use apex_flow_studio::utils::config::{
    DEFAULT_HORIZONTAL_GAP, DEFAULT_LEVEL_HEIGHT, DEFAULT_NODE_WIDTH,
};

/// Apex Flow Studio - execution flow graphs for Apex debug logs
#[derive(Parser, Debug)]
#[command(name = "apex-flow")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a debug log into a flow document
    Parse {
        /// Debug log to parse (.log or .txt)
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        options: PipelineOptions,
    },

    /// Run the pipeline over the built-in sample log
    Sample {
        #[command(flatten)]
        options: PipelineOptions,
    },

    /// Validate a flow document JSON file
    Validate {
        /// Path to flow document JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display schema information
    Schema {
        /// Show full schema details
        #[arg(long)]
        show: bool,
    },

    /// Display version information
    Version,
}

/// Options shared by `parse` and `sample`
#[derive(Args, Debug)]
struct PipelineOptions {
    /// Output path for JSON flow document
    #[arg(short, long, default_value = "flow.json", env = "APEX_FLOW_OUTPUT")]
    output: PathBuf,

    /// Output path for SVG diagram (optional)
    #[arg(short, long)]
    diagram: Option<PathBuf>,

    /// Edge generation: `sequence` (execution order) or `call` (parent to child)
    #[arg(long, default_value = "sequence")]
    edges: EdgeMode,

    /// Fail on mismatched or missing exit markers instead of reporting them
    #[arg(long, env = "APEX_FLOW_STRICT")]
    strict: bool,

    /// Include SYSTEM_METHOD frames
    #[arg(long)]
    system_methods: bool,

    /// Attach USER_DEBUG output to node details
    #[arg(long)]
    debug_output: bool,

    /// Print text summary to stdout
    #[arg(long)]
    summary: bool,

    /// Number of nodes shown in the summary tree and in each ranking
    #[arg(long, default_value = "10")]
    top_nodes: usize,

    /// Diagram title
    #[arg(long)]
    title: Option<String>,

    /// Node card width
    #[arg(long, default_value_t = DEFAULT_NODE_WIDTH)]
    node_width: f64,

    /// Horizontal gap between sibling subtrees
    #[arg(long, default_value_t = DEFAULT_HORIZONTAL_GAP)]
    gap: f64,

    /// Vertical distance between levels
    #[arg(long, default_value_t = DEFAULT_LEVEL_HEIGHT)]
    level_height: f64,
}

impl PipelineOptions {
    fn into_args(self, input: Option<PathBuf>) -> ParseArgs {
        let mut diagram_config = DiagramConfig::new().with_node_width(self.node_width);
        if let Some(title) = self.title {
            diagram_config = diagram_config.with_title(title);
        }

        ParseArgs {
            input,
            output_json: self.output,
            output_svg: self.diagram,
            parser_config: ParserConfig::new()
                .with_strict(self.strict)
                .with_system_methods(self.system_methods)
                .with_debug_output(self.debug_output),
            graph_config: GraphConfig::new().with_edge_mode(self.edges),
            layout_config: LayoutConfig::new()
                .with_node_width(self.node_width)
                .with_gap(self.gap)
                .with_level_height(self.level_height),
            diagram_config,
            print_summary: self.summary,
            top_nodes: self.top_nodes,
        }
    }
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Parse { input, options } => {
            let args = options.into_args(Some(input));

            // Validate args first
            validate_args(&args)?;

            execute_parse(args)?;
        }

        Commands::Sample { options } => {
            let args = options.into_args(None);
            validate_args(&args)?;
            execute_parse(args)?;
        }

        Commands::Validate { file } => {
            validate_document_file(file)?;
        }

        Commands::Schema { show } => {
            display_schema(show);
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
