use crate::aggregator::GraphConfig;
use crate::diagram::DiagramConfig;
use crate::layout::LayoutConfig;
use crate::parser::ParserConfig;
use std::path::PathBuf;

/// Arguments for the parse and sample commands
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct ParseArgs {
    /// Log file to read (None = built-in sample log)
    pub input: Option<PathBuf>,

    /// Output path for the JSON flow document
    pub output_json: PathBuf,

    /// Output path for the SVG diagram (optional)
    pub output_svg: Option<PathBuf>,

    pub parser_config: ParserConfig,

    pub graph_config: GraphConfig,

    pub layout_config: LayoutConfig,

    /// Diagram configuration (only used when `output_svg` is set)
    pub diagram_config: DiagramConfig,

    /// Print text summary to stdout
    pub print_summary: bool,

    /// Number of nodes shown in the summary tree and in each ranking
    pub top_nodes: usize,
}

impl Default for ParseArgs {
    fn default() -> Self {
        Self {
            input: None,
            output_json: PathBuf::from("flow.json"),
            output_svg: None,
            parser_config: ParserConfig::default(),
            graph_config: GraphConfig::default(),
            layout_config: LayoutConfig::default(),
            diagram_config: DiagramConfig::default(),
            print_summary: false,
            top_nodes: 10,
        }
    }
}
