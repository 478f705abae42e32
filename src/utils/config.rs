//! Configuration and constants for the CLI.

/// Current flow document schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

// Timestamps in the log are elapsed nanoseconds; node stats are milliseconds
pub const NANOS_PER_MILLI: f64 = 1_000_000.0;

// Layout defaults (match the card size used by the flow viewer)
pub const DEFAULT_NODE_WIDTH: f64 = 250.0;
pub const DEFAULT_HORIZONTAL_GAP: f64 = 50.0;
pub const DEFAULT_LEVEL_HEIGHT: f64 = 200.0;

/// Card height used by the SVG renderer
pub const DEFAULT_NODE_HEIGHT: f64 = 120.0;

/// File extensions accepted as log input
pub const ACCEPTED_EXTENSIONS: &[&str] = &["log", "txt"];

/// Label for the code unit that owns statements logged outside any frame
pub const IMPLICIT_ROOT_LABEL: &str = "(top level)";

/// Marker the platform appends to trigger code units
pub const TRIGGER_MARKER_PREFIX: &str = "__sfdc_trigger/";

/// Separator between the trigger name and its event in a code unit name
pub const TRIGGER_EVENT_SEPARATOR: &str = " trigger event ";
