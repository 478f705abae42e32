//! JSON flow document writer.
//!
//! Writes FlowDocument structs to JSON files with proper formatting.

use super::{ensure_parent_dir, validate_path};
use crate::parser::schema::FlowDocument;
use crate::utils::error::OutputError;
use log::{debug, info};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Write a flow document to a JSON file
///
/// **Public** - main entry point for JSON output
///
/// # Arguments
/// * `document` - Document to write
/// * `output_path` - Path to output JSON file
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
///
/// # Example
/// ```ignore
/// write_document(&document, "flow.json")?;
/// ```
pub fn write_document(
    document: &FlowDocument,
    output_path: impl AsRef<Path>,
) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing flow document to: {}", output_path.display());

    validate_path(output_path)?;
    ensure_parent_dir(output_path)?;

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, document).map_err(OutputError::SerializationFailed)?;

    info!(
        "Flow document written successfully ({} bytes)",
        calculate_file_size(output_path)
    );

    Ok(())
}

/// Serialize a flow document to a pretty JSON string
///
/// **Public** - library helper for callers that want the JSON in memory
pub fn document_to_string(document: &FlowDocument) -> Result<String, OutputError> {
    serde_json::to_string_pretty(document).map_err(OutputError::SerializationFailed)
}

/// Calculate file size in bytes
///
/// **Private** - internal utility
fn calculate_file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Read a flow document from a JSON file
///
/// **Public** - used by the validate command and tests
///
/// # Errors
/// * `OutputError::WriteFailed` - File read error (reusing WriteFailed for I/O)
/// * `OutputError::SerializationFailed` - JSON parse error
pub fn read_document(input_path: impl AsRef<Path>) -> Result<FlowDocument, OutputError> {
    let input_path = input_path.as_ref();

    debug!("Reading flow document from: {}", input_path.display());

    let file = File::open(input_path).map_err(OutputError::WriteFailed)?;

    let document: FlowDocument =
        serde_json::from_reader(file).map_err(OutputError::SerializationFailed)?;

    debug!(
        "Flow document loaded: version {}, source {}",
        document.version, document.source
    );

    Ok(document)
}
