//! JSON report writer.
//!
//! Writes Report structs as pretty-printed JSON to a file or any writer.

use super::schema::Report;
use crate::utils::error::OutputError;
use log::{debug, info};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write a report to a JSON file
///
/// **Public** - main entry point for JSON output
///
/// Creates parent directories if needed.
///
/// # Errors
/// * `OutputError::InvalidPath` - empty path, or path is a directory
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
pub fn write_report(report: &Report, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing report to: {}", output_path.display());
    validate_output_path(output_path)?;

    if let Some(parent) = output_path.parent() {
        if !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!("Cannot create directory {}: {}", parent.display(), e))
            })?;
        }
    }

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let mut writer = BufWriter::new(file);
    write_report_to(report, &mut writer)?;
    writer.flush().map_err(OutputError::WriteFailed)?;

    info!(
        "Report written successfully ({} records, {} dropped)",
        report.record_count, report.dropped_records
    );

    Ok(())
}

/// Write a report to any writer (used for the stdout sink)
///
/// **Public** - sink-agnostic variant of `write_report`
pub fn write_report_to(report: &Report, writer: &mut impl Write) -> Result<(), OutputError> {
    serde_json::to_writer_pretty(&mut *writer, report)
        .map_err(OutputError::SerializationFailed)?;
    writeln!(writer).map_err(OutputError::WriteFailed)?;
    Ok(())
}

/// Read a report back from a JSON file
///
/// **Public** - useful for validation and testing
pub fn read_report(input_path: impl AsRef<Path>) -> Result<Report, OutputError> {
    let input_path = input_path.as_ref();
    debug!("Reading report from: {}", input_path.display());

    let file = File::open(input_path).map_err(OutputError::WriteFailed)?;
    let report: Report = serde_json::from_reader(file).map_err(OutputError::SerializationFailed)?;

    debug!(
        "Report loaded: version {}, {} roots",
        report.version,
        report.roots.len()
    );

    Ok(report)
}

/// Validate that the output path is usable
fn validate_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.exists() && path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}
