//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use crate::tracer::SourceLocation;
use thiserror::Error;

/// Errors that can occur while consuming the call event stream
#[derive(Error, Debug)]
pub enum TraceError {
    /// A RETURN event arrived with no open CALL to close. The stream is
    /// malformed; this is distinct from an empty tree.
    #[error("return event at {location} has no matching call")]
    UnmatchedReturn { location: SourceLocation },
}

/// Errors that can occur during session configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("`trace` option is not a valid pattern: {0}")]
    InvalidTracePattern(regex::Error),

    #[error("`ignore` option is not a valid pattern: {0}")]
    InvalidIgnorePattern(regex::Error),
}

/// Errors surfaced by the profiler session
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("profiler is already tracing")]
    AlreadyTracing,

    #[error("profiler is not tracing")]
    NotTracing,

    #[error("a report is already in progress")]
    ReportInProgress,

    #[error(transparent)]
    Trace(#[from] TraceError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to emit report: {0}")]
    Output(#[from] OutputError),
}

/// Errors that can occur while loading a recorded capture file
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("failed to read capture file: {0}")]
    ReadFailed(#[from] std::io::Error),

    #[error("failed to parse capture file: {0}")]
    ParseFailed(#[from] serde_json::Error),
}

/// Errors that can occur during report output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("invalid output path: {0}")]
    InvalidPath(String),
}

/// Errors that can occur during flamegraph generation
#[derive(Error, Debug)]
pub enum FlamegraphError {
    #[error("report contains no attributed allocations")]
    EmptyReport,
}
