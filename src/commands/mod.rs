//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod report;

// Re-export main command functions
pub use report::{execute_report, validate_args, ReportArgs};
