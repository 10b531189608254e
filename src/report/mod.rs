//! Report construction and output writers.
//!
//! This module handles the final artifact of a profiling session:
//! - The versioned JSON report schema
//! - JSON output (pretty, to a file or stdout)
//! - Text summaries for the terminal
//! - SVG memory flamegraphs

pub mod flamegraph;
pub mod json;
pub mod schema;
pub mod svg;
pub mod text;

// Re-export main types and functions
pub use flamegraph::{generate_flamegraph, FlamegraphConfig};
pub use json::{read_report, write_report, write_report_to};
pub use schema::Report;
pub use svg::write_svg;
pub use text::render_summary;
