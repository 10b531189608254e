//! Output JSON schema for profiling reports.
//!
//! This module defines the structure of the report emitted at the end of
//! the pipeline. Schema is versioned to allow future evolution.

use crate::attribution::AttributionOutcome;
use crate::tracer::{CallTree, Frame};
use crate::utils::config::SCHEMA_VERSION;
use serde::{Deserialize, Serialize};

/// Top-level report: the annotated call tree plus aggregate counters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Schema version for compatibility checking
    pub version: String,

    /// Timestamp when the report was generated (RFC 3339)
    pub generated_at: String,

    /// Summed bytes across every aggregated record, attributed or not
    pub total_bytes: u64,

    /// Number of distinct (file, line, class) records
    pub record_count: usize,

    /// Records with no matching frame, left out of the tree
    pub dropped_records: usize,

    /// Annotated call tree (forest of top-level frames)
    pub roots: Vec<Frame>,
}

impl Report {
    /// Assemble a report from an annotated tree and attribution counters
    ///
    /// **Public** - called by the session's report pipeline
    pub fn new(tree: CallTree, total_bytes: u64, outcome: AttributionOutcome) -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            total_bytes,
            record_count: outcome.attached + outcome.dropped,
            dropped_records: outcome.dropped,
            roots: tree.roots,
        }
    }

    /// Bytes actually attached somewhere in the tree
    pub fn attributed_bytes(&self) -> u64 {
        self.roots.iter().map(Frame::subtree_bytes).sum()
    }
}
