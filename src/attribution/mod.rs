//! Aggregation of live-object inventories and attribution into call trees.
//!
//! This module transforms the raw object inventory into:
//! - Per-site allocation records (grouped by file, line, and class)
//! - Annotated frames, each record attached to its most specific frame

pub mod attributor;
pub mod record;

// Re-export main types and functions
pub use attributor::{attribute_all, attribute_record, AttributionOutcome};
pub use record::{aggregate_objects, AllocationRecord, HeapObject};
