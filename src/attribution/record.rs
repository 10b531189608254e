//! Allocation records and inventory aggregation.
//!
//! The inventory provider reports one row per live heap object. Reports
//! work on aggregates instead: one record per distinct (file, line, class)
//! triple, sizes summed.

use crate::tracer::SourceLocation;
use crate::utils::config::{
    FALLBACK_CLASS_NAME, FALLBACK_OBJECT_BYTES, MAX_REASONABLE_OBJECT_BYTES,
};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One live heap object as reported by the inventory provider.
///
/// `file` is absent for objects allocated before tracking was enabled;
/// such objects carry no usable site and are skipped. `class_name` is
/// absent when the provider cannot resolve a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeapObject {
    /// Allocation source file, if tracked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Allocation source line
    #[serde(default)]
    pub line: u32,

    /// Resolved class name, if any
    #[serde(default, rename = "class", skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,

    /// Reported object size in bytes
    pub bytes: u64,
}

/// Aggregate memory at one allocation site, for one class.
///
/// Serialized as `{"file", "line", "class", "mem"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRecord {
    /// Allocation site
    #[serde(flatten)]
    pub location: SourceLocation,

    /// Class of the objects allocated here
    #[serde(rename = "class")]
    pub class_name: String,

    /// Summed size of all live objects sharing this site and class
    #[serde(rename = "mem")]
    pub total_bytes: u64,
}

/// Fold raw inventory rows into per-site allocation records
///
/// **Public** - called by the session's report pipeline
///
/// # Arguments
/// * `objects` - live objects from the inventory provider, already filtered
///   by the session's trace/ignore patterns
///
/// # Returns
/// Records sorted by (file, line, class) so reports are deterministic
///
/// Objects without an allocation file are skipped. Sizes above the sanity
/// ceiling indicate a provider bug and are clamped to the fallback size.
pub fn aggregate_objects(objects: &[HeapObject]) -> Vec<AllocationRecord> {
    let mut sites: HashMap<(String, u32, String), u64> = HashMap::new();

    for object in objects {
        let Some(file) = object.file.as_deref() else {
            continue;
        };

        let bytes = if object.bytes > MAX_REASONABLE_OBJECT_BYTES {
            warn!(
                "implausible object size {} at {}:{}; clamping to {}",
                object.bytes, file, object.line, FALLBACK_OBJECT_BYTES
            );
            FALLBACK_OBJECT_BYTES
        } else {
            object.bytes
        };

        let class = object
            .class_name
            .clone()
            .unwrap_or_else(|| FALLBACK_CLASS_NAME.to_string());

        *sites
            .entry((file.to_string(), object.line, class))
            .or_insert(0) += bytes;
    }

    let mut records: Vec<AllocationRecord> = sites
        .into_iter()
        .map(|((file, line, class_name), total_bytes)| AllocationRecord {
            location: SourceLocation { file, line },
            class_name,
            total_bytes,
        })
        .collect();

    records.sort_by(|a, b| {
        (&a.location.file, a.location.line, &a.class_name)
            .cmp(&(&b.location.file, b.location.line, &b.class_name))
    });

    debug!(
        "aggregated {} live objects into {} records",
        objects.len(),
        records.len()
    );

    records
}
