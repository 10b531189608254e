//! Constants shared across the profiler.

/// Current report schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

// Sanity ceiling for per-object sizes reported by the inventory provider.
// Some providers return garbage sizes for internal objects; anything above
// this is a provider bug, not a real allocation.
pub const MAX_REASONABLE_OBJECT_BYTES: u64 = 100_000_000_000;

/// Size substituted for an object whose reported size exceeds the ceiling.
/// Roughly one object slot in a typical managed heap.
pub const FALLBACK_OBJECT_BYTES: u64 = 40;

/// Class label for objects whose class cannot be resolved
pub const FALLBACK_CLASS_NAME: &str = "<unknown>";

/// Method label for frames closed synthetically at end of trace
pub const UNKNOWN_METHOD_NAME: &str = "<unknown>";
