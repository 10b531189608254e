//! Memtrace
//!
//! Allocation-site memory profiling with call-tree attribution.
//!
//! A tracing agent in a managed runtime records function call/return
//! events and, at report time, the set of live heap objects with their
//! allocation sites. This crate rebuilds the call tree from the event
//! stream, aggregates live memory by (file, line, class), attributes each
//! aggregate to the most specific enclosing call frame, and emits the
//! annotated tree as JSON, a text summary, or an SVG flamegraph.
//!
//! This crate provides the core implementation for the `memtrace` CLI,
//! which replays recorded captures:
//!
//! ```bash
//! memtrace report --capture trace.json --output report.json
//! ```

pub mod attribution;
pub mod capture;
pub mod commands;
pub mod report;
pub mod session;
pub mod tracer;
pub mod utils;
