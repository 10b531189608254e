//! The profiler session: lifecycle, configuration, and the report pipeline.
//!
//! A session owns the call-tree builder and an object inventory provider.
//! The call event source is simply whoever calls `observe` - events arrive
//! synchronously on the same execution context, so no locking is involved
//! anywhere in the pipeline.

pub mod config;

pub use config::{OutputTarget, SessionConfig, SessionOptions};

use crate::attribution::{aggregate_objects, attribute_all, HeapObject};
use crate::report::{json, Report};
use crate::tracer::{CallEvent, CallTree, TreeBuilder};
use crate::utils::error::{OutputError, SessionError};
use log::{debug, info};
use std::io::Write;

/// Enumerates live heap objects and toggles whatever bookkeeping it needs
/// to answer, independent of the call-tree tracing lifecycle.
///
/// `live_objects` is a blocking full walk, proportional to the number of
/// live objects; the session pauses tracking around it during reports.
pub trait ObjectInventory {
    /// Begin recording allocation sites for new objects
    fn start_tracking(&mut self);

    /// Pause recording
    fn stop_tracking(&mut self);

    /// Discard all bookkeeping (called when the session stops)
    fn clear(&mut self);

    /// Enumerate every currently-live object
    fn live_objects(&mut self) -> Vec<HeapObject>;
}

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not tracing; the tree is empty
    Idle,
    /// Consuming events and growing the tree
    Tracing,
    /// A report is in flight; guards against reentrancy
    Reporting,
}

/// Owns one trace from `start` to `stop` and produces reports on demand.
///
/// The call tree is owned exclusively by the session: it is rebuilt from
/// scratch on every `start` and frozen into the value `stop` returns.
#[derive(Debug)]
pub struct ProfilerSession<I: ObjectInventory> {
    state: SessionState,
    builder: TreeBuilder,
    config: SessionConfig,
    inventory: I,
}

impl<I: ObjectInventory> ProfilerSession<I> {
    /// Create an idle session around an inventory provider
    pub fn new(inventory: I) -> Self {
        Self {
            state: SessionState::Idle,
            builder: TreeBuilder::new(),
            config: SessionConfig::default(),
            inventory,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Access the inventory provider
    pub fn inventory(&self) -> &I {
        &self.inventory
    }

    /// Apply filter and output options.
    ///
    /// Valid in any state; fails before any state mutation if a pattern
    /// does not compile.
    ///
    /// # Errors
    /// * `SessionError::Config` - a trace/ignore pattern does not compile
    pub fn configure(&mut self, opts: SessionOptions) -> Result<(), SessionError> {
        self.config.apply(opts)?;
        Ok(())
    }

    /// Begin tracing: reset the tree, enable inventory tracking.
    ///
    /// # Errors
    /// * `SessionError::AlreadyTracing` - `start` while not idle
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Idle {
            return Err(SessionError::AlreadyTracing);
        }
        info!("Starting profiler session");
        self.builder = TreeBuilder::new();
        self.inventory.start_tracking();
        self.state = SessionState::Tracing;
        Ok(())
    }

    /// Consume one call event from the event source.
    ///
    /// Events arriving while the session is idle are dropped - the source
    /// should not be enabled outside a trace, but a stray event is not
    /// worth failing over.
    ///
    /// # Errors
    /// * `SessionError::Trace` - the stream is malformed (unmatched return)
    pub fn observe(&mut self, event: &CallEvent) -> Result<(), SessionError> {
        if self.state == SessionState::Idle {
            debug!("dropping event outside trace: {:?}", event);
            return Ok(());
        }
        self.builder.observe(event)?;
        Ok(())
    }

    /// Stop tracing and hand the finished tree to the caller.
    ///
    /// Idempotent: returns `None` when already idle. Inventory bookkeeping
    /// is discarded; the returned tree is the caller's to keep.
    pub fn stop(&mut self) -> Option<CallTree> {
        if self.state == SessionState::Idle {
            return None;
        }
        info!("Stopping profiler session");
        self.inventory.stop_tracking();
        self.inventory.clear();
        self.state = SessionState::Idle;
        Some(std::mem::take(&mut self.builder).finish())
    }

    /// Produce one report without ending the trace.
    ///
    /// Pauses inventory tracking, snapshots the live objects and the tree
    /// built so far, aggregates, filters, attributes, and emits to the
    /// configured sink. Tracking resumes whether or not the inner pipeline
    /// succeeded. The annotated snapshot is discarded after emission; the
    /// live tree is never mutated, so repeated reports do not accumulate
    /// stale attributions.
    ///
    /// # Errors
    /// * `SessionError::NotTracing` - no trace is active
    /// * `SessionError::ReportInProgress` - reentrant call
    /// * `SessionError::Output` - the sink rejected the report
    pub fn report(&mut self) -> Result<Report, SessionError> {
        match self.state {
            SessionState::Idle => return Err(SessionError::NotTracing),
            SessionState::Reporting => return Err(SessionError::ReportInProgress),
            SessionState::Tracing => {}
        }

        self.state = SessionState::Reporting;
        self.inventory.stop_tracking();

        let result = self.run_report_pipeline();

        // Cleanup runs regardless of the pipeline outcome.
        self.inventory.start_tracking();
        self.state = SessionState::Tracing;

        result
    }

    fn run_report_pipeline(&mut self) -> Result<Report, SessionError> {
        let objects = self.inventory.live_objects();
        debug!("inventory returned {} live objects", objects.len());

        let filtered: Vec<HeapObject> = objects
            .into_iter()
            .filter(|o| {
                o.file
                    .as_deref()
                    .is_some_and(|f| self.config.includes_file(f))
            })
            .collect();

        let records = aggregate_objects(&filtered);
        let total_bytes = records.iter().map(|r| r.total_bytes).sum();

        let mut tree = self.builder.snapshot();
        let outcome = attribute_all(&records, &mut tree);
        info!(
            "attributed {} records ({} dropped, {} bytes total)",
            outcome.attached, outcome.dropped, total_bytes
        );

        let report = Report::new(tree, total_bytes, outcome);
        self.emit(&report)?;
        Ok(report)
    }

    fn emit(&self, report: &Report) -> Result<(), OutputError> {
        match self.config.output() {
            OutputTarget::Stdout => {
                let stdout = std::io::stdout();
                let mut lock = stdout.lock();
                json::write_report_to(report, &mut lock)?;
                lock.flush().map_err(OutputError::WriteFailed)
            }
            OutputTarget::File(path) => json::write_report(report, path),
        }
    }
}
