//! Reconstruct a call tree from a flat stream of call/return events.
//!
//! The builder keeps an explicit stack of entries, each either an open-call
//! marker or a completed frame. A return event folds every completed frame
//! above the nearest marker into the children of the frame it closes, so
//! the stack always mirrors the calls still in flight.
//!
//! Example: `CALL(a.rb,1) CALL(a.rb,2) RETURN(a.rb,5,inner) RETURN(a.rb,10,outer)`
//! yields one root frame `outer` spanning 1..10 with one child `inner`
//! spanning 2..5.

use super::event::{CallEvent, SourceLocation};
use crate::attribution::AllocationRecord;
use crate::utils::config::UNKNOWN_METHOD_NAME;
use crate::utils::error::TraceError;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// One completed call invocation.
///
/// `start_line` is the line of the CALL event, `end_line` the line of the
/// matching RETURN. Children are in execution order. Allocations are empty
/// until an attributor fills them in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Source file, as reported at return time
    pub file: String,

    /// Line of the CALL event
    #[serde(rename = "start")]
    pub start_line: u32,

    /// Line of the matching RETURN event
    #[serde(rename = "end")]
    pub end_line: u32,

    /// Method name, known at return time
    pub method: String,

    /// True for frames closed synthetically at end of trace
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub synthetic: bool,

    /// Nested invocations that completed inside this frame, in execution order
    #[serde(default)]
    pub children: Vec<Frame>,

    /// Allocation records attributed to this frame
    #[serde(default)]
    pub allocations: Vec<AllocationRecord>,
}

impl Frame {
    /// Total number of frames in this subtree, including self
    pub fn subtree_size(&self) -> usize {
        1 + self.children.iter().map(Frame::subtree_size).sum::<usize>()
    }

    /// Bytes attributed to this subtree, including self
    pub fn subtree_bytes(&self) -> u64 {
        let own: u64 = self.allocations.iter().map(|r| r.total_bytes).sum();
        own + self.children.iter().map(Frame::subtree_bytes).sum::<u64>()
    }
}

/// The ordered forest of top-level frames built from one trace
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallTree {
    /// Top-level frames in execution order
    pub roots: Vec<Frame>,
}

impl CallTree {
    /// Total number of frames in the forest
    pub fn frame_count(&self) -> usize {
        self.roots.iter().map(Frame::subtree_size).sum()
    }

    /// True if no frame was ever completed
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

/// Working-stack entry: a call still open, or an invocation already closed
#[derive(Debug, Clone)]
enum StackEntry {
    Open(SourceLocation),
    Closed(Frame),
}

/// Incremental call-tree builder.
///
/// **Public** - fed by the profiler session while tracing is active
///
/// Events whose location lies inside the profiler itself must be excluded
/// by the event source; the builder assumes a pre-filtered stream.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    stack: Vec<StackEntry>,
}

impl TreeBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one event.
    ///
    /// # Errors
    /// * `TraceError::UnmatchedReturn` - a return event arrived with no
    ///   open call on the stack. The builder state is left untouched, so a
    ///   caller may keep feeding events after reporting the violation.
    pub fn observe(&mut self, event: &CallEvent) -> Result<(), TraceError> {
        match event {
            CallEvent::Call { file, line } => {
                self.stack.push(StackEntry::Open(SourceLocation::new(file.clone(), *line)));
                Ok(())
            }
            CallEvent::Return { file, line, method } => self.close_frame(file, *line, method),
        }
    }

    /// Close the innermost open call with a return event
    fn close_frame(&mut self, file: &str, line: u32, method: &str) -> Result<(), TraceError> {
        // Completed frames above the nearest marker are the invocations
        // that ran to completion inside the frame being closed.
        let mut children = Vec::new();
        while matches!(self.stack.last(), Some(StackEntry::Closed(_))) {
            if let Some(StackEntry::Closed(frame)) = self.stack.pop() {
                children.push(frame);
            }
        }

        // After draining closed frames the top is either a marker or nothing.
        match self.stack.pop() {
            Some(StackEntry::Open(marker)) => {
                // Popped most-recent-first; restore execution order.
                children.reverse();
                debug!(
                    "closing frame {} at {}:{} (start {}, {} children)",
                    method,
                    file,
                    line,
                    marker.line,
                    children.len()
                );
                self.stack.push(StackEntry::Closed(Frame {
                    file: file.to_string(),
                    start_line: marker.line,
                    end_line: line,
                    method: method.to_string(),
                    synthetic: false,
                    children,
                    allocations: Vec::new(),
                }));
                Ok(())
            }
            Some(entry @ StackEntry::Closed(_)) => {
                // Unreachable given the drain above; keep the stack intact anyway.
                self.stack.push(entry);
                self.restore(children);
                Err(TraceError::UnmatchedReturn {
                    location: SourceLocation::new(file, line),
                })
            }
            None => {
                self.restore(children);
                Err(TraceError::UnmatchedReturn {
                    location: SourceLocation::new(file, line),
                })
            }
        }
    }

    /// Push drained frames back after a protocol violation
    fn restore(&mut self, children: Vec<Frame>) {
        for frame in children.into_iter().rev() {
            self.stack.push(StackEntry::Closed(frame));
        }
    }

    /// Number of calls still open
    pub fn open_calls(&self) -> usize {
        self.stack
            .iter()
            .filter(|e| matches!(e, StackEntry::Open(_)))
            .count()
    }

    /// Forest built so far, without disturbing the builder.
    ///
    /// Calls still open are closed synthetically: the frame gets the
    /// unknown-method label, a `synthetic` flag, and an end line taken from
    /// its deepest completed child (or its own call line).
    pub fn snapshot(&self) -> CallTree {
        finalize(self.stack.clone())
    }

    /// Consume the builder and produce the final forest
    pub fn finish(self) -> CallTree {
        finalize(self.stack)
    }
}

/// Collapse a working stack into a forest, closing open markers synthetically
fn finalize(stack: Vec<StackEntry>) -> CallTree {
    // Walk from the top of the stack down. Everything above an open marker
    // happened inside that still-open call, so it becomes the marker's
    // children when the marker is closed synthetically.
    let mut pending: Vec<Frame> = Vec::new();
    for entry in stack.into_iter().rev() {
        match entry {
            StackEntry::Closed(frame) => pending.push(frame),
            StackEntry::Open(marker) => {
                warn!("call at {} never returned; closing synthetically", marker);
                let mut children: Vec<Frame> = std::mem::take(&mut pending);
                children.reverse();
                // Never below the call line: a cross-file child can end at
                // a smaller line number than the marker's own.
                let end_line = children
                    .iter()
                    .map(|c| c.end_line)
                    .max()
                    .map_or(marker.line, |max_end| max_end.max(marker.line));
                pending.push(Frame {
                    file: marker.file,
                    start_line: marker.line,
                    end_line,
                    method: UNKNOWN_METHOD_NAME.to_string(),
                    synthetic: true,
                    children,
                    allocations: Vec::new(),
                });
            }
        }
    }
    pending.reverse();
    CallTree { roots: pending }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested_events() -> Vec<CallEvent> {
        vec![
            CallEvent::call("a.rb", 1),
            CallEvent::call("a.rb", 2),
            CallEvent::ret("a.rb", 5, "inner"),
            CallEvent::ret("a.rb", 10, "outer"),
        ]
    }

    fn feed(builder: &mut TreeBuilder, events: &[CallEvent]) {
        for event in events {
            builder.observe(event).unwrap();
        }
    }

    #[test]
    fn test_nested_calls_build_one_root() {
        let mut builder = TreeBuilder::new();
        feed(&mut builder, &nested_events());

        let tree = builder.finish();
        assert_eq!(tree.roots.len(), 1);

        let outer = &tree.roots[0];
        assert_eq!(outer.file, "a.rb");
        assert_eq!(outer.start_line, 1);
        assert_eq!(outer.end_line, 10);
        assert_eq!(outer.method, "outer");
        assert!(!outer.synthetic);
        assert_eq!(outer.children.len(), 1);

        let inner = &outer.children[0];
        assert_eq!(inner.start_line, 2);
        assert_eq!(inner.end_line, 5);
        assert_eq!(inner.method, "inner");
        assert!(inner.children.is_empty());
    }

    #[test]
    fn test_sibling_calls_stay_in_execution_order() {
        let mut builder = TreeBuilder::new();
        feed(
            &mut builder,
            &[
                CallEvent::call("a.rb", 1),
                CallEvent::call("a.rb", 2),
                CallEvent::ret("a.rb", 3, "first"),
                CallEvent::call("a.rb", 4),
                CallEvent::ret("a.rb", 5, "second"),
                CallEvent::ret("a.rb", 10, "outer"),
            ],
        );

        let tree = builder.finish();
        let outer = &tree.roots[0];
        let names: Vec<&str> = outer.children.iter().map(|c| c.method.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn test_frame_count_matches_returns() {
        // Forest completeness: with no unmatched calls, one frame per return.
        let mut builder = TreeBuilder::new();
        feed(
            &mut builder,
            &[
                CallEvent::call("a.rb", 1),
                CallEvent::ret("a.rb", 2, "a"),
                CallEvent::call("a.rb", 3),
                CallEvent::call("a.rb", 4),
                CallEvent::ret("a.rb", 5, "b"),
                CallEvent::ret("a.rb", 6, "c"),
            ],
        );
        let tree = builder.finish();
        assert_eq!(tree.frame_count(), 3);
        assert_eq!(tree.roots.len(), 2);
    }

    #[test]
    fn test_return_without_call_is_a_protocol_error() {
        let mut builder = TreeBuilder::new();
        let err = builder
            .observe(&CallEvent::ret("a.rb", 5, "orphan"))
            .unwrap_err();
        let TraceError::UnmatchedReturn { location } = err;
        assert_eq!(location, SourceLocation::new("a.rb", 5));

        // The builder stays usable after the violation.
        feed(&mut builder, &nested_events());
        assert_eq!(builder.finish().frame_count(), 2);
    }

    #[test]
    fn test_return_past_completed_roots_is_a_protocol_error() {
        let mut builder = TreeBuilder::new();
        feed(
            &mut builder,
            &[CallEvent::call("a.rb", 1), CallEvent::ret("a.rb", 2, "a")],
        );
        assert!(builder.observe(&CallEvent::ret("a.rb", 3, "b")).is_err());
        // The completed root survives the failed return.
        assert_eq!(builder.finish().frame_count(), 1);
    }

    #[test]
    fn test_unmatched_call_closes_synthetically() {
        let mut builder = TreeBuilder::new();
        builder.observe(&CallEvent::call("a.rb", 1)).unwrap();
        feed(
            &mut builder,
            &[
                CallEvent::call("a.rb", 3),
                CallEvent::ret("a.rb", 6, "done"),
            ],
        );

        let tree = builder.finish();
        assert_eq!(tree.roots.len(), 1);

        let root = &tree.roots[0];
        assert!(root.synthetic);
        assert_eq!(root.method, UNKNOWN_METHOD_NAME);
        assert_eq!(root.start_line, 1);
        // End line borrowed from the deepest completed child.
        assert_eq!(root.end_line, 6);
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].method, "done");
    }

    #[test]
    fn test_synthetic_close_spans_cross_file_child() {
        // The child lives in another file and ends at a smaller line
        // number than the call itself; the synthetic span must stay valid.
        let mut builder = TreeBuilder::new();
        builder.observe(&CallEvent::call("a.rb", 9)).unwrap();
        feed(
            &mut builder,
            &[
                CallEvent::call("b.rb", 1),
                CallEvent::ret("b.rb", 3, "helper"),
            ],
        );

        let tree = builder.finish();
        let root = &tree.roots[0];
        assert!(root.synthetic);
        assert_eq!(root.start_line, 9);
        assert_eq!(root.end_line, 9);
        assert!(root.start_line <= root.end_line);
    }

    #[test]
    fn test_snapshot_leaves_builder_intact() {
        let mut builder = TreeBuilder::new();
        builder.observe(&CallEvent::call("a.rb", 1)).unwrap();

        let mid = builder.snapshot();
        assert_eq!(mid.frame_count(), 1);
        assert!(mid.roots[0].synthetic);
        assert_eq!(builder.open_calls(), 1);

        // The open call can still be closed for real afterwards.
        builder.observe(&CallEvent::ret("a.rb", 9, "outer")).unwrap();
        let tree = builder.finish();
        assert!(!tree.roots[0].synthetic);
        assert_eq!(tree.roots[0].method, "outer");
    }

    #[test]
    fn test_empty_stream_yields_empty_forest() {
        let tree = TreeBuilder::new().finish();
        assert!(tree.is_empty());
        assert_eq!(tree.frame_count(), 0);
    }

    #[test]
    fn test_synthetic_flag_omitted_for_real_frames() {
        let mut builder = TreeBuilder::new();
        feed(&mut builder, &nested_events());
        let json = serde_json::to_value(builder.finish()).unwrap();
        assert!(json["roots"][0].get("synthetic").is_none());
    }
}
