//! Call event types and call-tree reconstruction.
//!
//! This module turns the flat stream of call/return notifications delivered
//! by an event source into a nested tree of frames:
//! - Event and location types (serde, shared with the capture format)
//! - The tree builder and its explicit open-marker/closed-frame stack

pub mod event;
pub mod tree_builder;

// Re-export main types
pub use event::{CallEvent, SourceLocation};
pub use tree_builder::{CallTree, Frame, TreeBuilder};
