//! Attach allocation records to the most specific enclosing frame.
//!
//! Matching is by file plus strict line containment. Sibling frames are
//! probed in list order and the first match wins; once a frame matches,
//! only its children are considered for a deeper home. Frames from other
//! files are still descended into, since a call can cross files and the
//! matching frame may sit below a non-matching one.

use super::record::AllocationRecord;
use crate::tracer::{CallTree, Frame};
use log::debug;

/// Result of attributing one record set into a tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttributionOutcome {
    /// Records attached to some frame
    pub attached: usize,

    /// Records with no matching frame (not an error; left out of the report)
    pub dropped: usize,
}

/// Attribute one record into a frame list.
///
/// **Public** - also used directly by tests; sessions call `attribute_all`
///
/// Returns true if some frame in `frames` (or its descendants) claimed the
/// record. A false return means no match anywhere in the list and is a
/// valid outcome, not an error.
pub fn attribute_record(record: &AllocationRecord, frames: &mut [Frame]) -> bool {
    for frame in frames.iter_mut() {
        if frame.file == record.location.file
            && frame.start_line < record.location.line
            && record.location.line < frame.end_line
        {
            // A deeper frame gets first claim; otherwise this one takes it.
            if !attribute_record(record, &mut frame.children) {
                frame.allocations.push(record.clone());
            }
            return true;
        }

        // No match here, but a nested call may live in the record's file.
        if attribute_record(record, &mut frame.children) {
            return true;
        }
    }
    false
}

/// Attribute every record into the tree, counting drops
///
/// **Public** - main entry point for the report pipeline
pub fn attribute_all(records: &[AllocationRecord], tree: &mut CallTree) -> AttributionOutcome {
    let mut outcome = AttributionOutcome::default();
    for record in records {
        if attribute_record(record, &mut tree.roots) {
            outcome.attached += 1;
        } else {
            debug!(
                "no frame for {} ({}, {} bytes); dropping",
                record.location, record.class_name, record.total_bytes
            );
            outcome.dropped += 1;
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracer::SourceLocation;

    fn frame(file: &str, start: u32, end: u32, method: &str, children: Vec<Frame>) -> Frame {
        Frame {
            file: file.to_string(),
            start_line: start,
            end_line: end,
            method: method.to_string(),
            synthetic: false,
            children,
            allocations: Vec::new(),
        }
    }

    fn record(file: &str, line: u32, class: &str, bytes: u64) -> AllocationRecord {
        AllocationRecord {
            location: SourceLocation::new(file, line),
            class_name: class.to_string(),
            total_bytes: bytes,
        }
    }

    /// outer(a.rb, 1..10) containing inner(a.rb, 2..5)
    fn nested_tree() -> CallTree {
        CallTree {
            roots: vec![frame(
                "a.rb",
                1,
                10,
                "outer",
                vec![frame("a.rb", 2, 5, "inner", vec![])],
            )],
        }
    }

    #[test]
    fn test_record_lands_in_innermost_frame() {
        let mut tree = nested_tree();
        assert!(attribute_record(&record("a.rb", 3, "String", 40), &mut tree.roots));

        let outer = &tree.roots[0];
        assert!(outer.allocations.is_empty());
        assert_eq!(outer.children[0].allocations.len(), 1);
        assert_eq!(outer.children[0].allocations[0].class_name, "String");
    }

    #[test]
    fn test_record_falls_back_to_outer_frame() {
        // Line 7 misses inner (2..5) but sits inside outer (1..10).
        let mut tree = nested_tree();
        assert!(attribute_record(&record("a.rb", 7, "Array", 16), &mut tree.roots));

        let outer = &tree.roots[0];
        assert_eq!(outer.allocations.len(), 1);
        assert_eq!(outer.allocations[0].class_name, "Array");
        assert!(outer.children[0].allocations.is_empty());
    }

    #[test]
    fn test_containment_is_strict() {
        // Lines equal to a boundary do not match.
        let mut tree = nested_tree();
        assert!(attribute_record(&record("a.rb", 2, "String", 8), &mut tree.roots));
        // 2 is inner's start line, so outer claims it.
        assert_eq!(tree.roots[0].allocations.len(), 1);
    }

    #[test]
    fn test_unmatched_record_is_dropped() {
        let mut tree = nested_tree();
        let outcome = attribute_all(&[record("other.rb", 3, "String", 40)], &mut tree);
        assert_eq!(outcome, AttributionOutcome { attached: 0, dropped: 1 });
        assert_eq!(tree.roots[0].subtree_bytes(), 0);
    }

    #[test]
    fn test_first_matching_sibling_wins() {
        // Two siblings with overlapping ranges; list order decides.
        let mut tree = CallTree {
            roots: vec![
                frame("a.rb", 1, 10, "first", vec![]),
                frame("a.rb", 1, 10, "second", vec![]),
            ],
        };
        assert!(attribute_record(&record("a.rb", 5, "String", 40), &mut tree.roots));
        assert_eq!(tree.roots[0].allocations.len(), 1);
        assert!(tree.roots[1].allocations.is_empty());
    }

    #[test]
    fn test_cross_file_frame_is_descended_into() {
        // b.rb call nested inside an a.rb frame; the a.rb frame never
        // matches, but its child does.
        let mut tree = CallTree {
            roots: vec![frame(
                "a.rb",
                1,
                10,
                "caller",
                vec![frame("b.rb", 1, 20, "callee", vec![])],
            )],
        };
        let outcome = attribute_all(&[record("b.rb", 5, "Hash", 96)], &mut tree);
        assert_eq!(outcome.attached, 1);
        assert_eq!(tree.roots[0].children[0].allocations.len(), 1);
    }

    #[test]
    fn test_attribution_is_deterministic() {
        let records = vec![
            record("a.rb", 3, "String", 40),
            record("a.rb", 7, "Array", 16),
            record("other.rb", 1, "Hash", 96),
        ];

        let mut first = nested_tree();
        let mut second = nested_tree();
        let outcome_a = attribute_all(&records, &mut first);
        let outcome_b = attribute_all(&records, &mut second);

        assert_eq!(outcome_a, outcome_b);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_tree_drops_everything() {
        let mut tree = CallTree::default();
        let outcome = attribute_all(&[record("a.rb", 3, "String", 40)], &mut tree);
        assert_eq!(outcome.dropped, 1);
    }
}
