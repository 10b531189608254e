//! Human-readable text summary of a report.
//!
//! Renders the annotated call tree as an indented listing plus a table of
//! the heaviest allocation sites.

use super::schema::Report;
use crate::attribution::AllocationRecord;
use crate::tracer::Frame;

/// Render a terminal-friendly summary
///
/// **Public** - used by the CLI's `--summary` flag
///
/// # Arguments
/// * `report` - annotated report
/// * `max_sites` - number of rows in the top-sites table
pub fn render_summary(report: &Report, max_sites: usize) -> String {
    let mut lines = Vec::new();

    lines.push(format!(
        "CALL TREE ({} records, {} dropped, {} bytes live)",
        report.record_count,
        report.dropped_records,
        report.total_bytes
    ));

    if report.roots.is_empty() {
        lines.push("  (no frames traced)".to_string());
    }
    for root in &report.roots {
        render_frame(root, 0, &mut lines);
    }

    lines.push(String::new());
    lines.push("TOP ALLOCATION SITES".to_string());
    lines.push(format!(
        "  {:<40} {:<20} {:>12}",
        "Site", "Class", "Bytes"
    ));

    let mut sites: Vec<&AllocationRecord> = Vec::new();
    for root in &report.roots {
        collect_records(root, &mut sites);
    }
    sites.sort_by(|a, b| b.total_bytes.cmp(&a.total_bytes));

    if sites.is_empty() {
        lines.push("  (nothing attributed)".to_string());
    }
    for record in sites.iter().take(max_sites) {
        lines.push(format!(
            "  {:<40} {:<20} {:>12}",
            record.location.to_string(),
            record.class_name,
            record.total_bytes
        ));
    }

    if sites.len() > max_sites {
        lines.push(format!(
            "  (showing top {} of {} sites)",
            max_sites,
            sites.len()
        ));
    }

    lines.join("\n")
}

fn render_frame(frame: &Frame, depth: usize, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth + 1);
    let marker = if frame.synthetic { " [never returned]" } else { "" };
    lines.push(format!(
        "{}{} ({}:{}-{}) {} bytes{}",
        indent,
        frame.method,
        frame.file,
        frame.start_line,
        frame.end_line,
        frame.subtree_bytes(),
        marker
    ));
    for record in &frame.allocations {
        lines.push(format!(
            "{}  * {} {} bytes at line {}",
            indent, record.class_name, record.total_bytes, record.location.line
        ));
    }
    for child in &frame.children {
        render_frame(child, depth + 1, lines);
    }
}

fn collect_records<'a>(frame: &'a Frame, out: &mut Vec<&'a AllocationRecord>) {
    out.extend(frame.allocations.iter());
    for child in &frame.children {
        collect_records(child, out);
    }
}
