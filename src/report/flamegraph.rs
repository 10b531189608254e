//! SVG memory flamegraph generation.
//!
//! Renders the annotated call tree as a flamegraph where frame width is
//! proportional to attributed bytes (subtree-inclusive). Inverted layout,
//! roots at the bottom.

use super::schema::Report;
use crate::tracer::Frame;
use crate::utils::error::FlamegraphError;
use log::info;

const HEIGHT_PER_LEVEL: usize = 20;
const TITLE_MARGIN: usize = 30;

/// Flamegraph configuration
#[derive(Debug, Clone)]
pub struct FlamegraphConfig {
    pub title: String,
    pub width: usize,
}

impl Default for FlamegraphConfig {
    fn default() -> Self {
        Self {
            title: "Live Memory by Call Frame".to_string(),
            width: 1200,
        }
    }
}

impl FlamegraphConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }
}

/// Generate an SVG flamegraph from an annotated report
///
/// **Public** - main entry point for flamegraph generation
///
/// # Errors
/// * `FlamegraphError::EmptyReport` - no bytes were attributed anywhere
pub fn generate_flamegraph(
    report: &Report,
    config: Option<&FlamegraphConfig>,
) -> Result<String, FlamegraphError> {
    let total_bytes = report.attributed_bytes();
    if total_bytes == 0 {
        return Err(FlamegraphError::EmptyReport);
    }

    let config = config.cloned().unwrap_or_default();
    info!(
        "Generating flamegraph: {} bytes across {} roots",
        total_bytes,
        report.roots.len()
    );

    let max_depth = report.roots.iter().map(frame_depth).max().unwrap_or(1);
    let width = config.width;
    let graph_height = (max_depth + 1) * HEIGHT_PER_LEVEL;
    let legend_height = 60;
    let total_height = graph_height + TITLE_MARGIN + legend_height;

    let mut svg = String::new();

    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
        width, total_height, width, total_height
    ));

    svg.push_str(
        r#"<style>.func { font: 12px sans-serif; } .func:hover { stroke: black; stroke-width: 1; cursor: pointer; opacity: 0.9; }</style>"#,
    );

    svg.push_str(&format!(
        r#"<text x="{}" y="20" font-size="16" text-anchor="middle" font-weight="bold">{}</text>"#,
        width / 2,
        escape_xml(&config.title)
    ));

    // Synthetic root row covering all top-level frames (inverted: bottom).
    let root_y = graph_height - HEIGHT_PER_LEVEL + TITLE_MARGIN;
    svg.push_str(&format!(
        r#"<rect x="0" y="{}" width="{}" height="{}" fill="rgb(100, 149, 237)" class="func"><title>all ({} bytes)</title></rect>"#,
        root_y, width, HEIGHT_PER_LEVEL, total_bytes
    ));

    // Lay roots out side by side, width proportional to their share.
    let mut current_x = 0.0;
    for root in &report.roots {
        let root_w = (root.subtree_bytes() as f64 / total_bytes as f64) * width as f64;
        render_frame(root, 1, current_x, root_w, total_bytes, &mut svg, graph_height);
        current_x += root_w;
    }

    render_legend(&mut svg, graph_height + TITLE_MARGIN);

    svg.push_str("</svg>");

    info!("Flamegraph generated successfully ({} bytes of SVG)", svg.len());
    Ok(svg)
}

fn frame_depth(frame: &Frame) -> usize {
    1 + frame.children.iter().map(frame_depth).max().unwrap_or(0)
}

/// Color by what the frame represents: synthetic closures gray, frames with
/// allocations of their own orange, structural frames blue.
fn frame_color(frame: &Frame) -> &'static str {
    if frame.synthetic {
        "rgb(169, 169, 169)" // Gray
    } else if !frame.allocations.is_empty() {
        "rgb(255, 140, 0)" // Dark Orange
    } else {
        "rgb(70, 130, 180)" // Steel Blue
    }
}

fn render_frame(
    frame: &Frame,
    level: usize,
    x: f64,
    w: f64,
    total_bytes: u64,
    out: &mut String,
    graph_height: usize,
) {
    if w < 0.5 {
        return; // Don't render invisible blocks
    }

    let bytes = frame.subtree_bytes();
    let percentage = (bytes as f64 / total_bytes as f64) * 100.0;

    // Inverted layout: deeper frames sit higher.
    let y = graph_height - ((level + 1) * HEIGHT_PER_LEVEL) + TITLE_MARGIN;

    out.push_str(&format!(
        r#"<rect x="{:.2}" y="{}" width="{:.2}" height="{}" fill="{}" class="func"><title>{} {}:{}-{} ({} bytes, {:.1}%)</title></rect>"#,
        x,
        y,
        w,
        HEIGHT_PER_LEVEL,
        frame_color(frame),
        escape_xml(&frame.method),
        escape_xml(&frame.file),
        frame.start_line,
        frame.end_line,
        bytes,
        percentage
    ));

    if w > 35.0 {
        let char_width = 7.0;
        let max_chars = (w / char_width) as usize;
        // Truncate by chars, not bytes; method names can be non-ASCII.
        let display_name = if frame.method.chars().count() > max_chars && max_chars > 3 {
            let head: String = frame.method.chars().take(max_chars - 3).collect();
            format!("{}...", head)
        } else {
            frame.method.clone()
        };

        out.push_str(&format!(
            r#"<text x="{:.2}" y="{}" dx="4" dy="14" font-size="12" fill="white" pointer-events="none">{}</text>"#,
            x,
            y,
            escape_xml(&display_name)
        ));
    }

    // Children share the parent's width by their byte share. Allocation-free
    // branches collapse to zero width and disappear.
    let mut current_x = x;
    for child in &frame.children {
        let child_bytes = child.subtree_bytes();
        if bytes == 0 {
            continue;
        }
        let child_w = (child_bytes as f64 / bytes as f64) * w;
        render_frame(child, level + 1, current_x, child_w, total_bytes, out, graph_height);
        current_x += child_w;
    }
}

fn render_legend(out: &mut String, legend_y: usize) {
    let y = legend_y + 40;

    out.push_str(&format!(
        r#"<text x="10" y="{}" font-size="14" font-weight="bold">Legend:</text>"#,
        y
    ));

    let items = [
        ("Allocating frame", "rgb(255, 140, 0)"),
        ("Structural frame", "rgb(70, 130, 180)"),
        ("Synthetic (never returned)", "rgb(169, 169, 169)"),
    ];

    for (i, (label, color)) in items.iter().enumerate() {
        let x = 80 + (i * 220);
        out.push_str(&format!(
            r#"<rect x="{}" y="{}" width="15" height="15" fill="{}" rx="2"/>"#,
            x,
            y - 12,
            color
        ));
        out.push_str(&format!(
            r#"<text x="{}" y="{}" font-size="12">{}</text>"#,
            x + 20,
            y,
            label
        ));
    }
}

fn escape_xml(raw: &str) -> String {
    raw.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
