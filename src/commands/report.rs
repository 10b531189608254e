//! Report command implementation.
//!
//! The report command:
//! 1. Loads a recorded capture file
//! 2. Replays its call events through a profiler session
//! 3. Runs one report (aggregate, filter, attribute, emit JSON)
//! 4. Optionally writes an SVG flamegraph and a text summary

use crate::capture::{CaptureFile, RecordedInventory};
use crate::report::{generate_flamegraph, render_summary, write_svg, FlamegraphConfig};
use crate::session::{OutputTarget, ProfilerSession, SessionOptions};
use anyhow::{Context, Result};
use log::{debug, info};
use std::path::PathBuf;

/// Default number of rows in the text summary's top-sites table
const SUMMARY_SITES: usize = 10;

/// Arguments for the report command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone, Default)]
pub struct ReportArgs {
    /// Path to the recorded capture file
    pub capture: PathBuf,

    /// Output path for the JSON report (stdout when absent)
    pub output: Option<PathBuf>,

    /// Output path for an SVG flamegraph (optional)
    pub flamegraph: Option<PathBuf>,

    /// Flamegraph title override
    pub title: Option<String>,

    /// Print a text summary to stdout
    pub print_summary: bool,

    /// Only include records whose file matches this pattern
    pub trace: Option<String>,

    /// Exclude records whose file matches this pattern
    pub ignore: Option<String>,
}

/// Validate report arguments
///
/// **Public** - called before execute_report for early validation
pub fn validate_args(args: &ReportArgs) -> Result<()> {
    if args.capture.as_os_str().is_empty() {
        anyhow::bail!("Capture path cannot be empty");
    }

    if !args.capture.exists() {
        anyhow::bail!("Capture file not found: {}", args.capture.display());
    }

    Ok(())
}

/// Execute the report command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Capture load or parse failures
/// * Invalid trace/ignore patterns
/// * Malformed event streams (unmatched returns)
/// * File write errors
pub fn execute_report(args: ReportArgs) -> Result<()> {
    info!("Replaying capture: {}", args.capture.display());

    // Step 1: Load the capture
    let capture = CaptureFile::from_path(&args.capture)
        .context("Failed to load capture file")?;

    // Step 2: Build and configure the session
    let inventory = RecordedInventory::new(capture.objects);
    let mut session = ProfilerSession::new(inventory);

    let output = match &args.output {
        Some(path) => OutputTarget::File(path.clone()),
        None => OutputTarget::Stdout,
    };
    session
        .configure(SessionOptions {
            trace: args.trace.clone(),
            ignore: args.ignore.clone(),
            output: Some(output),
        })
        .context("Invalid filter configuration")?;

    // Step 3: Replay the event stream
    session.start().context("Failed to start session")?;
    for event in &capture.events {
        session
            .observe(event)
            .with_context(|| format!("Malformed event stream at {}", event.location()))?;
    }
    debug!("Replayed {} events", capture.events.len());

    // Step 4: Produce the report
    let report = session.report().context("Report pipeline failed")?;

    if let Some(path) = &args.output {
        info!("✓ Report written to: {}", path.display());
    }

    // Step 5: Optional flamegraph
    if let Some(svg_path) = &args.flamegraph {
        let mut config = FlamegraphConfig::new();
        if let Some(title) = &args.title {
            config = config.with_title(title.clone());
        }
        let svg = generate_flamegraph(&report, Some(&config))
            .context("Failed to generate flamegraph")?;
        write_svg(&svg, svg_path).context("Failed to write flamegraph SVG")?;
        info!("✓ Flamegraph written to: {}", svg_path.display());
    }

    // Step 6: Optional text summary
    if args.print_summary {
        println!("\n{}", "=".repeat(80));
        println!("MEMORY REPORT");
        println!("{}", "=".repeat(80));
        println!("{}", render_summary(&report, SUMMARY_SITES));
        println!("{}", "=".repeat(80));
    }

    session.stop();
    Ok(())
}
