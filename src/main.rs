//! Memtrace CLI
//!
//! Replays recorded allocation captures and produces memory reports:
//! annotated call trees, text summaries, and flamegraphs.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use memtrace::commands::{execute_report, validate_args, ReportArgs};

/// Memtrace - allocation profiling with call-tree attribution
#[derive(Parser, Debug)]
#[command(name = "memtrace")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a recorded capture and produce a memory report
    Report {
        /// Path to the recorded capture file (JSON)
        #[arg(short, long)]
        capture: PathBuf,

        /// Output path for the JSON report (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output path for an SVG flamegraph (optional)
        #[arg(short, long)]
        flamegraph: Option<PathBuf>,

        /// Flamegraph title
        #[arg(long)]
        title: Option<String>,

        /// Print a text summary to stdout
        #[arg(long)]
        summary: bool,

        /// Only include records whose file matches this pattern
        #[arg(long)]
        trace: Option<String>,

        /// Exclude records whose file matches this pattern
        #[arg(long)]
        ignore: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Default to info; --verbose turns on debug for our own modules.
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    match cli.command {
        Commands::Report {
            capture,
            output,
            flamegraph,
            title,
            summary,
            trace,
            ignore,
        } => {
            let args = ReportArgs {
                capture,
                output,
                flamegraph,
                title,
                print_summary: summary,
                trace,
                ignore,
            };
            validate_args(&args)?;
            execute_report(args)
        }
    }
}
