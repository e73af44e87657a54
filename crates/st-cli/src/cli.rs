//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Per-workspace time tracker.
///
/// Accrues idle-capped working time per project folder from save events
/// and reports it by day, week, month or year.
#[derive(Debug, Parser)]
#[command(name = "spacetime", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Track activity events read as JSON lines from stdin.
    Track {
        /// Open workspace folder (repeatable). Overrides configured folders.
        #[arg(long = "folder", value_name = "PATH")]
        folders: Vec<PathBuf>,

        /// Idle threshold in minutes. Overrides the configured value.
        #[arg(long, value_name = "MINUTES")]
        idle_minutes: Option<f64>,
    },

    /// Show time per workspace over a date range.
    Report {
        /// First day of the range: YYYY-MM-DD, today, yesterday or "N days ago".
        #[arg(long)]
        start: Option<String>,

        /// Last day of the range (inclusive). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Bucket size: daily, weekly, monthly or yearly.
        #[arg(long, default_value = "daily")]
        group: String,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the stored per-day totals as JSON.
    Export,
}
