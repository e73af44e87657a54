use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use st_cli::commands::{export, report, track, util};
use st_cli::{Cli, Commands, Config};
use st_core::{AccrualEngine, Clock, Granularity, IdleThreshold, SystemClock, WorkspaceFolders};
use st_store::Database;

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr so report/export output stays parseable
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let clock = SystemClock;

    match &cli.command {
        Some(Commands::Track {
            folders,
            idle_minutes,
        }) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            let roots = if folders.is_empty() {
                config.folders.clone()
            } else {
                folders.clone()
            };
            let folders = WorkspaceFolders::from_roots(roots);
            if folders.is_empty() {
                tracing::warn!("no workspace folders open, every event will be dropped");
            }
            let idle = idle_minutes.map_or_else(
                || config.idle_threshold(),
                |minutes| IdleThreshold::from_minutes(Some(minutes)),
            );

            let mut tracker =
                track::Tracker::start(AccrualEngine::new(), db, folders, idle, clock)?;
            let summary = tracker.run(io::stdin().lock())?;
            tracing::info!(
                events = summary.events,
                dropped = summary.dropped,
                malformed = summary.malformed,
                accruals = summary.accruals,
                seconds = summary.seconds,
                "tracking session ended"
            );
        }
        Some(Commands::Report {
            start,
            end,
            group,
            json,
        }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            let granularity: Granularity = group.parse()?;
            let today = clock.today();
            let start = start
                .as_deref()
                .map(|s| util::parse_date(s, today))
                .transpose()?;
            let end = end
                .as_deref()
                .map(|s| util::parse_date(s, today))
                .transpose()?;
            let (start, end) = report::resolve_range(start, end, today);

            let totals = st_core::TotalsStore::load_totals(&db)?;
            report::run(&mut io::stdout(), &totals, start, end, granularity, *json)?;
        }
        Some(Commands::Export) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            export::run(&mut io::stdout(), &db)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
