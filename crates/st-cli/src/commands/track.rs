//! Track command: feeds host activity notifications into the accrual engine.
//!
//! The host (an editor plugin, a file watcher, a shell hook) writes one JSON
//! object per line to stdin:
//!
//! ```json
//! {"kind": "saved", "path": "/work/alpha/src/main.rs", "timestamp": "2024-01-15T10:00:00Z"}
//! ```
//!
//! `scheme` defaults to `file` and `timestamp` to the current time. Events are
//! processed one at a time, each persisted before the next line is read. The
//! event log lives only as long as this process.

use std::io::BufRead;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeZone, Utc};
use serde::Deserialize;
use st_core::{
    Accrual, AccrualEngine, ActivityEvent, ActivityKind, Clock, IdleThreshold, TotalsStore,
    WorkspaceFolders,
};

/// A notification from the host about a document or folder.
#[derive(Debug, Clone, Deserialize)]
pub struct HostEvent {
    pub kind: ActivityKind,
    /// Path of the saved document, or of the folder for open/close events.
    pub path: PathBuf,
    /// URI scheme of the document; only `file` is tracked.
    #[serde(default = "default_scheme")]
    pub scheme: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

fn default_scheme() -> String {
    "file".to_string()
}

/// What became of a single host event.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Not a `file` document, or outside every open folder.
    Dropped,
    /// Recorded against a workspace, with the accrual it produced if any.
    Recorded(Option<Accrual>),
}

/// Counters reported when the input stream ends.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrackSummary {
    pub events: usize,
    pub dropped: usize,
    pub malformed: usize,
    pub accruals: usize,
    pub seconds: f64,
}

/// One tracking session: an engine, its store and the open folders.
pub struct Tracker<S, C, Tz: TimeZone = Local> {
    engine: AccrualEngine<Tz>,
    store: S,
    folders: WorkspaceFolders,
    idle: IdleThreshold,
    clock: C,
}

impl<S, C, Tz> Tracker<S, C, Tz>
where
    S: TotalsStore,
    S::Error: std::error::Error + Send + Sync + 'static,
    C: Clock,
    Tz: TimeZone,
{
    /// Starts a session, marking every open folder as opened now.
    pub fn start(
        engine: AccrualEngine<Tz>,
        store: S,
        folders: WorkspaceFolders,
        idle: IdleThreshold,
        clock: C,
    ) -> Result<Self> {
        let mut tracker = Self {
            engine,
            store,
            folders,
            idle,
            clock,
        };

        let now = tracker.clock.now();
        let names: Vec<String> = tracker.folders.iter().map(|f| f.name().to_string()).collect();
        for name in names {
            tracker
                .engine
                .record_activity(&mut tracker.store, &name, ActivityEvent::opened(now), idle)
                .context("failed to seed workspace")?;
            tracing::debug!(workspace = %name, "workspace open at start");
        }

        Ok(tracker)
    }

    /// Handles a single host event.
    pub fn handle(&mut self, event: &HostEvent) -> Result<Outcome> {
        if event.scheme != "file" {
            tracing::debug!(scheme = %event.scheme, "ignoring non-file document");
            return Ok(Outcome::Dropped);
        }
        let Some(folder) = self.folders.resolve(&event.path) else {
            tracing::debug!(path = %event.path.display(), "ignoring document outside open folders");
            return Ok(Outcome::Dropped);
        };
        let workspace = folder.name().to_string();

        let timestamp = event.timestamp.unwrap_or_else(|| self.clock.now());
        let activity = ActivityEvent::new(timestamp, event.kind);

        let accrual = self
            .engine
            .record_activity(&mut self.store, &workspace, activity, self.idle)
            .context("failed to persist workspace times")?;
        Ok(Outcome::Recorded(accrual))
    }

    /// Reads event lines until EOF.
    ///
    /// Blank lines are skipped. Lines that fail to parse are logged and
    /// skipped; only store failures end the session early.
    pub fn run<R: BufRead>(&mut self, reader: R) -> Result<TrackSummary> {
        let mut summary = TrackSummary::default();

        for (index, line) in reader.lines().enumerate() {
            let line = line.context("failed to read event stream")?;
            if line.trim().is_empty() {
                continue;
            }

            let event: HostEvent = match serde_json::from_str(&line) {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!(line = index + 1, error = %e, "skipping malformed event");
                    summary.malformed += 1;
                    continue;
                }
            };

            summary.events += 1;
            match self.handle(&event)? {
                Outcome::Dropped => summary.dropped += 1,
                Outcome::Recorded(Some(accrual)) => {
                    summary.accruals += 1;
                    summary.seconds += accrual.seconds;
                }
                Outcome::Recorded(None) => {}
            }
        }

        Ok(summary)
    }

    pub const fn engine(&self) -> &AccrualEngine<Tz> {
        &self.engine
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use st_core::{DailyTotals, FixedClock};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap()
    }

    fn tracker(folders: &[&str]) -> Tracker<DailyTotals, FixedClock, Utc> {
        Tracker::start(
            AccrualEngine::with_timezone(Utc),
            DailyTotals::new(),
            WorkspaceFolders::from_roots(folders.iter().copied()),
            IdleThreshold::default(),
            FixedClock(now()),
        )
        .unwrap()
    }

    fn jan15() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn start_seeds_opened_event_per_folder() {
        let tracker = tracker(&["/work/alpha", "/work/beta"]);
        for name in ["alpha", "beta"] {
            let events = tracker.engine().log().events(name);
            assert_eq!(events, [ActivityEvent::opened(now())]);
        }
    }

    #[test]
    fn first_save_after_start_accrues_from_open() {
        let mut tracker = tracker(&["/work/alpha"]);
        let input = r#"{"kind": "saved", "path": "/work/alpha/main.rs", "timestamp": "2024-01-15T09:05:00Z"}"#;

        let summary = tracker.run(input.as_bytes()).unwrap();

        assert_eq!(summary.accruals, 1);
        assert_eq!(summary.seconds, 300.0);
        assert_eq!(tracker.into_store().get("alpha", jan15()), Some(300.0));
    }

    #[test]
    fn idle_accrual_through_event_stream() {
        let mut tracker = tracker(&["/work/alpha"]);
        let input = "\
{\"kind\": \"opened\", \"path\": \"/work/alpha\", \"timestamp\": \"2024-01-15T10:00:00Z\"}
{\"kind\": \"saved\", \"path\": \"/work/alpha/a.rs\", \"timestamp\": \"2024-01-15T10:05:00Z\"}
{\"kind\": \"saved\", \"path\": \"/work/alpha/b.rs\", \"timestamp\": \"2024-01-15T10:33:20Z\"}
";

        let summary = tracker.run(input.as_bytes()).unwrap();

        assert_eq!(summary.events, 3);
        assert_eq!(summary.accruals, 2);
        assert_eq!(tracker.into_store().get("alpha", jan15()), Some(1200.0));
    }

    #[test]
    fn unknown_documents_and_schemes_are_dropped() {
        let mut tracker = tracker(&["/work/alpha"]);
        let input = "\
{\"kind\": \"saved\", \"path\": \"/tmp/notes.txt\", \"timestamp\": \"2024-01-15T09:01:00Z\"}
{\"kind\": \"saved\", \"path\": \"/work/alpha/x.rs\", \"scheme\": \"untitled\", \"timestamp\": \"2024-01-15T09:02:00Z\"}
";

        let summary = tracker.run(input.as_bytes()).unwrap();

        assert_eq!(summary.events, 2);
        assert_eq!(summary.dropped, 2);
        assert_eq!(summary.accruals, 0);
        assert!(tracker.into_store().is_empty());
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let mut tracker = tracker(&["/work/alpha"]);
        let input = "\
not json

{\"kind\": \"typed\", \"path\": \"/work/alpha/x.rs\"}
{\"kind\": \"saved\", \"path\": \"/work/alpha/x.rs\", \"timestamp\": \"2024-01-15T09:10:00Z\"}
";

        let summary = tracker.run(input.as_bytes()).unwrap();

        assert_eq!(summary.malformed, 2);
        assert_eq!(summary.events, 1);
        assert_eq!(summary.seconds, 600.0);
    }

    #[test]
    fn missing_timestamp_uses_clock() {
        let mut tracker = tracker(&["/work/alpha"]);
        let event = HostEvent {
            kind: ActivityKind::Saved,
            path: PathBuf::from("/work/alpha/x.rs"),
            scheme: default_scheme(),
            timestamp: None,
        };

        let Outcome::Recorded(Some(accrual)) = tracker.handle(&event).unwrap() else {
            panic!("expected an accrual");
        };

        // Same instant as the seeded open event.
        assert_eq!(accrual.seconds, 0.0);
        assert_eq!(accrual.date, jan15());
    }

    #[test]
    fn handle_reports_dropped_and_recorded_events() {
        let mut tracker = tracker(&["/work/alpha"]);
        let event = |path: &str, scheme: &str, kind| HostEvent {
            kind,
            path: PathBuf::from(path),
            scheme: scheme.to_string(),
            timestamp: Some(now()),
        };

        assert_eq!(
            tracker.handle(&event("/elsewhere/x.rs", "file", ActivityKind::Saved)).unwrap(),
            Outcome::Dropped
        );
        assert_eq!(
            tracker.handle(&event("/work/alpha/x.rs", "git", ActivityKind::Saved)).unwrap(),
            Outcome::Dropped
        );
        assert_eq!(
            tracker.handle(&event("/work/alpha", "file", ActivityKind::Opened)).unwrap(),
            Outcome::Recorded(None)
        );
        assert!(matches!(
            tracker.handle(&event("/work/alpha/x.rs", "file", ActivityKind::Saved)).unwrap(),
            Outcome::Recorded(Some(_))
        ));
    }

    #[test]
    fn folder_not_open_at_start_is_never_tracked() {
        let mut tracker = tracker(&[]);
        let input = r#"{"kind": "saved", "path": "/work/alpha/x.rs", "timestamp": "2024-01-15T09:10:00Z"}"#;

        let summary = tracker.run(input.as_bytes()).unwrap();

        assert_eq!(summary.dropped, 1);
        assert!(tracker.engine().log().is_empty());
    }
}
