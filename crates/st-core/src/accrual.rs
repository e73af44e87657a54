//! Idle-aware time accrual.
//!
//! Turns a stream of discrete activity events into bounded per-day deltas.
//!
//! # Algorithm Summary
//!
//! 1. Every event is appended to the workspace's in-memory [`EventLog`]
//! 2. A `saved` event with a prior event accrues the gap since that event
//! 3. The gap is capped at the idle threshold and floored at zero
//! 4. The delta lands on the calendar date of the `saved` event
//!
//! `opened` and `closed` events never accrue on their own. They only become
//! the baseline for the next save.

use std::collections::HashMap;

use chrono::{Local, NaiveDate, TimeZone};

use crate::event::{ActivityEvent, ActivityKind};
use crate::totals::TotalsStore;

/// Cap on how much any single gap between events may contribute.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct IdleThreshold(f64);

impl IdleThreshold {
    /// Default threshold: 15 minutes.
    pub const DEFAULT_SECONDS: f64 = 900.0;

    /// Builds a threshold from seconds, substituting the default for
    /// non-positive or non-finite values.
    #[must_use]
    pub fn from_seconds(seconds: f64) -> Self {
        if seconds.is_finite() && seconds > 0.0 {
            Self(seconds)
        } else {
            Self::default()
        }
    }

    /// Builds a threshold from the user-facing minutes setting.
    #[must_use]
    pub fn from_minutes(minutes: Option<f64>) -> Self {
        minutes.map_or_else(Self::default, |m| Self::from_seconds(m * 60.0))
    }

    #[must_use]
    pub const fn seconds(self) -> f64 {
        self.0
    }
}

impl Default for IdleThreshold {
    fn default() -> Self {
        Self(Self::DEFAULT_SECONDS)
    }
}

/// Time credited to a workspace by a single `saved` event.
#[derive(Debug, Clone, PartialEq)]
pub struct Accrual {
    pub workspace: String,
    pub date: NaiveDate,
    pub seconds: f64,
}

/// Per-workspace event history for the lifetime of the process.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: HashMap<String, Vec<ActivityEvent>>,
}

impl EventLog {
    /// The most recently appended event for a workspace.
    pub fn last(&self, workspace: &str) -> Option<&ActivityEvent> {
        self.events.get(workspace)?.last()
    }

    /// All events for a workspace in insertion order.
    pub fn events(&self, workspace: &str) -> &[ActivityEvent] {
        self.events.get(workspace).map_or(&[], Vec::as_slice)
    }

    fn push(&mut self, workspace: &str, event: ActivityEvent) {
        self.events
            .entry(workspace.to_string())
            .or_default()
            .push(event);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Converts activity events into persisted work time.
///
/// One engine is constructed per process and owns the event log. Calendar
/// dates are computed in the engine's timezone.
#[derive(Debug, Clone)]
pub struct AccrualEngine<Tz: TimeZone = Local> {
    timezone: Tz,
    log: EventLog,
}

impl AccrualEngine<Local> {
    pub fn new() -> Self {
        Self::with_timezone(Local)
    }
}

impl Default for AccrualEngine<Local> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Tz: TimeZone> AccrualEngine<Tz> {
    pub fn with_timezone(timezone: Tz) -> Self {
        Self {
            timezone,
            log: EventLog::default(),
        }
    }

    pub const fn log(&self) -> &EventLog {
        &self.log
    }

    /// Records an event and computes the accrual it triggers, if any.
    ///
    /// Only `saved` events with a prior event in the log accrue. The prior
    /// event is the one appended last, regardless of its kind or timestamp.
    pub fn record(
        &mut self,
        workspace: &str,
        event: ActivityEvent,
        idle: IdleThreshold,
    ) -> Option<Accrual> {
        let prior = self.log.last(workspace).copied();
        self.log.push(workspace, event);

        if event.kind != ActivityKind::Saved {
            return None;
        }
        let Some(prior) = prior else {
            tracing::debug!(workspace, "first save of session, nothing accrued");
            return None;
        };

        #[allow(clippy::cast_precision_loss)]
        let elapsed = (event.timestamp - prior.timestamp).num_milliseconds() as f64 / 1000.0;
        let seconds = elapsed.min(idle.seconds()).max(0.0);
        let date = event
            .timestamp
            .with_timezone(&self.timezone)
            .date_naive();

        Some(Accrual {
            workspace: workspace.to_string(),
            date,
            seconds,
        })
    }

    /// Records an event and applies any resulting accrual to the store.
    ///
    /// The store sees one load and one save per accrual, and is not touched
    /// at all for events that accrue nothing.
    pub fn record_activity<S: TotalsStore>(
        &mut self,
        store: &mut S,
        workspace: &str,
        event: ActivityEvent,
        idle: IdleThreshold,
    ) -> Result<Option<Accrual>, S::Error> {
        let Some(accrual) = self.record(workspace, event, idle) else {
            return Ok(None);
        };

        let mut totals = store.load_totals()?;
        totals.add(&accrual.workspace, accrual.date, accrual.seconds);
        store.save_totals(&totals)?;

        tracing::debug!(
            workspace = %accrual.workspace,
            date = %accrual.date,
            seconds = accrual.seconds,
            "accrued work time"
        );
        Ok(Some(accrual))
    }
}
