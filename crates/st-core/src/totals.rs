//! Durable per-workspace, per-day time totals.
//!
//! # Persisted Shape
//!
//! [`DailyTotals`] serializes as a plain JSON object of objects:
//!
//! ```json
//! { "my-project": { "2024-01-15": 1200.0, "2024-01-16": 345.5 } }
//! ```
//!
//! Dates are `YYYY-MM-DD` with no time component and values are seconds,
//! possibly fractional. Workspaces keep the order they were first recorded
//! in, which is also the key order of the stored document. Dates within a
//! workspace iterate in calendar order.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Seconds accrued per calendar date for a single workspace.
pub type DayMap = BTreeMap<NaiveDate, f64>;

/// Accumulated seconds keyed by workspace name, then calendar date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DailyTotals(IndexMap<String, DayMap>);

impl DailyTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `seconds` to the workspace's entry for `date`.
    ///
    /// Missing workspace and date entries are created at zero first, so a
    /// zero-second accrual still leaves an entry behind.
    pub fn add(&mut self, workspace: &str, date: NaiveDate, seconds: f64) {
        let days = self.0.entry(workspace.to_string()).or_default();
        *days.entry(date).or_insert(0.0) += seconds;
    }

    /// Seconds recorded for a workspace on a date, if any.
    pub fn get(&self, workspace: &str, date: NaiveDate) -> Option<f64> {
        self.0.get(workspace)?.get(&date).copied()
    }

    /// All dates recorded for a workspace.
    pub fn days(&self, workspace: &str) -> Option<&DayMap> {
        self.0.get(workspace)
    }

    /// Workspace names in insertion order.
    pub fn workspaces(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DayMap)> {
        self.0.iter().map(|(name, days)| (name.as_str(), days))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Whole-document persistence for [`DailyTotals`].
///
/// Implementations read and write the entire mapping; there is no partial
/// update API. Loading corrupt or missing state should yield an empty
/// mapping rather than an error.
pub trait TotalsStore {
    type Error;

    fn load_totals(&self) -> Result<DailyTotals, Self::Error>;

    fn save_totals(&mut self, totals: &DailyTotals) -> Result<(), Self::Error>;
}

/// Keeping totals in memory is enough for tests and dry runs.
impl TotalsStore for DailyTotals {
    type Error = std::convert::Infallible;

    fn load_totals(&self) -> Result<DailyTotals, Self::Error> {
        Ok(self.clone())
    }

    fn save_totals(&mut self, totals: &DailyTotals) -> Result<(), Self::Error> {
        totals.clone_into(self);
        Ok(())
    }
}
