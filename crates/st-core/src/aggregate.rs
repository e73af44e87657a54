//! Bucketed series and range totals over [`DailyTotals`].
//!
//! Both queries are pure functions of a totals snapshot and an inclusive
//! date range. For any workspace, summing its series from [`build_series`]
//! gives the same number as its row from [`build_totals`] over the same
//! range, whatever the granularity.

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Serialize;

use crate::bucket::{BucketKey, Granularity, date_to_bucket_key};
use crate::totals::DailyTotals;

/// Ordered bucket labels plus one aligned series per workspace.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregatedSeries {
    pub labels: Vec<BucketKey>,
    /// Seconds per bucket, same length and order as `labels`. Workspaces
    /// appear in the same order as in the source [`DailyTotals`].
    pub series: IndexMap<String, Vec<f64>>,
}

impl AggregatedSeries {
    /// Sum across all workspaces for each bucket.
    pub fn bucket_totals(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.labels.len()];
        for values in self.series.values() {
            for (sum, value) in sums.iter_mut().zip(values) {
                *sum += value;
            }
        }
        sums
    }
}

/// Total seconds for one workspace over a date range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkspaceTotal {
    pub workspace: String,
    pub total_seconds: f64,
}

/// Every date from `start` to `end` inclusive. Empty when `start > end`.
fn dates_in_range(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |date| *date <= end)
}

/// Buckets per-day totals over `[start, end]` at the given granularity.
///
/// Labels appear in chronological order without duplicates. Every workspace
/// in `totals` gets a series, all zeros if it has no dates in range.
pub fn build_series(
    totals: &DailyTotals,
    start: NaiveDate,
    end: NaiveDate,
    granularity: Granularity,
) -> AggregatedSeries {
    let mut labels: Vec<BucketKey> = Vec::new();
    // (date, index into labels)
    let mut slots: Vec<(NaiveDate, usize)> = Vec::new();

    for date in dates_in_range(start, end) {
        let key = date_to_bucket_key(date, granularity);
        // Dates arrive in order, so equal keys are always adjacent.
        if labels.last() != Some(&key) {
            labels.push(key);
        }
        slots.push((date, labels.len() - 1));
    }

    let series = totals
        .iter()
        .map(|(workspace, days)| {
            let mut values = vec![0.0; labels.len()];
            for (date, index) in &slots {
                if let Some(seconds) = days.get(date) {
                    values[*index] += seconds;
                }
            }
            (workspace.to_string(), values)
        })
        .collect();

    tracing::trace!(
        %start,
        %end,
        %granularity,
        buckets = labels.len(),
        "built series"
    );

    AggregatedSeries { labels, series }
}

/// Sums each workspace's entries dated within `[start, end]`.
///
/// Rows follow the workspace order of `totals`.
pub fn build_totals(totals: &DailyTotals, start: NaiveDate, end: NaiveDate) -> Vec<WorkspaceTotal> {
    totals
        .iter()
        .map(|(workspace, days)| WorkspaceTotal {
            workspace: workspace.to_string(),
            // `BTreeMap::range` panics on inverted bounds.
            total_seconds: if start <= end {
                days.range(start..=end).map(|(_, seconds)| seconds).sum()
            } else {
                0.0
            },
        })
        .collect()
}
