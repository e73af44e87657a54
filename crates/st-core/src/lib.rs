//! Core domain logic for spacetime.
//!
//! This crate contains the fundamental types and logic for:
//! - Accrual: turning activity events into idle-capped per-day time
//! - Aggregation: bucketing per-day history into daily/weekly/monthly/yearly series
//! - Workspace resolution: mapping document paths to open project folders

mod accrual;
pub mod aggregate;
pub mod bucket;
pub mod clock;
pub mod event;
mod totals;
pub mod workspace;

pub use accrual::{Accrual, AccrualEngine, EventLog, IdleThreshold};
pub use aggregate::{AggregatedSeries, WorkspaceTotal, build_series, build_totals};
pub use bucket::{BucketKey, Granularity, UnknownGranularity, date_to_bucket_key};
pub use clock::{Clock, FixedClock, SystemClock};
pub use event::{ActivityEvent, ActivityKind, UnknownActivityKind};
pub use totals::{DailyTotals, DayMap, TotalsStore};
pub use workspace::{WorkspaceFolder, WorkspaceFolders};
