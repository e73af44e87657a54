//! Time source abstraction.

use chrono::{DateTime, Local, NaiveDate, Utc};

/// Supplies the current time. Lets tracking and reports be driven by a fixed
/// instant in tests.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// Today's calendar date in local time.
    fn today(&self) -> NaiveDate {
        self.now().with_timezone(&Local).date_naive()
    }
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
