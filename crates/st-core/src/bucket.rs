//! Granularity-dependent grouping of calendar dates.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// How dates are grouped into buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Granularity {
    #[default]
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Granularity {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = UnknownGranularity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            _ => Err(UnknownGranularity(s.to_string())),
        }
    }
}

impl Serialize for Granularity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Granularity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for unknown granularity strings.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown granularity: {0} (expected daily, weekly, monthly or yearly)")]
pub struct UnknownGranularity(String);

/// The bucket a calendar date falls into.
///
/// Keys of one granularity order chronologically. Comparing keys of
/// different granularities is meaningless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BucketKey {
    Day(NaiveDate),
    /// Weeks start on Monday; the key is that Monday.
    Week(NaiveDate),
    Month { year: i32, month: u32 },
    Year(i32),
}

/// Maps a date to its bucket for the given granularity.
pub fn date_to_bucket_key(date: NaiveDate, granularity: Granularity) -> BucketKey {
    match granularity {
        Granularity::Daily => BucketKey::Day(date),
        Granularity::Weekly => {
            let days_since_monday = date.weekday().num_days_from_monday();
            BucketKey::Week(date - Duration::days(i64::from(days_since_monday)))
        }
        Granularity::Monthly => BucketKey::Month {
            year: date.year(),
            month: date.month(),
        },
        Granularity::Yearly => BucketKey::Year(date.year()),
    }
}

impl BucketKey {
    /// First calendar date covered by the bucket.
    pub fn start_date(&self) -> NaiveDate {
        match *self {
            Self::Day(date) | Self::Week(date) => date,
            Self::Month { year, month } => {
                NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
            }
            Self::Year(year) => NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(NaiveDate::MIN),
        }
    }

    /// Human-readable label, e.g. `Jan 5`, `Week of Jan 1`, `Jan`, `2024`.
    ///
    /// The year is spelled out when the bucket is outside `current_year`.
    pub fn label(&self, current_year: i32) -> String {
        let start = self.start_date();
        let same_year = start.year() == current_year;
        match self {
            Self::Day(_) if same_year => start.format("%b %-d").to_string(),
            Self::Day(_) => start.format("%b %-d, %Y").to_string(),
            Self::Week(_) if same_year => format!("Week of {}", start.format("%b %-d")),
            Self::Week(_) => format!("Week of {}", start.format("%b %-d, %Y")),
            Self::Month { .. } if same_year => start.format("%b").to_string(),
            Self::Month { .. } => start.format("%b %Y").to_string(),
            Self::Year(year) => year.to_string(),
        }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Day(date) | Self::Week(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::Month { year, month } => write!(f, "{year:04}-{month:02}"),
            Self::Year(year) => write!(f, "{year:04}"),
        }
    }
}

impl Serialize for BucketKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}
