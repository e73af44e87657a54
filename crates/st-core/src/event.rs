//! Activity events delivered by the host editor.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happened in a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityKind {
    /// The workspace folder was opened (or tracking started with it open).
    Opened,
    /// A document inside the workspace was saved.
    Saved,
    /// The workspace folder was closed.
    Closed,
}

impl ActivityKind {
    /// String form used on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Opened => "opened",
            Self::Saved => "saved",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ActivityKind {
    type Err = UnknownActivityKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "opened" => Ok(Self::Opened),
            "saved" => Ok(Self::Saved),
            "closed" => Ok(Self::Closed),
            _ => Err(UnknownActivityKind(s.to_string())),
        }
    }
}

impl Serialize for ActivityKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ActivityKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for unknown activity kind strings.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown activity kind: {0}")]
pub struct UnknownActivityKind(String);

/// A single activity notification for one workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEvent {
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// The type of activity.
    pub kind: ActivityKind,
}

impl ActivityEvent {
    pub const fn new(timestamp: DateTime<Utc>, kind: ActivityKind) -> Self {
        Self { timestamp, kind }
    }

    pub const fn opened(timestamp: DateTime<Utc>) -> Self {
        Self::new(timestamp, ActivityKind::Opened)
    }

    pub const fn saved(timestamp: DateTime<Utc>) -> Self {
        Self::new(timestamp, ActivityKind::Saved)
    }

    pub const fn closed(timestamp: DateTime<Utc>) -> Self {
        Self::new(timestamp, ActivityKind::Closed)
    }
}
