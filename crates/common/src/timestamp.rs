//! Timestamp utilities.
//!
//! Bundle directories and backup files embed a second-resolution UTC
//! timestamp in a fixed-width compact form (`YYYYMMDD-HHMMSS`) so that
//! lexicographic order equals chronological order.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Compact on-disk format, second resolution, zero padded.
const COMPACT_FORMAT: &str = "%Y%m%d-%H%M%S";

/// A wrapper around DateTime<Utc> with consistent serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a new timestamp from the current time.
    pub fn now() -> Self {
        Timestamp(Utc::now())
    }

    /// Create a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Timestamp(dt)
    }

    /// Get the inner DateTime<Utc>.
    pub fn inner(&self) -> DateTime<Utc> {
        self.0
    }

    /// Format as `YYYYMMDD-HHMMSS`, the form embedded in bundle and
    /// backup names.
    pub fn to_compact(&self) -> String {
        self.0.format(COMPACT_FORMAT).to_string()
    }

    /// Parse the compact `YYYYMMDD-HHMMSS` form.
    pub fn parse_compact(s: &str) -> Option<Self> {
        NaiveDateTime::parse_from_str(s, COMPACT_FORMAT)
            .ok()
            .map(|dt| Timestamp(dt.and_utc()))
    }

    /// Format as ISO 8601 string, second resolution.
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_iso8601())
    }
}
