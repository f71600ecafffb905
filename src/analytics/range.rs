//! Range Filter - look-back windows over the sample history

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::Sample;

/// Look-back window selectable by consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum TimeRange {
    #[serde(rename = "1H")]
    OneHour,
    #[serde(rename = "6H")]
    SixHours,
    #[serde(rename = "24H")]
    Day,
    #[serde(rename = "7D")]
    Week,
    #[serde(rename = "ALL")]
    All,
}

impl Default for TimeRange {
    fn default() -> Self {
        TimeRange::Day
    }
}

impl TimeRange {
    pub const ALL_RANGES: [TimeRange; 5] = [
        TimeRange::OneHour,
        TimeRange::SixHours,
        TimeRange::Day,
        TimeRange::Week,
        TimeRange::All,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::OneHour => "1H",
            TimeRange::SixHours => "6H",
            TimeRange::Day => "24H",
            TimeRange::Week => "7D",
            TimeRange::All => "ALL",
        }
    }

    /// Look-back duration, `None` for `ALL`
    pub fn duration(&self) -> Option<Duration> {
        match self {
            TimeRange::OneHour => Some(Duration::hours(1)),
            TimeRange::SixHours => Some(Duration::hours(6)),
            TimeRange::Day => Some(Duration::hours(24)),
            TimeRange::Week => Some(Duration::days(7)),
            TimeRange::All => None,
        }
    }

    /// Whether charts should label points by date rather than time of day
    pub fn is_long(&self) -> bool {
        matches!(self, TimeRange::Week | TimeRange::All)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown time range '{0}', expected one of 1H, 6H, 24H, 7D, ALL")]
pub struct ParseTimeRangeError(pub String);

impl FromStr for TimeRange {
    type Err = ParseTimeRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "1H" => Ok(TimeRange::OneHour),
            "6H" => Ok(TimeRange::SixHours),
            "24H" => Ok(TimeRange::Day),
            "7D" => Ok(TimeRange::Week),
            "ALL" => Ok(TimeRange::All),
            _ => Err(ParseTimeRangeError(s.to_string())),
        }
    }
}

impl TryFrom<String> for TimeRange {
    type Error = ParseTimeRangeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Samples inside `range`, measured back from the current wall-clock time.
///
/// Repeated calls may return different suffixes as samples age out.
pub fn filter(history: &[Sample], range: TimeRange) -> &[Sample] {
    filter_at(history, range, Utc::now())
}

/// Contiguous suffix of `history` with `timestamp >= now - range`.
///
/// `history` must be ordered by non-decreasing timestamp, as the history store
/// guarantees. `ALL` returns the input unchanged; an empty slice is returned
/// when every sample is older than the cutoff.
pub fn filter_at(history: &[Sample], range: TimeRange, now: DateTime<Utc>) -> &[Sample] {
    let Some(lookback) = range.duration() else {
        return history;
    };
    let cutoff = now - lookback;
    let start = history.partition_point(|s| s.timestamp() < cutoff);
    &history[start..]
}
