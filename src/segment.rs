//! Time segments and window arithmetic.
//!
//! A time segment is a named granularity of time window (minute, hour, day,
//! ...) with a fixed length in seconds. Human-meaningful segments align to
//! wall-clock boundaries (start-of-minute, start-of-hour) so that every key
//! sharing a window agrees on its expiry regardless of when within the window
//! it was first touched.

use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{FloodgateError, Result};

/// Time segment for quota windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeSegment {
    /// Per-second windows
    Second,
    /// Per-minute windows
    Minute,
    /// Per-hour windows
    Hour,
    /// Per-day windows
    Day,
    /// Per-week windows (rolling)
    Week,
    /// Per-month windows (30 days, rolling)
    Month,
    /// Per-year windows (365 days, rolling)
    Year,
}

impl TimeSegment {
    /// Every segment the engine can track, shortest first.
    pub const ALL: [TimeSegment; 7] = [
        TimeSegment::Second,
        TimeSegment::Minute,
        TimeSegment::Hour,
        TimeSegment::Day,
        TimeSegment::Week,
        TimeSegment::Month,
        TimeSegment::Year,
    ];

    /// Get the length of this segment in seconds.
    pub fn seconds(&self) -> u64 {
        match self {
            TimeSegment::Second => 1,
            TimeSegment::Minute => 60,
            TimeSegment::Hour => 3600,
            TimeSegment::Day => 86_400,
            TimeSegment::Week => 604_800,
            TimeSegment::Month => 2_592_000,
            TimeSegment::Year => 31_536_000,
        }
    }

    /// Epoch timestamp at which the *current* window for this segment ends.
    ///
    /// Second through day windows align to absolute clock boundaries; week,
    /// month and year have no meaningful calendar boundary at fixed lengths
    /// and roll from `now` instead.
    pub fn window_expiry(&self, now: u64) -> u64 {
        let secs = self.seconds();
        match self {
            TimeSegment::Second | TimeSegment::Minute | TimeSegment::Hour | TimeSegment::Day => {
                now + secs - (now % secs)
            }
            TimeSegment::Week | TimeSegment::Month | TimeSegment::Year => now + secs,
        }
    }

    /// The lowercase name used in store keys and configuration.
    pub fn name(&self) -> &'static str {
        match self {
            TimeSegment::Second => "second",
            TimeSegment::Minute => "minute",
            TimeSegment::Hour => "hour",
            TimeSegment::Day => "day",
            TimeSegment::Week => "week",
            TimeSegment::Month => "month",
            TimeSegment::Year => "year",
        }
    }
}

impl fmt::Display for TimeSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TimeSegment {
    type Err = FloodgateError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "second" => Ok(TimeSegment::Second),
            "minute" => Ok(TimeSegment::Minute),
            "hour" => Ok(TimeSegment::Hour),
            "day" => Ok(TimeSegment::Day),
            "week" => Ok(TimeSegment::Week),
            "month" => Ok(TimeSegment::Month),
            "year" => Ok(TimeSegment::Year),
            _ => Err(FloodgateError::InvalidSegment(s.to_string())),
        }
    }
}

/// Parse a human-readable duration of the shape `"<count> <unit>"` into
/// seconds, e.g. `"1 hour"` -> 3600 or `"15 minutes"` -> 900.
///
/// The unit may be singular or plural.
pub fn parse_duration(text: &str) -> Result<u64> {
    let mut parts = text.split_whitespace();
    let (count, unit) = match (parts.next(), parts.next(), parts.next()) {
        (Some(count), Some(unit), None) => (count, unit),
        _ => return Err(FloodgateError::ParseDuration(text.to_string())),
    };

    let count: u64 = count
        .parse()
        .map_err(|_| FloodgateError::ParseDuration(text.to_string()))?;
    let unit = unit.strip_suffix('s').unwrap_or(unit);
    let segment = TimeSegment::from_str(unit)
        .map_err(|_| FloodgateError::ParseDuration(text.to_string()))?;

    count
        .checked_mul(segment.seconds())
        .ok_or_else(|| FloodgateError::ParseDuration(text.to_string()))
}

/// Wall-clock time as whole epoch seconds.
pub fn now_epoch() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs()
}
