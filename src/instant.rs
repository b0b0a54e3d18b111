//! Absolute points in time, as milliseconds since the Unix epoch.

use std::fmt;
use std::ops::{Add, Sub};

use chrono::{DateTime, NaiveDate};

/// Length of one day in the finest unit an [`Instant`] can express.
pub const DAY: Duration = Duration(86_400_000);

/// One millisecond, the smallest representable step between two instants.
pub const TICK: Duration = Duration(1);

/// Midnight UTC on 0001-01-01.
pub const YEAR_ONE: Instant = Instant::from_secs(-62_135_596_800);

/// An absolute point in time, independent of any calendar or zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Instant(i64);

/// A signed span between two instants, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Duration(i64);

impl Instant {
    pub const fn from_millis(millis: i64) -> Self {
        Instant(millis)
    }

    pub const fn from_secs(secs: i64) -> Self {
        Instant(secs * 1000)
    }

    pub const fn as_millis(self) -> i64 {
        self.0
    }

    /// Whole seconds since the epoch, rounded toward negative infinity.
    pub const fn as_secs_floor(self) -> i64 {
        self.0.div_euclid(1000)
    }

    /// Midnight UTC on January 1st of `year`, or `None` if that date can't be
    /// represented.
    pub fn start_of_year(year: i32) -> Option<Self> {
        let date = NaiveDate::from_ymd_opt(year, 1, 1)?;
        let midnight = date.and_hms_opt(0, 0, 0)?.and_utc();
        Some(Instant(midnight.timestamp_millis()))
    }

    /// Midpoint of `self` and `other`, truncated toward `self`. Never
    /// overflows as long as the two instants are within `i64::MAX` of each
    /// other.
    pub fn midpoint(self, other: Instant) -> Instant {
        Instant(self.0 + (other.0 - self.0) / 2)
    }
}

impl Add<Duration> for Instant {
    type Output = Instant;

    fn add(self, rhs: Duration) -> Instant {
        Instant(self.0 + rhs.0)
    }
}

impl Sub<Duration> for Instant {
    type Output = Instant;

    fn sub(self, rhs: Duration) -> Instant {
        Instant(self.0 - rhs.0)
    }
}

/// Formats as `YYYY-MM-DD HH:MM:SSZ` in UTC, falling back to the raw
/// millisecond count outside the calendar's range.
impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match DateTime::from_timestamp_millis(self.0) {
            Some(utc) => write!(f, "{}", utc.format("%Y-%m-%d %H:%M:%SZ")),
            None => write!(f, "{}ms", self.0),
        }
    }
}
