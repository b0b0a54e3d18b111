//! The seam between the transition finder and a time zone database.

use std::fmt;

use crate::error::Result;
use crate::instant::Instant;

/// What a zone looks like at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneState {
    pub utc_offset_secs: i32,
    pub is_dst: bool,
    pub abbreviation: String,
}

impl ZoneState {
    pub fn new(utc_offset_secs: i32, is_dst: bool, abbreviation: impl Into<String>) -> Self {
        Self {
            utc_offset_secs,
            is_dst,
            abbreviation: abbreviation.into(),
        }
    }

    /// Whether two states are the same as far as transition detection is
    /// concerned. Abbreviations are ignored.
    pub fn same_offset(&self, other: &ZoneState) -> bool {
        self.utc_offset_secs == other.utc_offset_secs && self.is_dst == other.is_dst
    }
}

/// Formats as `+HH:MM:SS daylight ABBR`.
impl fmt::Display for ZoneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.utc_offset_secs < 0 { '-' } else { '+' };
        let secs = self.utc_offset_secs.unsigned_abs();
        write!(
            f,
            "{}{:02}:{:02}:{:02} {} {}",
            sign,
            secs / 3600,
            (secs / 60) % 60,
            secs % 60,
            if self.is_dst { "daylight" } else { "standard" },
            self.abbreviation,
        )
    }
}

/// A resolved zone that can report its state at any instant.
///
/// Implementations must be pure: the same instant always yields the same
/// state.
pub trait OffsetOracle {
    fn offset_at(&self, instant: Instant) -> ZoneState;
}

impl<T: OffsetOracle + ?Sized> OffsetOracle for &T {
    fn offset_at(&self, instant: Instant) -> ZoneState {
        (**self).offset_at(instant)
    }
}

/// A time zone database: the set of zone ids it knows, and a way to turn an
/// id into an [`OffsetOracle`].
pub trait ZoneCatalog {
    type Zone: OffsetOracle;

    /// Short name of the backend, used in logs.
    fn name(&self) -> &str;

    /// Version of the underlying data, if the backend knows it.
    fn version(&self) -> Option<String>;

    /// Every zone id this catalog can resolve, sorted.
    fn zone_ids(&self) -> Result<Vec<String>>;

    fn resolve_zone(&self, id: &str) -> Result<Self::Zone>;
}
