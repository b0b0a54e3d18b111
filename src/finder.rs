//! Finding transitions by querying an [`OffsetOracle`].
//!
//! Nothing here knows how a zone's rules are stored: the finder only asks
//! "what is the state at this instant?". It steps forward a day at a time
//! until the answer changes, then bisects that day down to the millisecond.
//!
//! This assumes at most one transition per day. A change that is undone
//! again before the next daily step is never seen.

use log::{debug, trace};

use crate::error::{Error, Result};
use crate::instant::{Instant, DAY, TICK, YEAR_ONE};
use crate::oracle::{OffsetOracle, ZoneState};

/// Scans earlier than this are clamped: the day-stepping search gets slow,
/// and platform databases get unreliable, that far back.
pub const DEFAULT_EARLIEST_YEAR: i32 = 1800;

/// Find the first instant in `(after, end)` where the zone's state differs
/// from its state at `after`.
///
/// A change landing exactly on `end` is not reported.
pub fn find_next_transition(
    zone: &impl OffsetOracle,
    after: Instant,
    end: Instant,
) -> Option<Instant> {
    if after >= end {
        return None;
    }
    let start_state = zone.offset_at(after);
    let differs = |at: Instant| !zone.offset_at(at).same_offset(&start_state);

    // Inclusive upper bound, so a change within the last day is still found.
    let mut now = after + DAY;
    while now <= end {
        if differs(now) {
            let mut upper_inclusive = now;
            let mut lower_exclusive = now - DAY;
            while upper_inclusive > lower_exclusive + TICK {
                let candidate = lower_exclusive.midpoint(upper_inclusive);
                if differs(candidate) {
                    upper_inclusive = candidate;
                } else {
                    lower_exclusive = candidate;
                }
            }
            return if upper_inclusive == end {
                None
            } else {
                Some(upper_inclusive)
            };
        }
        now = now + DAY;
    }
    None
}

/// A transition, with the state that took effect at that instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub at: Instant,
    pub state: ZoneState,
}

/// Bounds for a scan, built from a `[from_year, to_year)` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanRange {
    pub start: Instant,
    pub end: Instant,
}

impl ScanRange {
    /// Fails with [`Error::InvalidRange`] if `from_year >= to_year` or either
    /// year can't be represented. `from_year` is raised to `earliest_year`
    /// when below it; if that pushes the start past the end the range is
    /// empty.
    pub fn from_years(from_year: i32, to_year: i32, earliest_year: i32) -> Result<Self> {
        let invalid = || Error::InvalidRange {
            from: from_year,
            to: to_year,
        };
        if from_year >= to_year {
            return Err(invalid());
        }
        Instant::start_of_year(from_year).ok_or_else(invalid)?;
        let start = Instant::start_of_year(from_year.max(earliest_year)).ok_or_else(invalid)?;
        let end = Instant::start_of_year(to_year).ok_or_else(invalid)?;
        Ok(ScanRange { start, end })
    }
}

/// All transitions of one zone within a scan range.
///
/// Holds no state beyond its position: calling [`list_transitions`] again
/// with the same arguments starts over and yields the same sequence.
pub struct Transitions<Z> {
    zone: Z,
    after: Instant,
    end: Instant,
    done: bool,
}

impl<Z: OffsetOracle> Transitions<Z> {
    /// The zone's state at the start of year 1, before anything recorded.
    pub fn initial(&self) -> ZoneState {
        self.zone.offset_at(YEAR_ONE)
    }
}

impl<Z: OffsetOracle> Iterator for Transitions<Z> {
    type Item = Transition;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match find_next_transition(&self.zone, self.after, self.end) {
            Some(at) => {
                self.after = at;
                let state = self.zone.offset_at(at);
                trace!("transition at {} to {}", at, state);
                Some(Transition { at, state })
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

/// List every transition of `zone` from the start of `from_year` up to (but
/// not including) the start of `to_year`.
pub fn list_transitions<Z: OffsetOracle>(
    zone: Z,
    from_year: i32,
    to_year: i32,
    earliest_year: i32,
) -> Result<Transitions<Z>> {
    let range = ScanRange::from_years(from_year, to_year, earliest_year)?;
    debug!("scanning from {} to {}", range.start, range.end);
    Ok(Transitions {
        zone,
        after: range.start - TICK,
        end: range.end,
        done: false,
    })
}
