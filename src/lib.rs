//! Dump the UTC offset transitions of time zones, as seen by a time zone
//! database, in a canonical text form that can be compared across
//! implementations.
//!
//! The only thing a database has to provide is an [`OffsetOracle`]: the
//! offset, daylight flag and abbreviation of a zone at a given instant.
//! [`finder`] recovers the transitions from that alone.

pub mod backend;
pub mod error;
pub mod finder;
pub mod instant;
pub mod oracle;
pub mod posix;
pub mod report;
pub mod tzif;

pub use error::{Error, Result};
pub use finder::{find_next_transition, list_transitions, Transition, Transitions};
pub use instant::Instant;
pub use oracle::{OffsetOracle, ZoneCatalog, ZoneState};
