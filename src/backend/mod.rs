//! Offset oracles backed by real time zone databases.
//!
//! Each backend reads a different implementation of the IANA data so their
//! reports can be compared against each other.

mod bundled;
mod system;

pub use bundled::{BundledCatalog, BundledZone};
pub use system::{SystemCatalog, DEFAULT_ZONEINFO};
