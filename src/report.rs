//! The canonical text report.
//!
//! ```text
//! Version: 2024a
//!
//! Europe/London
//! Initially:           -00:01:15 standard LMT
//! 1847-12-01 00:01:15Z +00:00:00 standard GMT
//! ...
//! ```
//!
//! Every zone ends with a blank line, so reports from different sources can
//! be diffed line by line.

use std::io::{self, Write};

use sha2::{Digest, Sha256};

use crate::finder::Transitions;
use crate::oracle::OffsetOracle;

/// Width of the timestamp column, including the separating space.
const INITIAL_LABEL: &str = "Initially:           ";

pub fn write_version(out: &mut impl Write, version: &str) -> io::Result<()> {
    writeln!(out, "Version: {}", version)?;
    writeln!(out)
}

/// Write one zone's section, consuming its transitions. Returns how many
/// transitions were written.
pub fn write_zone<Z: OffsetOracle>(
    out: &mut impl Write,
    id: &str,
    transitions: Transitions<Z>,
) -> io::Result<usize> {
    writeln!(out, "{}", id)?;
    writeln!(out, "{}{}", INITIAL_LABEL, transitions.initial())?;
    let mut count = 0;
    for transition in transitions {
        writeln!(out, "{} {}", transition.at, transition.state)?;
        count += 1;
    }
    writeln!(out)?;
    Ok(count)
}

/// Lowercase hex SHA-256 of a finished report.
pub fn hash(report: &[u8]) -> String {
    format!("{:x}", Sha256::digest(report))
}
