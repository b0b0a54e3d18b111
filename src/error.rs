use std::io;

/// Errors surfaced while resolving a zone or preparing a scan.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("time zone '{0}' not found")]
    ZoneNotFound(String),

    #[error("invalid year range {from}..{to}")]
    InvalidRange { from: i32, to: i32 },

    /// The zone exists in the catalog but its data couldn't be loaded.
    #[error("loading data for time zone '{zone}'")]
    ZoneData {
        zone: String,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
