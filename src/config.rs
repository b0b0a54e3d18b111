//! Configuration related structures
use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use getset::{CopyGetters, Getters};
use log::LevelFilter;
use std::path::PathBuf;
use tzvalidate::backend::DEFAULT_ZONEINFO;
use tzvalidate::finder::{ScanRange, DEFAULT_EARLIEST_YEAR};

macro_rules! prefix {
    () => {
        "TZVALIDATE_"
    };
}

/// Which time zone database answers offset queries.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum Source {
    /// The host's compiled zoneinfo files.
    System,
    /// The IANA database compiled into this binary.
    Bundled,
}

#[derive(CopyGetters, Debug, Getters, Parser)]
#[command(
    name = "tzvalidate",
    version,
    after_help = "Reports from different sources can be diffed to find where the databases disagree."
)]

/// Dump every UTC offset transition of a time zone database.
pub struct Config {
    #[get_copy = "pub"]
    #[arg(
        default_value = "warn",
        env = concat!(prefix!(), "LOG_LEVEL"),
        long = "log-level",
        value_name = "LEVEL"
    )]
    /// The logging level: trace, debug, info, warn, error or off.
    log_level: LevelFilter,

    #[get_copy = "pub"]
    #[arg(
        default_value = "system",
        env = concat!(prefix!(), "SOURCE"),
        long = "source",
        short = 's',
        value_enum
    )]
    /// Time zone database to report on.
    source: Source,

    #[get = "pub"]
    #[arg(
        default_value = DEFAULT_ZONEINFO,
        env = concat!(prefix!(), "ZONEINFO"),
        long = "zoneinfo",
        value_name = "PATH"
    )]
    /// Root of the compiled zoneinfo tree, for the system source.
    zoneinfo: PathBuf,

    #[get = "pub"]
    #[arg(env = concat!(prefix!(), "ZONE"), long = "zone", short = 'z', value_name = "ID")]
    /// Only dump this zone.
    zone: Option<String>,

    #[get_copy = "pub"]
    #[arg(
        allow_negative_numbers = true,
        default_value_t = 1,
        env = concat!(prefix!(), "FROM_YEAR"),
        long = "from-year",
        short = 'f',
        value_name = "YEAR"
    )]
    /// First year to report transitions for (inclusive).
    from_year: i32,

    #[get_copy = "pub"]
    #[arg(
        allow_negative_numbers = true,
        default_value_t = 2035,
        env = concat!(prefix!(), "TO_YEAR"),
        long = "to-year",
        short = 't',
        value_name = "YEAR"
    )]
    /// Year to stop at (exclusive).
    to_year: i32,

    #[get_copy = "pub"]
    #[arg(
        default_value_t = DEFAULT_EARLIEST_YEAR,
        env = concat!(prefix!(), "EARLIEST_YEAR"),
        long = "earliest-year",
        value_name = "YEAR"
    )]
    /// Never scan before this year, whatever --from-year says.
    earliest_year: i32,

    #[get = "pub"]
    #[arg(env = concat!(prefix!(), "OUTPUT"), long = "output", short = 'o', value_name = "PATH")]
    /// Write the report here instead of stdout.
    output: Option<PathBuf>,

    #[get_copy = "pub"]
    #[arg(long = "hash")]
    /// Print only the SHA-256 of the report.
    hash: bool,

    #[get_copy = "pub"]
    #[arg(long = "list-zones", conflicts_with_all = ["zone", "hash"])]
    /// Print the zone ids known to the source and exit.
    list_zones: bool,
}

impl Config {
    /// Validate the configuration integrity.
    pub fn validate(&self) -> Result<()> {
        ScanRange::from_years(self.from_year, self.to_year, self.earliest_year)
            .context("check year range")?;

        if self.source == Source::System && !self.zoneinfo.is_dir() {
            bail!(
                "zoneinfo directory '{}' does not exist",
                self.zoneinfo.display()
            )
        }

        Ok(())
    }
}
