use anyhow::{Context, Result};
use clap::Parser;
use env_logger::fmt::Color;
use log::{debug, info, warn, LevelFilter};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use tzvalidate::backend::{BundledCatalog, SystemCatalog};
use tzvalidate::{list_transitions, report, ZoneCatalog};

mod config;

use config::{Config, Source};

fn main() -> Result<()> {
    let config = Config::parse();
    init_logging(config.log_level()).context("set log verbosity")?;
    config.validate().context("validate config")?;

    match config.source() {
        Source::System => run(&SystemCatalog::new(config.zoneinfo()), &config),
        Source::Bundled => run(&BundledCatalog, &config),
    }
}

fn init_logging(log_level: LevelFilter) -> Result<()> {
    // Initialize the logger with the format:
    // [YYYY-MM-DDTHH:MM:SS:MMMZ LEVEL crate::module file:LINE] MSG…
    // The file and line will be only printed when running with debug or trace level.
    env_logger::builder()
        .filter_level(log_level)
        .format(move |buf, r| {
            let mut style = buf.style();
            style.set_color(Color::Black).set_intense(true);
            writeln!(
                buf,
                "{}{} {:<5} {}{}{} {}",
                style.value("["),
                buf.timestamp_millis(),
                buf.default_styled_level(r.level()),
                r.target(),
                match (log_level >= LevelFilter::Debug, r.file(), r.line()) {
                    (true, Some(file), Some(line)) => format!(" {}:{}", file, line),
                    _ => "".into(),
                },
                style.value("]"),
                r.args()
            )
        })
        .try_init()
        .context("init env logger")
}

fn run<C: ZoneCatalog>(catalog: &C, config: &Config) -> Result<()> {
    info!("using the {} time zone database", catalog.name());

    if config.list_zones() {
        let mut out = output(config)?;
        for id in catalog.zone_ids().context("list zones")? {
            writeln!(out, "{}", id)?;
        }
        return out.flush().context("flush output");
    }

    let mut report = Vec::new();
    if let Some(version) = catalog.version() {
        report::write_version(&mut report, &version)?;
    }

    let (zones, transitions) = match config.zone() {
        Some(id) => {
            let count = dump_zone(catalog, id, config, &mut report)
                .with_context(|| format!("dump zone {}", id))?;
            (1, count)
        }
        None => {
            let mut zones = 0;
            let mut transitions = 0;
            for id in catalog.zone_ids().context("list zones")? {
                match dump_zone(catalog, &id, config, &mut report) {
                    Ok(count) => {
                        zones += 1;
                        transitions += count;
                    }
                    Err(e) => warn!("skipping zone {}: {:#}", id, e),
                }
            }
            (zones, transitions)
        }
    };
    info!("dumped {} transitions across {} zones", transitions, zones);

    let mut out = output(config)?;
    if config.hash() {
        writeln!(out, "{}", report::hash(&report))?;
    } else {
        out.write_all(&report)?;
    }
    out.flush().context("flush output")
}

fn dump_zone<C: ZoneCatalog>(
    catalog: &C,
    id: &str,
    config: &Config,
    report: &mut Vec<u8>,
) -> Result<usize> {
    let zone = catalog.resolve_zone(id)?;
    debug!("dumping {}", id);
    let transitions = list_transitions(
        zone,
        config.from_year(),
        config.to_year(),
        config.earliest_year(),
    )?;
    Ok(report::write_zone(report, id, transitions)?)
}

fn output(config: &Config) -> Result<Box<dyn Write>> {
    Ok(match config.output() {
        Some(path) => Box::new(BufWriter::new(File::create(path).with_context(|| {
            format!("create output file {}", path.display())
        })?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}
