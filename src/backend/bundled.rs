use chrono::{DateTime, Offset, TimeZone, Utc};
use chrono_tz::{OffsetComponents, Tz};

use crate::error::{Error, Result};
use crate::instant::Instant;
use crate::oracle::{OffsetOracle, ZoneCatalog, ZoneState};

/// The IANA database compiled into this binary by `chrono-tz`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledCatalog;

/// A zone from the bundled database.
#[derive(Debug, Clone, Copy)]
pub struct BundledZone(Tz);

impl OffsetOracle for BundledZone {
    fn offset_at(&self, instant: Instant) -> ZoneState {
        let millis = instant.as_millis();
        let utc = DateTime::from_timestamp_millis(millis).unwrap_or(if millis < 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        });
        let offset = self.0.offset_from_utc_datetime(&utc.naive_utc());
        ZoneState::new(
            offset.fix().local_minus_utc(),
            !offset.dst_offset().is_zero(),
            offset.to_string(),
        )
    }
}

impl ZoneCatalog for BundledCatalog {
    type Zone = BundledZone;

    fn name(&self) -> &str {
        "bundled"
    }

    fn version(&self) -> Option<String> {
        Some(chrono_tz::IANA_TZDB_VERSION.to_owned())
    }

    fn zone_ids(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = chrono_tz::TZ_VARIANTS
            .iter()
            .map(|tz| tz.name().to_owned())
            .collect();
        ids.sort();
        Ok(ids)
    }

    fn resolve_zone(&self, id: &str) -> Result<BundledZone> {
        id.parse::<Tz>()
            .map(BundledZone)
            .map_err(|_| Error::ZoneNotFound(id.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finder::{list_transitions, DEFAULT_EARLIEST_YEAR};

    #[test]
    fn resolves_known_zones() {
        let catalog = BundledCatalog;
        assert!(catalog.resolve_zone("Europe/London").is_ok());
        assert!(matches!(
            catalog.resolve_zone("Europe/Atlantis"),
            Err(Error::ZoneNotFound(id)) if id == "Europe/Atlantis"
        ));
        let ids = catalog.zone_ids().unwrap();
        assert!(ids.contains(&"America/New_York".to_owned()));
        assert!(ids.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn london_2020() {
        let zone = BundledCatalog.resolve_zone("Europe/London").unwrap();
        let found: Vec<_> = list_transitions(zone, 2020, 2021, DEFAULT_EARLIEST_YEAR)
            .unwrap()
            .collect();
        assert_eq!(2, found.len());
        assert_eq!("2020-03-29 01:00:00Z", found[0].at.to_string());
        assert_eq!(ZoneState::new(3600, true, "BST"), found[0].state);
        assert_eq!("2020-10-25 01:00:00Z", found[1].at.to_string());
        assert_eq!(ZoneState::new(0, false, "GMT"), found[1].state);
    }

    #[test]
    fn utc_never_changes() {
        let zone = BundledCatalog.resolve_zone("UTC").unwrap();
        let listing = list_transitions(zone, 1800, 2100, DEFAULT_EARLIEST_YEAR).unwrap();
        assert_eq!(ZoneState::new(0, false, "UTC"), listing.initial());
        assert_eq!(0, listing.count());
    }
}
