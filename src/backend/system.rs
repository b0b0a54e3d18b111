use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Component, Path, PathBuf};

use log::{debug, trace};

use crate::error::{Error, Result};
use crate::oracle::ZoneCatalog;
use crate::tzif::TimeZoneInfo;

/// Where most Unix systems keep their compiled zone files.
pub const DEFAULT_ZONEINFO: &str = "/usr/share/zoneinfo";

/// Trees and files under the zoneinfo root that aren't zones in their own
/// right.
const SKIPPED: &[&str] = &["posix", "right", "posixrules", "localtime"];

/// The host's compiled zoneinfo tree: one TZif file per zone.
#[derive(Debug, Clone)]
pub struct SystemCatalog {
    root: PathBuf,
}

impl SystemCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        SystemCatalog { root: root.into() }
    }

    /// Map a zone id to its file, refusing anything that would escape the
    /// root.
    fn zone_path(&self, id: &str) -> Option<PathBuf> {
        let relative = Path::new(id);
        let plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if id.is_empty() || !plain {
            return None;
        }
        Some(self.root.join(relative))
    }

    fn collect_ids(&self, dir: &Path, ids: &mut Vec<String>) -> io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let Ok(relative) = path.strip_prefix(&self.root) else {
                continue;
            };
            let Some(id) = relative.to_str().map(|s| s.replace(std::path::MAIN_SEPARATOR, "/")) else {
                continue;
            };
            if SKIPPED.contains(&id.as_str()) {
                continue;
            }
            // Follows symlinks, so linked zones are listed under every name.
            let Ok(meta) = fs::metadata(&path) else {
                trace!("skipping dangling link {}", path.display());
                continue;
            };
            if meta.is_dir() {
                self.collect_ids(&path, ids)?;
            } else if meta.is_file() && has_tzif_magic(&path) {
                ids.push(id);
            } else {
                trace!("skipping non-zone file {}", path.display());
            }
        }
        Ok(())
    }
}

fn has_tzif_magic(path: &Path) -> bool {
    let mut magic = [0u8; 4];
    File::open(path)
        .and_then(|mut f| f.read_exact(&mut magic))
        .is_ok()
        && &magic == b"TZif"
}

impl ZoneCatalog for SystemCatalog {
    type Zone = TimeZoneInfo;

    fn name(&self) -> &str {
        "system"
    }

    fn version(&self) -> Option<String> {
        let version = fs::read_to_string(self.root.join("+VERSION")).ok()?;
        let version = version.trim();
        (!version.is_empty()).then(|| version.to_owned())
    }

    fn zone_ids(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        self.collect_ids(&self.root, &mut ids)
            .map_err(|source| Error::ZoneData {
                zone: self.root.display().to_string(),
                source,
            })?;
        ids.sort();
        debug!("found {} zones under {}", ids.len(), self.root.display());
        Ok(ids)
    }

    fn resolve_zone(&self, id: &str) -> Result<TimeZoneInfo> {
        let path = self
            .zone_path(id)
            .ok_or_else(|| Error::ZoneNotFound(id.to_owned()))?;
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::ZoneNotFound(id.to_owned()))
            }
            Err(source) => {
                return Err(Error::ZoneData {
                    zone: id.to_owned(),
                    source,
                })
            }
        };
        if !file.metadata().map(|m| m.is_file()).unwrap_or(false) {
            return Err(Error::ZoneNotFound(id.to_owned()));
        }
        let info = TimeZoneInfo::parse(BufReader::new(file)).map_err(|source| Error::ZoneData {
            zone: id.to_owned(),
            source,
        })?;
        debug!(
            "loaded {} from {}: TZif v{}, {} transitions",
            id,
            path.display(),
            info.version,
            info.transition_times.len()
        );
        Ok(info)
    }
}
