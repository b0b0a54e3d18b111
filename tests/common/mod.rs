use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A throwaway zoneinfo tree with a couple of hand-built zones.
pub struct Zoneinfo {
    _tmp: TempDir,
    pub root: PathBuf,
}

impl Zoneinfo {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let root = tmp.path().join("zoneinfo");
        fs::create_dir_all(root.join("Europe")).expect("create zoneinfo tree");

        // LMT until 1914, CET with a 2020 spring transition, then the EU rule.
        write_zone(
            &root.join("Europe/Brussels"),
            &[(-1_740_355_200, 1), (1_585_443_600, 2)],
            &[(1050, false, 0), (3600, false, 4), (7200, true, 8)],
            b"LMT\0CET\0CEST\0",
            "CET-1CEST,M3.5.0,M10.5.0/3",
        );
        write_zone(&root.join("UTC"), &[], &[(0, false, 0)], b"UTC\0", "UTC0");
        fs::write(root.join("+VERSION"), "2099z\n").expect("write version");
        fs::write(root.join("zone1970.tab"), "# nothing to see\n").expect("write tab");

        Self { _tmp: tmp, root }
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("tzvalidate").expect("find binary");
        cmd.env_clear().arg("--zoneinfo").arg(&self.root);
        cmd
    }
}

/// Write a TZif v2 file whose v1 and v2 blocks carry the same data.
///
/// Same layout as `tzif::tests::tzif_v2` in the library. That builder is
/// `#[cfg(test)]` and can't be reached from here, so the bytes are written
/// again. Keep the two in step.
fn write_zone(
    path: &Path,
    transitions: &[(i64, u8)],
    types: &[(i32, bool, u8)],
    designations: &[u8],
    footer: &str,
) {
    let mut out = Vec::new();
    for v1 in [true, false] {
        out.extend_from_slice(b"TZif2");
        out.extend_from_slice(&[0; 15]);
        for count in [0, 0, 0, transitions.len(), types.len(), designations.len()] {
            out.extend_from_slice(&(count as u32).to_be_bytes());
        }
        for (t, _) in transitions {
            if v1 {
                out.extend_from_slice(&(*t as i32).to_be_bytes());
            } else {
                out.extend_from_slice(&t.to_be_bytes());
            }
        }
        out.extend(transitions.iter().map(|(_, typ)| typ));
        for (off, dst, idx) in types {
            out.extend_from_slice(&off.to_be_bytes());
            out.push(u8::from(*dst));
            out.push(*idx);
        }
        out.extend_from_slice(designations);
    }
    out.push(b'\n');
    out.extend_from_slice(footer.as_bytes());
    out.push(b'\n');
    fs::write(path, out).expect("write zone file");
}
