//! Time Zone Information Format (TZif), RFC 8536

use std::io::{self, Read};

use log::debug;

use crate::instant::Instant;
use crate::oracle::{OffsetOracle, ZoneState};
use crate::posix::PosixTz;

#[derive(Debug)]
struct Header {
    /// Must be the byte string b"TZif"
    magic: [u8; 4],

    /// Version. Either 0, b'2', b'3' or b'4'.
    ver: u8,

    /// Number of UT/local indicators contained in the data block.
    ///
    /// Must be either 0 or equal to [`typecnt`](Header::typecnt).
    isutcnt: u32,

    /// Number of standard/wall indicators contained in the data block.
    ///
    /// Must be either 0 or equal to [`typecnt`](Header::typecnt).
    isstdcnt: u32,

    /// Number of leap-second records contained in the data block.
    leapcnt: u32,

    /// Number of transition times contained in the data block.
    timecnt: u32,

    /// Number of local time type records contained in the data block.
    ///
    /// Must not be zero.
    typecnt: u32,

    /// Total number of bytes used by the set of time zone designations contained in the data
    /// block, including the trailing NUL byte at the end of the last time zone designation.
    ///
    /// Must not be zero.
    charcnt: u32,
}

impl Header {
    const LEN: usize = 44;

    fn from_array(bytes: [u8; Self::LEN]) -> Self {
        let count = |i: usize| u32::from_be_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
        Header {
            magic: [bytes[0], bytes[1], bytes[2], bytes[3]],
            ver: bytes[4],
            // bytes 5..20 are reserved
            isutcnt: count(20),
            isstdcnt: count(24),
            leapcnt: count(28),
            timecnt: count(32),
            typecnt: count(36),
            charcnt: count(40),
        }
    }
}

/// A parsed TZif file. For version 2 and later this holds the 64-bit data
/// block and the footer rule.
#[derive(Debug, Default)]
pub struct TimeZoneInfo {
    pub version: u8,
    pub transition_times: Vec<i64>,
    pub transition_types: Vec<u8>,
    pub local_time_types: Vec<LocalTimeTypeRecord>,
    pub time_zone_designations: Vec<u8>,
    /// Rule for instants after the last transition.
    pub footer: Option<PosixTz>,
}

#[derive(Debug)]
pub struct LocalTimeTypeRecord {
    pub ut_off_secs: i32,
    pub is_dst: bool,
    pub desig_idx: u8,
}

pub(crate) fn bogus<T, E>(inner: E) -> io::Result<T>
    where E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    Err(io::Error::new(io::ErrorKind::InvalidData, inner))
}

impl TimeZoneInfo {
    pub fn parse(mut reader: impl Read) -> io::Result<Self> {
        let v1_result = Self::parse_internal(&mut reader, true)?;
        if v1_result.version == 1 {
            return Ok(v1_result);
        }
        let mut result = match Self::parse_internal(&mut reader, false) {
            Ok(result) => result,
            Err(e) => {
                debug!("unusable 64-bit data block, falling back to v1 data: {}", e);
                return Ok(v1_result);
            }
        };
        result.footer = read_footer(&mut reader)?;
        Ok(result)
    }

    fn parse_internal(mut reader: impl Read, v1: bool) -> io::Result<Self> {
        let mut hbuf = [0u8; Header::LEN];
        reader.read_exact(&mut hbuf[..])?;
        let hdr = Header::from_array(hbuf);

        if &hdr.magic != b"TZif" {
            return bogus("unrecognized magic in header");
        }

        if hdr.isstdcnt != 0 && hdr.isstdcnt != hdr.typecnt {
            return bogus("isstdcnt not zero or equal to typecnt");
        }
        if hdr.isutcnt != 0 && hdr.isutcnt != hdr.typecnt {
            return bogus("isutcnt not zero or equal to typecnt");
        }
        if hdr.typecnt == 0 {
            return bogus("typecnt must not be zero");
        }
        if hdr.charcnt == 0 {
            return bogus("charcnt must not be zero");
        }

        let mut result = Self {
            version: match hdr.ver {
                0 => 1,
                b'2' => 2,
                b'3' => 3,
                b'4' => 4,
                _ => return bogus(format!("unsupported version {:#x}", hdr.ver)),
            },
            ..Self::default()
        };

        for _ in 0 .. hdr.timecnt {
            let t = read_time(v1, &mut reader)?;
            if result.transition_times.last().is_some_and(|&prev| prev >= t) {
                return bogus("transition times not in ascending order");
            }
            result.transition_times.push(t);
        }

        result.transition_types.resize(hdr.timecnt as usize, 0);
        reader.read_exact(&mut result.transition_types)?;

        for _ in 0 .. hdr.typecnt {
            let mut buf = [0u8; 4];
            reader.read_exact(&mut buf)?;
            let ut_off_secs = i32::from_be_bytes(buf);

            let mut isdst_idx = [0u8; 2];
            reader.read_exact(&mut isdst_idx)?;
            if !(0..=1).contains(&isdst_idx[0]) {
                return bogus("is_dst not zero or one");
            }
            if u32::from(isdst_idx[1]) >= hdr.charcnt {
                return bogus("designation index out of range");
            }

            let record = LocalTimeTypeRecord {
                ut_off_secs,
                is_dst: isdst_idx[0] == 1,
                desig_idx: isdst_idx[1],
            };
            result.local_time_types.push(record);
        }

        result.time_zone_designations.resize(hdr.charcnt as usize, 0);
        reader.read_exact(&mut result.time_zone_designations)?;

        // Leap second records aren't used; skip over them.
        for _ in 0 .. hdr.leapcnt {
            read_time(v1, &mut reader)?;
            let mut correction = [0u8; 4];
            reader.read_exact(&mut correction)?;
        }

        // Standard/wall and UT/local indicators only matter for building
        // rules out of a POSIX TZ string without a footer. Validate and drop.
        let mut is_std = vec![0; hdr.isstdcnt as usize];
        reader.read_exact(&mut is_std)?;
        let mut is_ut = vec![0; hdr.isutcnt as usize];
        reader.read_exact(&mut is_ut)?;
        for i in 0 .. is_std.len().max(is_ut.len()) {
            let std = is_std.get(i).copied().unwrap_or(0);
            let ut = is_ut.get(i).copied().unwrap_or(0);
            if std > 1 {
                return bogus("std/wall not zero or one");
            }
            if ut > 1 {
                return bogus("ut/local not zero or one");
            }
            if (std, ut) == (0, 1) {
                return bogus("transition times can't be universal + wall");
            }
        }

        for typ_idx in &result.transition_types {
            if *typ_idx as usize >= result.local_time_types.len() {
                return bogus("one or more transition types out of range");
            }
        }

        Ok(result)
    }

    /// The local time type in effect at `ut_secs`, or `None` if the footer
    /// rule applies there instead.
    fn local_time_type_at(&self, ut_secs: i64) -> Option<&LocalTimeTypeRecord> {
        let idx = self.transition_times.partition_point(|&t| t <= ut_secs);
        if idx == self.transition_times.len() && self.footer.is_some() {
            return None;
        }
        let typ_idx = match idx {
            0 => 0,
            _ => self.transition_types[idx - 1] as usize,
        };
        self.local_time_types.get(typ_idx)
    }

    fn designation(&self, typ: &LocalTimeTypeRecord) -> String {
        let dstart = typ.desig_idx as usize;
        let desig = self.time_zone_designations[dstart..]
            .split(|&b| b == 0)
            .next()
            .unwrap_or_default();
        String::from_utf8_lossy(desig).into_owned()
    }
}

impl OffsetOracle for TimeZoneInfo {
    fn offset_at(&self, instant: Instant) -> ZoneState {
        let ut_secs = instant.as_secs_floor();
        match (self.local_time_type_at(ut_secs), &self.footer) {
            (Some(typ), _) => ZoneState::new(typ.ut_off_secs, typ.is_dst, self.designation(typ)),
            (None, Some(rule)) => rule.state_at(ut_secs),
            // Parsing guarantees at least one local time type.
            (None, None) => ZoneState::new(0, false, "-00"),
        }
    }
}

fn read_time(v1: bool, mut reader: impl Read) -> io::Result<i64> {
    Ok(if v1 {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf)?;
        i64::from(i32::from_be_bytes(buf))
    } else {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf)?;
        i64::from_be_bytes(buf)
    })
}

/// The footer is a POSIX TZ string between two newlines. An empty string
/// means there is no rule beyond the last transition.
fn read_footer(mut reader: impl Read) -> io::Result<Option<PosixTz>> {
    let mut rest = Vec::new();
    reader.read_to_end(&mut rest)?;
    let Some(body) = rest.strip_prefix(b"\n") else {
        return bogus("missing footer after 64-bit data block");
    };
    let Some(end) = body.iter().position(|&b| b == b'\n') else {
        return bogus("unterminated footer");
    };
    let tz = std::str::from_utf8(&body[..end])
        .or_else(|_| bogus("footer is not valid UTF-8"))?;
    if tz.is_empty() {
        return Ok(None);
    }
    PosixTz::parse(tz).map(Some)
}
