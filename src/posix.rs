//! POSIX `TZ` strings, as found in the footer of TZif v2+ files.
//!
//! These describe what happens after the last transition listed in the file:
//! either a fixed offset (`JST-9`) or a yearly daylight saving rule
//! (`CET-1CEST,M3.5.0,M10.5.0/3`).

use std::io;

use chrono::{DateTime, Datelike, Days, NaiveDate};

use crate::oracle::ZoneState;
use crate::tzif::bogus;

/// Used when a zone names a daylight time but gives no rule for it.
const DEFAULT_RULE: &str = "M3.2.0,M11.1.0";

/// Transition time of day when a rule doesn't give one.
const DEFAULT_TIME_SECS: i32 = 2 * 3600;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PosixTz {
    pub std_abbreviation: String,
    /// Seconds east of UTC. Note this is the opposite sign of the string.
    pub std_offset_secs: i32,
    pub dst: Option<PosixDst>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PosixDst {
    pub abbreviation: String,
    /// Seconds east of UTC.
    pub offset_secs: i32,
    /// When daylight time starts, in local standard time.
    pub start: RuleTime,
    /// When daylight time ends, in local daylight time.
    pub end: RuleTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleTime {
    pub day: RuleDay,
    /// Seconds after local midnight. Can be negative or exceed a day.
    pub time_secs: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleDay {
    /// `Jn`: 1-based day of year, February 29th never counted.
    JulianNoLeap(u16),
    /// `n`: 0-based day of year, February 29th counted.
    Julian(u16),
    /// `Mm.w.d`: weekday `d` (0 = Sunday) of week `w` (5 = last) of month `m`.
    MonthWeekDay { month: u8, week: u8, weekday: u8 },
}

impl RuleDay {
    fn date_in(self, year: i32) -> Option<NaiveDate> {
        match self {
            RuleDay::JulianNoLeap(n) => {
                let leap = NaiveDate::from_ymd_opt(year, 2, 29).is_some();
                let ordinal = if leap && n >= 60 { n + 1 } else { n };
                NaiveDate::from_yo_opt(year, u32::from(ordinal))
            }
            RuleDay::Julian(n) => {
                NaiveDate::from_yo_opt(year, 1)?.checked_add_days(Days::new(u64::from(n)))
            }
            RuleDay::MonthWeekDay {
                month,
                week,
                weekday,
            } => {
                let first = NaiveDate::from_ymd_opt(year, u32::from(month), 1)?;
                let first_weekday = first.weekday().num_days_from_sunday();
                let shift = (u32::from(weekday) + 7 - first_weekday) % 7;
                let mut day = 1 + shift + (u32::from(week) - 1) * 7;
                loop {
                    if let Some(date) = NaiveDate::from_ymd_opt(year, u32::from(month), day) {
                        return Some(date);
                    }
                    if day <= 7 {
                        return None;
                    }
                    day -= 7;
                }
            }
        }
    }
}

impl RuleTime {
    /// The UTC timestamp of this rule in `year`, for a local clock running at
    /// `offset_secs` east of UTC.
    fn to_utc_secs(self, year: i32, offset_secs: i32) -> Option<i64> {
        let midnight = self.day.date_in(year)?.and_hms_opt(0, 0, 0)?.and_utc();
        Some(midnight.timestamp() + i64::from(self.time_secs) - i64::from(offset_secs))
    }
}

impl PosixTz {
    pub fn parse(tz: &str) -> io::Result<Self> {
        let mut parser = Parser {
            bytes: tz.as_bytes(),
            pos: 0,
        };
        let parsed = parser.posix_tz()?;
        if !parser.is_done() {
            return bogus(format!("trailing data in TZ string {tz:?}"));
        }
        Ok(parsed)
    }

    /// Zone state at `utc_secs` seconds since the epoch.
    pub fn state_at(&self, utc_secs: i64) -> ZoneState {
        let standard = || ZoneState::new(self.std_offset_secs, false, &self.std_abbreviation);
        let Some(dst) = &self.dst else {
            return standard();
        };
        let Some(local) = DateTime::from_timestamp(utc_secs + i64::from(self.std_offset_secs), 0)
        else {
            return standard();
        };
        let year = local.year();
        let (Some(start), Some(end)) = (
            dst.start.to_utc_secs(year, self.std_offset_secs),
            dst.end.to_utc_secs(year, dst.offset_secs),
        ) else {
            return standard();
        };

        let in_dst = if start < end {
            (start..end).contains(&utc_secs)
        } else {
            // Southern hemisphere: daylight time spans the new year.
            !(end..start).contains(&utc_secs)
        };
        if in_dst {
            ZoneState::new(dst.offset_secs, true, &dst.abbreviation)
        } else {
            standard()
        }
    }
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn is_done(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, b: u8) -> io::Result<()> {
        if self.eat(b) {
            Ok(())
        } else {
            bogus(format!("expected {:?} at offset {} of TZ string", b as char, self.pos))
        }
    }

    fn posix_tz(&mut self) -> io::Result<PosixTz> {
        let std_abbreviation = self.abbreviation()?;
        let std_offset_secs = -self.offset()?;
        if self.is_done() {
            return Ok(PosixTz {
                std_abbreviation,
                std_offset_secs,
                dst: None,
            });
        }

        let dst_abbreviation = self.abbreviation()?;
        let dst_offset_secs = match self.peek() {
            None | Some(b',') => std_offset_secs + 3600,
            Some(_) => -self.offset()?,
        };
        let (start, end) = if self.eat(b',') {
            self.rule()?
        } else {
            let mut default = Parser {
                bytes: DEFAULT_RULE.as_bytes(),
                pos: 0,
            };
            default.rule()?
        };

        Ok(PosixTz {
            std_abbreviation,
            std_offset_secs,
            dst: Some(PosixDst {
                abbreviation: dst_abbreviation,
                offset_secs: dst_offset_secs,
                start,
                end,
            }),
        })
    }

    fn abbreviation(&mut self) -> io::Result<String> {
        let bytes = self.bytes;
        let start = self.pos;
        let name = if self.eat(b'<') {
            while matches!(self.peek(), Some(b) if b.is_ascii_alphanumeric() || b == b'+' || b == b'-')
            {
                self.pos += 1;
            }
            let name = &bytes[start + 1..self.pos];
            self.expect(b'>')?;
            name
        } else {
            while matches!(self.peek(), Some(b) if b.is_ascii_alphabetic()) {
                self.pos += 1;
            }
            &bytes[start..self.pos]
        };
        if name.len() < 3 {
            return bogus("time zone abbreviation shorter than three characters");
        }
        Ok(String::from_utf8_lossy(name).into_owned())
    }

    /// `[+-]hh[:mm[:ss]]`, in seconds, with the sign as written.
    fn offset(&mut self) -> io::Result<i32> {
        self.signed_hms(24)
    }

    fn signed_hms(&mut self, max_hours: i32) -> io::Result<i32> {
        let sign = if self.eat(b'-') {
            -1
        } else {
            self.eat(b'+');
            1
        };
        let hours = self.number(3)?;
        if hours > max_hours {
            return bogus(format!("hour {hours} out of range in TZ string"));
        }
        let mut secs = hours * 3600;
        if self.eat(b':') {
            let minutes = self.number(2)?;
            if minutes > 59 {
                return bogus("minute out of range in TZ string");
            }
            secs += minutes * 60;
            if self.eat(b':') {
                let seconds = self.number(2)?;
                if seconds > 59 {
                    return bogus("second out of range in TZ string");
                }
                secs += seconds;
            }
        }
        Ok(sign * secs)
    }

    fn number(&mut self, max_digits: usize) -> io::Result<i32> {
        let start = self.pos;
        let mut n = 0i32;
        while let Some(b) = self.peek().filter(u8::is_ascii_digit) {
            if self.pos - start == max_digits {
                return bogus("too many digits in TZ string");
            }
            n = n * 10 + i32::from(b - b'0');
            self.pos += 1;
        }
        if self.pos == start {
            return bogus(format!("expected a number at offset {} of TZ string", start));
        }
        Ok(n)
    }

    fn rule(&mut self) -> io::Result<(RuleTime, RuleTime)> {
        let start = self.rule_time()?;
        self.expect(b',')?;
        let end = self.rule_time()?;
        Ok((start, end))
    }

    fn rule_time(&mut self) -> io::Result<RuleTime> {
        let day = self.rule_day()?;
        let time_secs = if self.eat(b'/') {
            self.signed_hms(167)?
        } else {
            DEFAULT_TIME_SECS
        };
        Ok(RuleTime { day, time_secs })
    }

    fn rule_day(&mut self) -> io::Result<RuleDay> {
        if self.eat(b'J') {
            let n = self.number(3)?;
            if !(1..=365).contains(&n) {
                return bogus(format!("julian day J{n} out of range"));
            }
            Ok(RuleDay::JulianNoLeap(n as u16))
        } else if self.eat(b'M') {
            let month = self.number(2)?;
            self.expect(b'.')?;
            let week = self.number(1)?;
            self.expect(b'.')?;
            let weekday = self.number(1)?;
            if !(1..=12).contains(&month) || !(1..=5).contains(&week) || weekday > 6 {
                return bogus(format!("invalid rule M{month}.{week}.{weekday}"));
            }
            Ok(RuleDay::MonthWeekDay {
                month: month as u8,
                week: week as u8,
                weekday: weekday as u8,
            })
        } else {
            let n = self.number(3)?;
            if n > 365 {
                return bogus(format!("day of year {n} out of range"));
            }
            Ok(RuleDay::Julian(n as u16))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> i64 {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
            .and_utc()
            .timestamp()
    }

    #[test]
    fn fixed_offset() {
        let tz = PosixTz::parse("JST-9").unwrap();
        assert_eq!(32400, tz.std_offset_secs);
        assert_eq!(None, tz.dst);
        assert_eq!(ZoneState::new(32400, false, "JST"), tz.state_at(0));

        let tz = PosixTz::parse("<+0545>-5:45").unwrap();
        assert_eq!(ZoneState::new(20700, false, "+0545"), tz.state_at(0));

        let tz = PosixTz::parse("<-03>3").unwrap();
        assert_eq!(-10800, tz.std_offset_secs);
        assert_eq!("-03", tz.std_abbreviation);
    }

    #[test]
    fn europe() {
        let tz = PosixTz::parse("CET-1CEST,M3.5.0,M10.5.0/3").unwrap();
        let dst = tz.dst.as_ref().unwrap();
        assert_eq!(7200, dst.offset_secs);
        assert_eq!(DEFAULT_TIME_SECS, dst.start.time_secs);
        assert_eq!(3 * 3600, dst.end.time_secs);

        assert!(!tz.state_at(utc(2020, 3, 29, 0, 59) + 59).is_dst);
        assert_eq!(ZoneState::new(7200, true, "CEST"), tz.state_at(utc(2020, 3, 29, 1, 0)));
        assert!(tz.state_at(utc(2020, 10, 25, 0, 59) + 59).is_dst);
        assert_eq!(ZoneState::new(3600, false, "CET"), tz.state_at(utc(2020, 10, 25, 1, 0)));
    }

    #[test]
    fn southern_hemisphere() {
        let tz = PosixTz::parse("AEST-10AEDT,M10.1.0,M4.1.0/3").unwrap();
        assert!(tz.state_at(utc(2021, 1, 15, 0, 0)).is_dst);
        assert!(!tz.state_at(utc(2021, 6, 15, 0, 0)).is_dst);
        assert!(tz.state_at(utc(2021, 12, 31, 20, 0)).is_dst);
        // 2021-04-04 03:00 AEDT == 2021-04-03 16:00Z
        assert!(tz.state_at(utc(2021, 4, 3, 15, 59)).is_dst);
        assert!(!tz.state_at(utc(2021, 4, 3, 16, 0)).is_dst);
        // 2021-10-03 02:00 AEST == 2021-10-02 16:00Z
        assert!(!tz.state_at(utc(2021, 10, 2, 15, 59)).is_dst);
        assert!(tz.state_at(utc(2021, 10, 2, 16, 0)).is_dst);
    }

    #[test]
    fn default_rule_and_offset() {
        let tz = PosixTz::parse("EST5EDT").unwrap();
        let dst = tz.dst.as_ref().unwrap();
        assert_eq!(-4 * 3600, dst.offset_secs);
        assert_eq!(
            RuleDay::MonthWeekDay {
                month: 3,
                week: 2,
                weekday: 0
            },
            dst.start.day
        );
        // Second Sunday of March 2021 is the 14th, 02:00 EST == 07:00Z.
        assert!(!tz.state_at(utc(2021, 3, 14, 6, 59)).is_dst);
        assert!(tz.state_at(utc(2021, 3, 14, 7, 0)).is_dst);
    }

    #[test]
    fn extended_times() {
        // Greenland-style negative time, and all-year daylight time.
        let tz = PosixTz::parse("<-02>2<-01>,M3.5.0/-1,M10.5.0/0").unwrap();
        assert_eq!(-3600, tz.dst.as_ref().unwrap().start.time_secs);

        let tz = PosixTz::parse("EST5EDT,0/0,J365/25").unwrap();
        assert!(tz.state_at(utc(2021, 1, 1, 6, 0)).is_dst);
        assert!(tz.state_at(utc(2021, 7, 1, 0, 0)).is_dst);
        assert!(tz.state_at(utc(2021, 12, 31, 23, 0)).is_dst);
    }

    #[test]
    fn rule_days() {
        assert_eq!(
            NaiveDate::from_ymd_opt(2020, 3, 1),
            RuleDay::JulianNoLeap(60).date_in(2020)
        );
        assert_eq!(
            NaiveDate::from_ymd_opt(2021, 3, 1),
            RuleDay::JulianNoLeap(60).date_in(2021)
        );
        assert_eq!(NaiveDate::from_ymd_opt(2020, 2, 29), RuleDay::Julian(59).date_in(2020));
        // Last Sunday of October 2020 is the 25th; of May 2021, the 30th.
        let last_sunday = |month| RuleDay::MonthWeekDay {
            month,
            week: 5,
            weekday: 0,
        };
        assert_eq!(NaiveDate::from_ymd_opt(2020, 10, 25), last_sunday(10).date_in(2020));
        assert_eq!(NaiveDate::from_ymd_opt(2021, 5, 30), last_sunday(5).date_in(2021));
    }

    #[test]
    fn rejects_garbage() {
        for bad in ["", "A-1", "CET", "CET-1CEST,M13.1.0,M10.5.0", "CET-1CEST,M3.5.0", "CET-1x", "<AB>1", "CET-1CEST,J0,J5"] {
            assert!(PosixTz::parse(bad).is_err(), "{bad:?} should not parse");
        }
    }
}
