//! Wall-clock time in the observance timezone.

use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Duration, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

/// IANA names for Kyiv, current spelling first.
const KYIV_ZONE_NAMES: [&str; 2] = ["Europe/Kyiv", "Europe/Kiev"];

/// Hour, minute and second in the observance timezone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WallTime {
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl WallTime {
    pub const fn new(hour: u32, minute: u32, second: u32) -> Self {
        Self {
            hour,
            minute,
            second,
        }
    }

    /// Decimal `hhmm` encoding used for range checks, e.g. 08:55 -> 855.
    pub fn hhmm(&self) -> u32 {
        100 * self.hour + self.minute
    }

    fn from_datetime<T: Timelike>(t: &T) -> Self {
        Self::new(t.hour(), t.minute(), t.second())
    }
}

/// Source of the current wall time.
pub trait Clock {
    fn now(&self) -> WallTime;
}

/// Locate the Kyiv timezone.
///
/// A missing zone is a configuration error: without it every displayed time is wrong.
pub fn kyiv_timezone() -> Result<Tz> {
    KYIV_ZONE_NAMES
        .iter()
        .find_map(|name| Tz::from_str(name).ok())
        .ok_or_else(|| anyhow!("Cannot find Ukrainian time zone ({})", KYIV_ZONE_NAMES.join(", ")))
}

/// The system clock viewed in a fixed timezone, optionally shifted by a constant offset.
#[derive(Clone, Debug)]
pub struct ZonedClock {
    tz: Tz,
    offset: Duration,
}

impl ZonedClock {
    pub fn new(tz: Tz) -> Self {
        Self {
            tz,
            offset: Duration::zero(),
        }
    }

    /// A clock whose current reading starts at `start` (in `tz`) and then runs in real time.
    pub fn starting_at(tz: Tz, start: NaiveTime) -> Self {
        let now = Utc::now().with_timezone(&tz);
        Self {
            tz,
            offset: shift_to(now.time(), start),
        }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    fn at(&self, utc: DateTime<Utc>) -> WallTime {
        let local = self.tz.from_utc_datetime(&(utc + self.offset).naive_utc());
        WallTime::from_datetime(&local)
    }
}

impl Clock for ZonedClock {
    fn now(&self) -> WallTime {
        self.at(Utc::now())
    }
}

/// Offset that moves `from` forward to `to` within one day.
fn shift_to(from: NaiveTime, to: NaiveTime) -> Duration {
    let delta = to.signed_duration_since(from);
    if delta < Duration::zero() {
        delta + Duration::days(1)
    } else {
        delta
    }
}

/// Parse `HH:MM:SS` (or `HH:MM`) as given on the command line.
pub fn parse_start_at(raw: &str) -> Result<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .with_context(|| format!("parse start time {raw:?}; expected HH:MM[:SS]"))
}

/// `H:MM`, hours unpadded.
pub fn format_time(hour: u32, minute: u32) -> String {
    format!("{hour}:{minute:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hhmm_encodes_hour_and_minute() {
        assert_eq!(WallTime::new(8, 55, 0).hhmm(), 855);
        assert_eq!(WallTime::new(0, 7, 59).hhmm(), 7);
        assert_eq!(WallTime::new(23, 59, 59).hhmm(), 2359);
    }

    #[test]
    fn kyiv_timezone_is_available() {
        let tz = kyiv_timezone().unwrap();
        assert!(KYIV_ZONE_NAMES.contains(&tz.name()));
    }

    #[test]
    fn zoned_clock_converts_from_utc() {
        let clock = ZonedClock::new(kyiv_timezone().unwrap());
        // Kyiv is UTC+2 in January.
        let winter = Utc.with_ymd_and_hms(2024, 1, 7, 7, 0, 30).unwrap();
        assert_eq!(clock.at(winter), WallTime::new(9, 0, 30));
        // And UTC+3 in summer.
        let summer = Utc.with_ymd_and_hms(2024, 7, 7, 5, 59, 54).unwrap();
        assert_eq!(clock.at(summer), WallTime::new(8, 59, 54));
    }

    #[test]
    fn shift_to_wraps_forward_past_midnight() {
        let from = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        let to = NaiveTime::from_hms_opt(8, 59, 50).unwrap();
        let shift = shift_to(from, to);
        assert!(shift > Duration::zero());
        assert_eq!(from + shift, to);
    }

    #[test]
    fn starting_at_reads_the_requested_time() {
        let tz = kyiv_timezone().unwrap();
        let start = NaiveTime::from_hms_opt(8, 59, 50).unwrap();
        let clock = ZonedClock::starting_at(tz, start);
        let now = clock.now();
        assert_eq!((now.hour, now.minute), (8, 59));
        assert!(now.second >= 50);
    }

    #[test]
    fn parse_start_at_accepts_both_forms() {
        assert_eq!(
            parse_start_at("08:59:54").unwrap(),
            NaiveTime::from_hms_opt(8, 59, 54).unwrap()
        );
        assert_eq!(
            parse_start_at(" 9:00 ").unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap()
        );
        assert!(parse_start_at("25:00").is_err());
        assert!(parse_start_at("soon").is_err());
    }

    #[test]
    fn format_time_pads_minutes_only() {
        assert_eq!(format_time(8, 5), "8:05");
        assert_eq!(format_time(12, 30), "12:30");
        assert_eq!(format_time(0, 0), "0:00");
    }
}
