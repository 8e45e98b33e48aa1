//! Scheduled time-of-day handling.
//!
//! Route schedules carry a departure and arrival time of day with no date.
//! Historical rows were imported from spreadsheets, which sometimes render a
//! bare time as `1900-01-01 HH:MM:SS`; the date part there is an artifact and
//! is discarded.

use std::fmt;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

const MINUTES_PER_DAY: u16 = 24 * 60;
const NOON: u16 = 12 * 60;
const EVENING: u16 = 18 * 60;

/// A time of day with minute precision, stored as minutes since midnight.
///
/// # Examples
///
/// ```
/// use linehaul_server::domain::TimeOfDay;
///
/// let t = TimeOfDay::parse("22:15").unwrap();
/// assert_eq!(t.minutes(), 22 * 60 + 15);
/// assert!(t.is_evening());
///
/// // Spreadsheet exports
/// assert_eq!(TimeOfDay::parse_legacy("1900-01-01 02:30:00").unwrap().to_string(), "02:30");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    /// Build from hour and minute.
    pub fn from_hm(hour: u16, minute: u16) -> Result<Self, TimeError> {
        if hour > 23 {
            return Err(TimeError::new("hour must be 0-23"));
        }
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }
        Ok(Self(hour * 60 + minute))
    }

    /// Parse `HH:MM` or `HH:MM:SS`. Seconds are dropped.
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let bytes = s.as_bytes();
        if bytes.len() != 5 && bytes.len() != 8 {
            return Err(TimeError::new("expected HH:MM or HH:MM:SS"));
        }
        if bytes[2] != b':' {
            return Err(TimeError::new("expected colon at position 2"));
        }

        let hour =
            parse_two_digits(&bytes[0..2]).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        let minute = parse_two_digits(&bytes[3..5])
            .ok_or_else(|| TimeError::new("invalid minute digits"))?;

        if bytes.len() == 8 {
            if bytes[5] != b':' {
                return Err(TimeError::new("expected colon at position 5"));
            }
            let second = parse_two_digits(&bytes[6..8])
                .ok_or_else(|| TimeError::new("invalid second digits"))?;
            if second > 59 {
                return Err(TimeError::new("second must be 0-59"));
            }
        }

        Self::from_hm(hour, minute)
    }

    /// Parse a time as found in historical route imports.
    ///
    /// Accepts everything [`TimeOfDay::parse`] does, plus a leading
    /// `YYYY-MM-DD ` or `YYYY-MM-DDT` date which is ignored.
    pub fn parse_legacy(s: &str) -> Result<Self, TimeError> {
        let s = s.trim();
        let time_part = match s.len() {
            19 if matches!(s.as_bytes()[10], b' ' | b'T') => &s[11..],
            16 if matches!(s.as_bytes()[10], b' ' | b'T') => &s[11..],
            _ => s,
        };
        Self::parse(time_part)
    }

    /// Minutes since midnight.
    pub fn minutes(&self) -> u16 {
        self.0
    }

    pub fn hour(&self) -> u16 {
        self.0 / 60
    }

    pub fn minute(&self) -> u16 {
        self.0 % 60
    }

    /// At or after 18:00.
    pub fn is_evening(&self) -> bool {
        self.0 >= EVENING
    }

    /// Strictly after 12:00.
    pub fn is_after_noon(&self) -> bool {
        self.0 > NOON
    }

    /// Strictly before 12:00.
    pub fn is_before_noon(&self) -> bool {
        self.0 < NOON
    }

    /// Add minutes, wrapping past midnight.
    pub fn wrapping_add_minutes(&self, minutes: u32) -> Self {
        let total = (self.0 as u32 + minutes) % MINUTES_PER_DAY as u32;
        Self(total as u16)
    }

    /// Convert to a chrono time.
    pub fn to_naive_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour() as u32, self.minute() as u32, 0)
            .unwrap_or(NaiveTime::MIN)
    }
}

impl From<NaiveTime> for TimeOfDay {
    fn from(t: NaiveTime) -> Self {
        Self((t.hour() * 60 + t.minute()) as u16)
    }
}

fn parse_two_digits(bytes: &[u8]) -> Option<u16> {
    match bytes {
        [a, b] if a.is_ascii_digit() && b.is_ascii_digit() => {
            Some(((a - b'0') * 10 + (b - b'0')) as u16)
        }
        _ => None,
    }
}

impl fmt::Debug for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimeOfDay({})", self)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        TimeOfDay::parse_legacy(&s).map_err(serde::de::Error::custom)
    }
}
