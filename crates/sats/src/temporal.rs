use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::error::KeyError;

/// A calendar date, wire-encoded as the integer `yyyymmdd`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct LocalDate(NaiveDate);

impl LocalDate {
    pub fn new(year: i32, month: u32, day: u32) -> Result<LocalDate, KeyError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(LocalDate)
            .ok_or_else(|| KeyError::BadFormat(format!("{year:04}-{month:02}-{day:02}")))
    }

    pub fn to_iso_int(self) -> i32 {
        self.0.year() * 10_000 + self.0.month() as i32 * 100 + self.0.day() as i32
    }

    pub fn from_iso_int(v: i32) -> Result<LocalDate, KeyError> {
        if !(0..=99_991_231).contains(&v) {
            return Err(KeyError::BadFormat(v.to_string()));
        }
        let year = v / 10_000;
        let month = (v / 100) % 100;
        let day = v % 100;
        LocalDate::new(year, month as u32, day as u32)
    }

    /// Parses the strict ISO form `yyyy-mm-dd`: no omitted delimiters, no whitespace.
    pub fn parse_iso(s: &str) -> Result<LocalDate, KeyError> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(LocalDate)
            .map_err(|_| KeyError::BadFormat(s.to_owned()))
    }
}

impl std::fmt::Display for LocalDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// A time of day with millisecond precision, wire-encoded as the integer `hhmmssfff`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct LocalTime(NaiveTime);

impl LocalTime {
    pub fn new(hour: u32, minute: u32, second: u32, milli: u32) -> Result<LocalTime, KeyError> {
        NaiveTime::from_hms_milli_opt(hour, minute, second, milli)
            .map(LocalTime)
            .ok_or_else(|| KeyError::BadFormat(format!("{hour:02}:{minute:02}:{second:02}.{milli:03}")))
    }

    pub fn to_iso_int(self) -> i32 {
        self.0.hour() as i32 * 10_000_000
            + self.0.minute() as i32 * 100_000
            + self.0.second() as i32 * 1_000
            + (self.0.nanosecond() / 1_000_000) as i32
    }

    pub fn from_iso_int(v: i32) -> Result<LocalTime, KeyError> {
        if !(0..=235_959_999).contains(&v) {
            return Err(KeyError::BadFormat(v.to_string()));
        }
        let hour = v / 10_000_000;
        let minute = (v / 100_000) % 100;
        let second = (v / 1_000) % 100;
        let milli = v % 1_000;
        LocalTime::new(hour as u32, minute as u32, second as u32, milli as u32)
    }

    /// Parses the strict ISO form `hh:mm:ss.fff`.
    pub fn parse_iso(s: &str) -> Result<LocalTime, KeyError> {
        NaiveTime::parse_from_str(s, "%H:%M:%S%.3f")
            .map(LocalTime)
            .map_err(|_| KeyError::BadFormat(s.to_owned()))
    }
}

impl std::fmt::Display for LocalTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%H:%M:%S%.3f"))
    }
}

/// A time of day truncated to the minute, wire-encoded as the integer `hhmm`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct LocalMinute {
    hour: u32,
    minute: u32,
}

impl LocalMinute {
    pub fn new(hour: u32, minute: u32) -> Result<LocalMinute, KeyError> {
        if hour > 23 || minute > 59 {
            return Err(KeyError::BadFormat(format!("{hour:02}:{minute:02}")));
        }
        Ok(LocalMinute { hour, minute })
    }

    pub fn to_iso_int(self) -> i32 {
        self.hour as i32 * 100 + self.minute as i32
    }

    pub fn from_iso_int(v: i32) -> Result<LocalMinute, KeyError> {
        if !(0..=2_359).contains(&v) {
            return Err(KeyError::BadFormat(v.to_string()));
        }
        LocalMinute::new((v / 100) as u32, (v % 100) as u32)
    }

    /// Parses the strict ISO form `hh:mm`.
    pub fn parse_iso(s: &str) -> Result<LocalMinute, KeyError> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 2 || parts[0].len() != 2 || parts[1].len() != 2 {
            return Err(KeyError::BadFormat(s.to_owned()));
        }
        let hour: u32 = parts[0].parse().map_err(|_| KeyError::BadFormat(s.to_owned()))?;
        let minute: u32 = parts[1].parse().map_err(|_| KeyError::BadFormat(s.to_owned()))?;
        LocalMinute::new(hour, minute)
    }
}

impl std::fmt::Display for LocalMinute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// A date and time with millisecond precision, wire-encoded as the 64-bit integer
/// `yyyymmddhhmmssfff`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct LocalDateTime(NaiveDateTime);

impl LocalDateTime {
    pub fn new(date: LocalDate, time: LocalTime) -> LocalDateTime {
        LocalDateTime(NaiveDateTime::new(date.0, time.0))
    }

    pub fn to_iso_int(self) -> i64 {
        let date = LocalDate(self.0.date());
        let time = LocalTime(self.0.time());
        date.to_iso_int() as i64 * 1_000_000_000 + time.to_iso_int() as i64
    }

    pub fn from_iso_int(v: i64) -> Result<LocalDateTime, KeyError> {
        if v < 0 {
            return Err(KeyError::BadFormat(v.to_string()));
        }
        let date_part = (v / 1_000_000_000) as i32;
        let time_part = (v % 1_000_000_000) as i32;
        let date = LocalDate::from_iso_int(date_part)?;
        let time = LocalTime::from_iso_int(time_part)?;
        Ok(LocalDateTime::new(date, time))
    }

    /// Parses the strict ISO form `yyyy-mm-ddThh:mm:ss.fff`.
    pub fn parse_iso(s: &str) -> Result<LocalDateTime, KeyError> {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.3f")
            .map(LocalDateTime)
            .map_err(|_| KeyError::BadFormat(s.to_owned()))
    }
}

impl std::fmt::Display for LocalDateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%dT%H:%M:%S%.3f"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_date_iso_int_round_trip() {
        let d = LocalDate::new(2003, 5, 1).unwrap();
        assert_eq!(d.to_iso_int(), 20_030_501);
        assert_eq!(LocalDate::from_iso_int(20_030_501).unwrap(), d);
    }

    #[test]
    fn local_time_iso_int_round_trip() {
        let t = LocalTime::new(10, 15, 30, 5).unwrap();
        assert_eq!(t.to_iso_int(), 101_530_005);
        assert_eq!(LocalTime::from_iso_int(101_530_005).unwrap(), t);
    }

    #[test]
    fn local_minute_iso_int_round_trip() {
        let m = LocalMinute::new(10, 15).unwrap();
        assert_eq!(m.to_iso_int(), 1015);
        assert_eq!(LocalMinute::from_iso_int(1015).unwrap(), m);
    }

    #[test]
    fn local_date_time_iso_int_round_trip() {
        let d = LocalDate::new(2003, 5, 1).unwrap();
        let t = LocalTime::new(10, 15, 30, 5).unwrap();
        let dt = LocalDateTime::new(d, t);
        assert_eq!(dt.to_iso_int(), 20_030_501_101_530_005);
        assert_eq!(LocalDateTime::from_iso_int(20_030_501_101_530_005).unwrap(), dt);
    }

    #[test]
    fn strict_parse_rejects_loose_forms() {
        assert!(LocalDate::parse_iso("2003/05/01").is_err());
        assert!(LocalTime::parse_iso("10:15:30").is_err());
        assert!(LocalMinute::parse_iso("9:15").is_err());
    }
}
