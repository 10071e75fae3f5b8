//! Timestamp normalization
//!
//! Turns the free-form timestamp strings found in uploaded files into
//! comparable `NaiveDateTime` values. Formats are tried in a fixed order and
//! the first one that consumes the whole string wins.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Recognized timestamp layouts, in match priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampFormat {
    /// `08:15:30.250`
    TimeWithFraction,
    /// `08:15:30`
    Time,
    /// `2024-03-01 08:15:30`
    DateTimeSpace,
    /// `2024-03-01T08:15:30`
    DateTimeIso,
}

impl TimestampFormat {
    /// All formats, most specific time-only layout first
    pub const PRIORITY: [TimestampFormat; 4] = [
        TimestampFormat::TimeWithFraction,
        TimestampFormat::Time,
        TimestampFormat::DateTimeSpace,
        TimestampFormat::DateTimeIso,
    ];

    pub fn pattern(&self) -> &'static str {
        match self {
            TimestampFormat::TimeWithFraction => "%H:%M:%S%.f",
            TimestampFormat::Time => "%H:%M:%S",
            TimestampFormat::DateTimeSpace => "%Y-%m-%d %H:%M:%S",
            TimestampFormat::DateTimeIso => "%Y-%m-%dT%H:%M:%S",
        }
    }

    /// Parse `s` with this layout only
    pub fn parse(&self, s: &str) -> Option<NaiveDateTime> {
        if !self.has_shape(s) {
            return None;
        }
        match self {
            TimestampFormat::TimeWithFraction | TimestampFormat::Time => {
                NaiveTime::parse_from_str(s, self.pattern())
                    .ok()
                    .map(|t| reference_date().and_time(t))
            }
            TimestampFormat::DateTimeSpace | TimestampFormat::DateTimeIso => {
                NaiveDateTime::parse_from_str(s, self.pattern()).ok()
            }
        }
    }

    /// Digit layout check. chrono alone also takes leap seconds, nine-digit
    /// fractions and signed or short years.
    fn has_shape(&self, s: &str) -> bool {
        match self {
            TimestampFormat::TimeWithFraction => match s.split_once('.') {
                Some((clock, fraction)) => clock_shape(clock) && digits(fraction, 1, 6),
                None => false,
            },
            TimestampFormat::Time => clock_shape(s),
            TimestampFormat::DateTimeSpace => match s.split_once(' ') {
                Some((date, clock)) => date_shape(date) && clock_shape(clock),
                None => false,
            },
            TimestampFormat::DateTimeIso => match s.split_once('T') {
                Some((date, clock)) => date_shape(date) && clock_shape(clock),
                None => false,
            },
        }
    }
}

fn digits(s: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
}

/// `H:M:S`, one or two digits each, seconds below 60
fn clock_shape(s: &str) -> bool {
    let parts: Vec<&str> = s.split(':').collect();
    match parts.as_slice() {
        [h, m, sec] => {
            digits(h, 1, 2)
                && digits(m, 1, 2)
                && digits(sec, 1, 2)
                && sec.parse::<u32>().map_or(false, |sec| sec < 60)
        }
        _ => false,
    }
}

/// `YYYY-M-D`, four-digit unsigned year
fn date_shape(s: &str) -> bool {
    let parts: Vec<&str> = s.split('-').collect();
    match parts.as_slice() {
        [y, m, d] => digits(y, 4, 4) && digits(m, 1, 2) && digits(d, 1, 2),
        _ => false,
    }
}

/// Outcome of normalizing a timestamp string.
///
/// `NoMatch` is an ordinary result, not an error: callers decide what an
/// unrecognized timestamp means for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedTimestamp {
    Matched(NaiveDateTime),
    NoMatch,
}

impl ParsedTimestamp {
    pub fn value(self) -> Option<NaiveDateTime> {
        match self {
            ParsedTimestamp::Matched(value) => Some(value),
            ParsedTimestamp::NoMatch => None,
        }
    }
}

/// Date given to time-only timestamps (1900-01-01)
pub fn reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Normalize a timestamp string.
///
/// Time-only values land on `reference_date()`, so they sort before any
/// dated value from 1900 onwards.
pub fn normalize(s: &str) -> ParsedTimestamp {
    if s.is_empty() || s.trim() != s {
        return ParsedTimestamp::NoMatch;
    }
    TimestampFormat::PRIORITY
        .iter()
        .find_map(|format| format.parse(s))
        .map_or(ParsedTimestamp::NoMatch, ParsedTimestamp::Matched)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_time_only_uses_reference_date() {
        assert_eq!(normalize("08:15:30"), ParsedTimestamp::Matched(at(1900, 1, 1, 8, 15, 30)));
        assert!(TimestampFormat::TimeWithFraction.parse("08:15:30").is_none());
    }

    #[test]
    fn test_fraction_is_kept() {
        let parsed = normalize("08:15:30.250").value().unwrap();
        assert_eq!(parsed, at(1900, 1, 1, 8, 15, 30) + chrono::Duration::milliseconds(250));
        assert!(normalize("08:15:30.123456").value().is_some());
    }

    #[test]
    fn test_single_digit_hour() {
        assert_eq!(normalize("8:05:00"), ParsedTimestamp::Matched(at(1900, 1, 1, 8, 5, 0)));
    }

    #[test]
    fn test_full_dates() {
        assert_eq!(
            normalize("2024-03-01 08:15:30"),
            ParsedTimestamp::Matched(at(2024, 3, 1, 8, 15, 30))
        );
        assert_eq!(
            normalize("2024-03-01T08:15:30"),
            ParsedTimestamp::Matched(at(2024, 3, 1, 8, 15, 30))
        );
        assert_eq!(
            normalize("2024-3-1 8:05:00"),
            ParsedTimestamp::Matched(at(2024, 3, 1, 8, 5, 0))
        );
        assert!(TimestampFormat::DateTimeSpace.parse("2024-03-01T08:15:30").is_none());
    }

    #[test]
    fn test_whole_string_must_match() {
        assert_eq!(normalize("08:15"), ParsedTimestamp::NoMatch);
        assert_eq!(normalize("08:15:30Z"), ParsedTimestamp::NoMatch);
        assert_eq!(normalize("08:15:30."), ParsedTimestamp::NoMatch);
        assert_eq!(normalize("2024-03-01T08:15:30Z"), ParsedTimestamp::NoMatch);
        assert_eq!(normalize("2024-03-01T08:15:30.5"), ParsedTimestamp::NoMatch);
        assert_eq!(normalize("2024-03-01"), ParsedTimestamp::NoMatch);
        assert_eq!(normalize(" 08:15:30"), ParsedTimestamp::NoMatch);
        assert_eq!(normalize("08:00:60"), ParsedTimestamp::NoMatch);
        assert_eq!(normalize("2024-03-01 08:00:60"), ParsedTimestamp::NoMatch);
        assert_eq!(normalize("2024-03-01T23:59:60"), ParsedTimestamp::NoMatch);
        assert_eq!(normalize("08:00:00.1234567"), ParsedTimestamp::NoMatch);
        assert_eq!(normalize("08:00:00.1234567890123"), ParsedTimestamp::NoMatch);
        assert_eq!(normalize("24-03-01 08:00:00"), ParsedTimestamp::NoMatch);
        assert_eq!(normalize("+2024-03-01 08:00:00"), ParsedTimestamp::NoMatch);
        assert_eq!(normalize("02024-03-01 08:00:00"), ParsedTimestamp::NoMatch);
        assert_eq!(normalize("008:00:00"), ParsedTimestamp::NoMatch);
    }

    #[test]
    fn test_garbage_is_no_match() {
        assert_eq!(normalize(""), ParsedTimestamp::NoMatch);
        assert_eq!(normalize("yesterday"), ParsedTimestamp::NoMatch);
        assert_eq!(normalize("25:00:00"), ParsedTimestamp::NoMatch);
        assert_eq!(normalize("2024-13-01 08:00:00"), ParsedTimestamp::NoMatch);
        assert_eq!(normalize("n/a").value(), None);
    }

    #[test]
    fn test_time_only_sorts_before_dated_values() {
        let time_only = normalize("23:59:59").value().unwrap();
        let dated = normalize("1970-01-01 00:00:00").value().unwrap();
        assert!(time_only < dated);
    }
}
