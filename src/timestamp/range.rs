//! Range filtering over raw timestamp strings

use chrono::NaiveDateTime;

use super::normalizer::normalize;

/// Anything carrying an unparsed timestamp string
pub trait Timestamped {
    fn raw_timestamp(&self) -> Option<&str>;

    /// Sort key; absent timestamps order as the empty string
    fn sort_key(&self) -> &str {
        self.raw_timestamp().unwrap_or("")
    }
}

/// Inclusive time window built from optional query bounds.
///
/// A window is active as soon as either bound is supplied, even when that
/// bound itself cannot be parsed. An unparseable bound leaves its side open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeRange {
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
    active: bool,
}

impl TimeRange {
    /// No filtering at all
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Build a window from raw `start`/`end` query values. Empty strings count as absent.
    pub fn from_bounds(start: Option<&str>, end: Option<&str>) -> Self {
        let start = start.filter(|s| !s.is_empty());
        let end = end.filter(|s| !s.is_empty());

        Self {
            active: start.is_some() || end.is_some(),
            start: start.and_then(|s| normalize(s).value()),
            end: end.and_then(|s| normalize(s).value()),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn start(&self) -> Option<NaiveDateTime> {
        self.start
    }

    pub fn end(&self) -> Option<NaiveDateTime> {
        self.end
    }

    pub fn contains(&self, value: NaiveDateTime) -> bool {
        self.start.map_or(true, |start| value >= start) && self.end.map_or(true, |end| value <= end)
    }
}

/// Result of applying a `TimeRange`
#[derive(Debug, Clone, PartialEq)]
pub struct Filtered<T> {
    pub items: Vec<T>,
    /// Rows dropped because their timestamp matched no known format
    pub unparseable: usize,
}

/// Filter `items` by `range` and sort them by raw timestamp string.
///
/// Membership is decided on the normalized value, but the final order is the
/// lexicographic order of the original strings. Ties keep input order.
pub fn filter_and_sort<T: Timestamped>(items: Vec<T>, range: &TimeRange) -> Filtered<T> {
    let mut unparseable = 0;

    let mut kept: Vec<T> = if range.is_active() {
        items
            .into_iter()
            .filter(|item| match item.raw_timestamp().and_then(|raw| normalize(raw).value()) {
                Some(value) => range.contains(value),
                None => {
                    unparseable += 1;
                    false
                }
            })
            .collect()
    } else {
        items
    };

    kept.sort_by(|a, b| a.sort_key().cmp(b.sort_key()));

    Filtered {
        items: kept,
        unparseable,
    }
}
