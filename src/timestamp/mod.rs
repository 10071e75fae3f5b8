//! Timestamp module
//!
//! Heuristic parsing of uploaded timestamp strings and range filtering.

pub mod normalizer;
pub mod range;

pub use normalizer::{normalize, reference_date, ParsedTimestamp, TimestampFormat};
pub use range::{filter_and_sort, Filtered, TimeRange, Timestamped};
