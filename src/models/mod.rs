//! Data models
//!
//! Rust structs representing database entities.

mod reading;

pub use reading::{PatientSummary, Reading, ReadingCreate, READING_COLUMNS};
