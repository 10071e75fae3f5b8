//! Services
//!
//! Operations shared by the HTTP server and the import CLI.

pub mod import;
pub mod readings;

pub use import::{parse_readings_csv, parse_readings_file, ImportError, ParsedUpload};
pub use readings::{CsvExport, ReadingStore, StoreError, StoreResult};
