//! Reading store
//!
//! Persistence and query facade over the readings table. A `ReadingStore` is
//! built once at startup and handed to whoever needs it; it is cheap to clone.

use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::db::{migrations, Database, DbError};
use crate::models::{PatientSummary, Reading, ReadingCreate};
use crate::timestamp::{filter_and_sort, Filtered, TimeRange};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("no data found")]
    NoData,

    #[error("CSV export failed: {0}")]
    Export(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A rendered CSV export
#[derive(Debug, Clone)]
pub struct CsvExport {
    pub body: Vec<u8>,
    pub rows: usize,
    pub unparseable: usize,
}

#[derive(Clone)]
pub struct ReadingStore {
    database: Database,
}

impl ReadingStore {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Open the database at `path` and make sure the schema exists
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let database = Database::new(path)?;
        database.with_conn(migrations::run_migrations)?;
        Ok(Self::new(database))
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Insert all records in a single transaction. Either every row lands or none does.
    pub fn insert_batch(&self, records: &[ReadingCreate]) -> StoreResult<usize> {
        let inserted = self.database.with_transaction(|tx| {
            for record in records {
                Reading::insert(tx, record)?;
            }
            Ok(records.len())
        })?;
        Ok(inserted)
    }

    pub fn list_patients(&self) -> StoreResult<Vec<PatientSummary>> {
        Ok(self.database.with_conn(Reading::list_patients)?)
    }

    /// Readings for one patient, optionally narrowed to `[start, end]`.
    ///
    /// Rows whose timestamp cannot be normalized are left out whenever a bound
    /// is given; `Filtered::unparseable` says how many.
    pub fn query_readings(
        &self,
        paciente_id: &str,
        start: Option<&str>,
        end: Option<&str>,
    ) -> StoreResult<Filtered<Reading>> {
        let range = TimeRange::from_bounds(start, end);
        let readings = self
            .database
            .with_conn(|conn| Reading::list_by_patient(conn, paciente_id))?;
        let total = readings.len();

        let filtered = filter_and_sort(readings, &range);
        if range.is_active() {
            debug!(
                paciente_id,
                total,
                kept = filtered.items.len(),
                unparseable = filtered.unparseable,
                "filtered readings by time range"
            );
        }
        Ok(filtered)
    }

    /// Same selection as `query_readings`, rendered as CSV without the id column
    pub fn export_csv(
        &self,
        paciente_id: &str,
        start: Option<&str>,
        end: Option<&str>,
    ) -> StoreResult<CsvExport> {
        let filtered = self.query_readings(paciente_id, start, end)?;
        if filtered.items.is_empty() {
            return Err(StoreError::NoData);
        }

        let rows = filtered.items.len();
        let mut writer = csv::Writer::from_writer(Vec::new());
        for reading in filtered.items {
            writer
                .serialize(ReadingCreate::from(reading))
                .map_err(|e| StoreError::Export(e.to_string()))?;
        }
        let body = writer
            .into_inner()
            .map_err(|e| StoreError::Export(e.to_string()))?;

        Ok(CsvExport {
            body,
            rows,
            unparseable: filtered.unparseable,
        })
    }
}
