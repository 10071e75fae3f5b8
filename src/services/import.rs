//! CSV import
//!
//! Parses an uploaded vital-sign CSV into reading drafts. Nothing here touches
//! the database: a file is either fully valid or rejected as a whole.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use thiserror::Error;

use crate::models::{ReadingCreate, READING_COLUMNS};

const PATIENT_COLUMN: &str = "paciente_id";

/// Reasons an uploaded file is rejected
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("paciente_id column missing")]
    MissingPatientColumn,

    #[error("file must contain exactly one paciente_id")]
    PatientCount { found: usize },

    #[error("paciente_id must not be empty")]
    EmptyPatientId,

    #[error("failed parsing row {row}: invalid {kind} '{value}' in column {column}")]
    InvalidField {
        row: usize,
        column: &'static str,
        kind: &'static str,
        value: String,
    },

    #[error("invalid csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// A validated single-patient upload
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedUpload {
    pub paciente_id: String,
    pub rows: Vec<ReadingCreate>,
}

/// Positions of the known columns within a file's header
struct ColumnIndex {
    positions: [Option<usize>; READING_COLUMNS.len()],
}

impl ColumnIndex {
    fn new(headers: &[String]) -> Self {
        let mut positions = [None; READING_COLUMNS.len()];
        for (slot, name) in positions.iter_mut().zip(READING_COLUMNS) {
            *slot = headers.iter().position(|h| h == name);
        }
        Self { positions }
    }

    fn position(&self, column: &str) -> Option<usize> {
        READING_COLUMNS
            .iter()
            .position(|c| *c == column)
            .and_then(|i| self.positions[i])
    }

    /// Non-empty cell for `column`, if the file has that column
    fn cell<'r>(&self, record: &'r csv::StringRecord, column: &str) -> Option<&'r str> {
        self.position(column)
            .and_then(|i| record.get(i))
            .filter(|value| !value.is_empty())
    }
}

fn text(value: Option<&str>) -> Option<String> {
    value.map(String::from)
}

fn integer(row: usize, column: &'static str, value: Option<&str>) -> Result<Option<i64>, ImportError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => v.parse().map(Some).map_err(|_| ImportError::InvalidField {
            row,
            column,
            kind: "integer",
            value: v.to_string(),
        }),
    }
}

fn decimal(row: usize, column: &'static str, value: Option<&str>) -> Result<Option<f64>, ImportError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => v.parse().map(Some).map_err(|_| ImportError::InvalidField {
            row,
            column,
            kind: "decimal",
            value: v.to_string(),
        }),
    }
}

/// Parse CSV content into reading drafts for exactly one patient.
///
/// Header names are trimmed. Rows shorter than the header leave the missing
/// cells absent; empty cells are absent rather than zero.
pub fn parse_readings_csv<R: Read>(reader: R) -> Result<ParsedUpload, ImportError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    let index = ColumnIndex::new(&headers);

    if index.position(PATIENT_COLUMN).is_none() {
        return Err(ImportError::MissingPatientColumn);
    }

    let records = rdr.records().collect::<Result<Vec<_>, _>>()?;

    let patients: HashSet<Option<&str>> = records
        .iter()
        .map(|record| index.cell(record, PATIENT_COLUMN))
        .collect();
    if patients.len() != 1 {
        return Err(ImportError::PatientCount {
            found: patients.len(),
        });
    }
    let paciente_id = patients
        .into_iter()
        .next()
        .flatten()
        .ok_or(ImportError::EmptyPatientId)?
        .to_string();

    let mut rows = Vec::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        let row = i + 1;
        rows.push(ReadingCreate {
            paciente_id: paciente_id.clone(),
            paciente_nome: text(index.cell(record, "paciente_nome")),
            paciente_cpf: text(index.cell(record, "paciente_cpf")),
            hr: integer(row, "hr", index.cell(record, "hr"))?,
            spo2: integer(row, "spo2", index.cell(record, "spo2"))?,
            pressao_sys: integer(row, "pressao_sys", index.cell(record, "pressao_sys"))?,
            pressao_dia: integer(row, "pressao_dia", index.cell(record, "pressao_dia"))?,
            temp: decimal(row, "temp", index.cell(record, "temp"))?,
            resp_freq: integer(row, "resp_freq", index.cell(record, "resp_freq"))?,
            status: text(index.cell(record, "status")),
            timestamp: text(index.cell(record, "timestamp")),
        });
    }

    Ok(ParsedUpload { paciente_id, rows })
}

/// Parse a CSV file from disk
pub fn parse_readings_file(path: &Path) -> Result<ParsedUpload, ImportError> {
    let file = std::fs::File::open(path).map_err(|source| ImportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_readings_csv(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<ParsedUpload, ImportError> {
        parse_readings_csv(content.as_bytes())
    }

    #[test]
    fn test_parses_all_columns() {
        let csv = "paciente_id,paciente_nome,paciente_cpf,hr,spo2,pressao_sys,pressao_dia,temp,resp_freq,status,timestamp\n\
                   p1,Ana,123,72,98,120,80,36.6,16,normal,08:00:00\n";
        let upload = parse(csv).unwrap();

        assert_eq!(upload.paciente_id, "p1");
        assert_eq!(
            upload.rows,
            vec![ReadingCreate {
                paciente_id: "p1".into(),
                paciente_nome: Some("Ana".into()),
                paciente_cpf: Some("123".into()),
                hr: Some(72),
                spo2: Some(98),
                pressao_sys: Some(120),
                pressao_dia: Some(80),
                temp: Some(36.6),
                resp_freq: Some(16),
                status: Some("normal".into()),
                timestamp: Some("08:00:00".into()),
            }]
        );
    }

    #[test]
    fn test_empty_numeric_is_absent_not_zero() {
        let upload = parse("paciente_id,hr,temp,timestamp\np1,,,\np1, 80 ,37,x\n").unwrap();

        assert_eq!(upload.rows.len(), 2);
        assert_eq!(upload.rows[0].hr, None);
        assert_eq!(upload.rows[0].temp, None);
        assert_eq!(upload.rows[0].timestamp, None);
        assert_eq!(upload.rows[1].hr, Some(80));
        assert_eq!(upload.rows[1].temp, Some(37.0));
    }

    #[test]
    fn test_headers_are_trimmed_and_unknown_columns_ignored() {
        let upload = parse("\u{feff} paciente_id , hr ,extra\np1,70,zzz\n").unwrap();
        assert_eq!(upload.rows[0].hr, Some(70));
    }

    #[test]
    fn test_short_rows_leave_cells_absent() {
        let upload = parse("paciente_id,hr,spo2\np1,70\n").unwrap();
        assert_eq!(upload.rows[0].hr, Some(70));
        assert_eq!(upload.rows[0].spo2, None);
    }

    #[test]
    fn test_missing_patient_column() {
        let err = parse("hr,spo2\n70,98\n").unwrap_err();
        assert!(matches!(err, ImportError::MissingPatientColumn));
        assert_eq!(err.to_string(), "paciente_id column missing");
    }

    #[test]
    fn test_rejects_multiple_patients() {
        let err = parse("paciente_id,hr\np1,70\np2,71\n").unwrap_err();
        assert!(matches!(err, ImportError::PatientCount { found: 2 }));
    }

    #[test]
    fn test_blank_patient_counts_as_distinct_value() {
        let err = parse("paciente_id,hr\np1,70\n,71\n").unwrap_err();
        assert!(matches!(err, ImportError::PatientCount { found: 2 }));

        let err = parse("paciente_id,hr\n,71\n").unwrap_err();
        assert!(matches!(err, ImportError::EmptyPatientId));
    }

    #[test]
    fn test_header_only_file_has_no_patient() {
        let err = parse("paciente_id,hr\n").unwrap_err();
        assert!(matches!(err, ImportError::PatientCount { found: 0 }));
    }

    #[test]
    fn test_bad_number_reports_row() {
        let err = parse("paciente_id,hr,temp\np1,70,36.5\np1,70,warm\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed parsing row 2: invalid decimal 'warm' in column temp"
        );

        let err = parse("paciente_id,hr\np1,72.5\n").unwrap_err();
        assert!(matches!(err, ImportError::InvalidField { row: 1, column: "hr", .. }));
    }

    #[test]
    fn test_quoted_fields() {
        let upload = parse("paciente_id,paciente_nome\np1,\"Silva, Ana\"\n").unwrap();
        assert_eq!(upload.rows[0].paciente_nome.as_deref(), Some("Silva, Ana"));
    }
}
