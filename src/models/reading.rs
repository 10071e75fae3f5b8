//! Reading model
//!
//! One row of vital-sign measurements for a patient, as uploaded from CSV.
//! Timestamps are opaque strings at this layer; see `crate::timestamp` for
//! how they are interpreted when filtering.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use crate::timestamp::Timestamped;

/// Column names in data-model order, shared by the CSV importer and exporter
pub const READING_COLUMNS: [&str; 11] = [
    "paciente_id",
    "paciente_nome",
    "paciente_cpf",
    "hr",
    "spo2",
    "pressao_sys",
    "pressao_dia",
    "temp",
    "resp_freq",
    "status",
    "timestamp",
];

/// A stored vital-sign reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub id: i64,
    pub paciente_id: String,
    pub paciente_nome: Option<String>,
    pub paciente_cpf: Option<String>,
    pub hr: Option<i64>,
    pub spo2: Option<i64>,
    pub pressao_sys: Option<i64>,
    pub pressao_dia: Option<i64>,
    pub temp: Option<f64>,
    pub resp_freq: Option<i64>,
    pub status: Option<String>,
    pub timestamp: Option<String>,
}

/// Data for creating a new reading.
///
/// Field order matches `READING_COLUMNS`, so serializing this struct with the
/// csv writer produces the export layout directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadingCreate {
    pub paciente_id: String,
    pub paciente_nome: Option<String>,
    pub paciente_cpf: Option<String>,
    pub hr: Option<i64>,
    pub spo2: Option<i64>,
    pub pressao_sys: Option<i64>,
    pub pressao_dia: Option<i64>,
    pub temp: Option<f64>,
    pub resp_freq: Option<i64>,
    pub status: Option<String>,
    pub timestamp: Option<String>,
}

/// Distinct patient identifier/name pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientSummary {
    pub paciente_id: String,
    pub paciente_nome: Option<String>,
}

impl Reading {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            paciente_id: row.get("paciente_id")?,
            paciente_nome: row.get("paciente_nome")?,
            paciente_cpf: row.get("paciente_cpf")?,
            hr: row.get("hr")?,
            spo2: row.get("spo2")?,
            pressao_sys: row.get("pressao_sys")?,
            pressao_dia: row.get("pressao_dia")?,
            temp: row.get("temp")?,
            resp_freq: row.get("resp_freq")?,
            status: row.get("status")?,
            timestamp: row.get("timestamp")?,
        })
    }

    /// Insert a single reading, returning its new id.
    ///
    /// Callers that need all-or-nothing semantics pass a transaction here.
    pub fn insert(conn: &Connection, data: &ReadingCreate) -> DbResult<i64> {
        conn.execute(
            r#"
            INSERT INTO readings (
                paciente_id, paciente_nome, paciente_cpf, hr, spo2,
                pressao_sys, pressao_dia, temp, resp_freq, status, timestamp
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                data.paciente_id,
                data.paciente_nome,
                data.paciente_cpf,
                data.hr,
                data.spo2,
                data.pressao_sys,
                data.pressao_dia,
                data.temp,
                data.resp_freq,
                data.status,
                data.timestamp,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// List every reading for a patient in insertion order
    pub fn list_by_patient(conn: &Connection, paciente_id: &str) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM readings WHERE paciente_id = ?1 ORDER BY id")?;
        let readings = stmt
            .query_map([paciente_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(readings)
    }

    /// Distinct (id, name) pairs, in order of first appearance
    pub fn list_patients(conn: &Connection) -> DbResult<Vec<PatientSummary>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT paciente_id, paciente_nome, MIN(id) AS first_seen
            FROM readings
            GROUP BY paciente_id, paciente_nome
            ORDER BY first_seen
            "#,
        )?;
        let patients = stmt
            .query_map([], |row| {
                Ok(PatientSummary {
                    paciente_id: row.get("paciente_id")?,
                    paciente_nome: row.get("paciente_nome")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(patients)
    }

    /// Count all readings for a patient
    pub fn count_by_patient(conn: &Connection, paciente_id: &str) -> DbResult<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM readings WHERE paciente_id = ?1",
            [paciente_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

impl Timestamped for Reading {
    fn raw_timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }
}

impl From<Reading> for ReadingCreate {
    fn from(reading: Reading) -> Self {
        Self {
            paciente_id: reading.paciente_id,
            paciente_nome: reading.paciente_nome,
            paciente_cpf: reading.paciente_cpf,
            hr: reading.hr,
            spo2: reading.spo2,
            pressao_sys: reading.pressao_sys,
            pressao_dia: reading.pressao_dia,
            temp: reading.temp,
            resp_freq: reading.resp_freq,
            status: reading.status,
            timestamp: reading.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn draft(pid: &str, name: Option<&str>, ts: Option<&str>) -> ReadingCreate {
        ReadingCreate {
            paciente_id: pid.to_string(),
            paciente_nome: name.map(String::from),
            timestamp: ts.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_insert_and_list_keeps_nulls() {
        let conn = setup();
        let mut data = draft("p1", Some("Ana"), Some("08:00:00"));
        data.hr = Some(72);
        data.temp = Some(36.6);

        let id = Reading::insert(&conn, &data).unwrap();
        let reading = Reading::list_by_patient(&conn, "p1").unwrap().remove(0);

        assert_eq!(reading.id, id);

        assert_eq!(reading.hr, Some(72));
        assert_eq!(reading.spo2, None);
        assert_eq!(reading.temp, Some(36.6));
        assert_eq!(reading.timestamp.as_deref(), Some("08:00:00"));
        assert_eq!(ReadingCreate::from(reading), data);
    }

    #[test]
    fn test_unknown_patient_is_empty() {
        let conn = setup();
        assert!(Reading::list_by_patient(&conn, "nobody").unwrap().is_empty());
    }

    #[test]
    fn test_list_patients_distinct_pairs_in_first_seen_order() {
        let conn = setup();
        Reading::insert(&conn, &draft("p2", Some("Bia"), None)).unwrap();
        Reading::insert(&conn, &draft("p1", Some("Ana"), None)).unwrap();
        Reading::insert(&conn, &draft("p2", Some("Bia"), None)).unwrap();
        Reading::insert(&conn, &draft("p1", Some("Ana Maria"), None)).unwrap();

        let patients = Reading::list_patients(&conn).unwrap();
        let pairs: Vec<(&str, Option<&str>)> = patients
            .iter()
            .map(|p| (p.paciente_id.as_str(), p.paciente_nome.as_deref()))
            .collect();

        assert_eq!(
            pairs,
            vec![("p2", Some("Bia")), ("p1", Some("Ana")), ("p1", Some("Ana Maria"))]
        );
    }

    #[test]
    fn test_list_by_patient_filters_and_counts() {
        let conn = setup();
        Reading::insert(&conn, &draft("p1", None, Some("b"))).unwrap();
        Reading::insert(&conn, &draft("p2", None, Some("a"))).unwrap();
        Reading::insert(&conn, &draft("p1", None, Some("a"))).unwrap();

        let rows = Reading::list_by_patient(&conn, "p1").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].sort_key(), "b");
        assert_eq!(Reading::count_by_patient(&conn, "p1").unwrap(), 2);
        assert_eq!(Reading::count_by_patient(&conn, "nobody").unwrap(), 0);
    }
}
