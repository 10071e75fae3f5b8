//! Import a vital-sign CSV from disk into the HealthGo database

use std::path::PathBuf;

use healthgo::config::ServerConfig;
use healthgo::models::Reading;
use healthgo::services::{parse_readings_file, ReadingStore};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let file = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .ok_or("usage: import_readings <file.csv>")?;

    let config = ServerConfig::from_env()?;
    println!("Database path: {}", config.database_path.display());
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let store = ReadingStore::open(&config.database_path)?;

    let upload = parse_readings_file(&file)?;
    let inserted = store.insert_batch(&upload.rows)?;
    let total = store
        .database()
        .with_conn(|conn| Reading::count_by_patient(conn, &upload.paciente_id))?;

    println!(
        "Imported {} readings for patient {} ({} stored)",
        inserted, upload.paciente_id, total
    );
    Ok(())
}
