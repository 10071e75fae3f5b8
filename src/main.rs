//! HealthGo
//!
//! HTTP service for uploading and querying per-patient vital-sign CSVs.

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use healthgo::build_info;
use healthgo::config::ServerConfig;
use healthgo::db::migrations;
use healthgo::http::{router, AppState};
use healthgo::services::ReadingStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("healthgo=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    build_info::print_startup_banner();

    let config = ServerConfig::from_env()?;
    eprintln!("Database path: {}", config.database_path.display());
    eprintln!("Upload folder: {}", config.upload_dir.display());

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::create_dir_all(&config.upload_dir)?;

    let store = ReadingStore::open(&config.database_path)?;
    let version = store.database().with_conn(migrations::get_schema_version)?;
    info!(version, "database ready");

    let app = router(AppState::new(store, config.upload_dir.clone()), config.max_upload_bytes);

    let listener = TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
}
