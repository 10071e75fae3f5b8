//! HealthGo HTTP server
//!
//! Routes for uploading vital-sign CSVs and reading them back as JSON or CSV.

use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::{header, HeaderName, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::error::ApiError;
use crate::build_info::BuildInfo;
use crate::models::{PatientSummary, Reading};
use crate::services::{parse_readings_csv, ReadingStore};

/// Response header carrying how many rows a range filter dropped as unparseable
pub const UNPARSEABLE_ROWS_HEADER: HeaderName = HeaderName::from_static("x-unparseable-rows");

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub store: ReadingStore,
    pub upload_dir: Arc<PathBuf>,
}

impl AppState {
    pub fn new(store: ReadingStore, upload_dir: PathBuf) -> Self {
        Self {
            store,
            upload_dir: Arc::new(upload_dir),
        }
    }
}

/// Optional `start`/`end` query bounds
#[derive(Debug, Default, Deserialize)]
pub struct RangeParams {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Build the application router
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/upload", post(upload_csv))
        .route("/patients", get(list_patients))
        .route("/patients/:paciente_id", get(get_patient_readings))
        .route("/download/:paciente_id", get(download_csv))
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers([header::CONTENT_DISPOSITION, UNPARSEABLE_ROWS_HEADER]),
        )
        .with_state(state)
}

/// Uploaded file part
struct FilePart {
    file_name: Option<String>,
    data: axum::body::Bytes,
}

async fn read_file_part(mut multipart: Multipart) -> Result<Option<FilePart>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(String::from);
        let data = field.bytes().await.map_err(multipart_error)?;
        return Ok(Some(FilePart { file_name, data }));
    }
    Ok(None)
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

/// Final path component of a client-supplied filename
fn stored_file_name(name: &str) -> Option<&str> {
    FsPath::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
}

async fn upload_csv(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let multipart = multipart.map_err(|_| ApiError::BadRequest("no file part".into()))?;
    let part = read_file_part(multipart)
        .await?
        .ok_or_else(|| ApiError::BadRequest("no file part".into()))?;

    // A part without a filename attribute is a plain form field
    let raw_name = part
        .file_name
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("no file part".into()))?;
    let file_name = stored_file_name(raw_name)
        .ok_or_else(|| ApiError::BadRequest("no selected file".into()))?;
    if !file_name.to_lowercase().ends_with(".csv") {
        return Err(ApiError::BadRequest("only csv allowed".into()));
    }

    tokio::fs::create_dir_all(state.upload_dir.as_ref())
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to create upload folder: {}", e)))?;
    let save_path = state.upload_dir.join(file_name);
    tokio::fs::write(&save_path, &part.data)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to save upload: {}", e)))?;

    let upload = parse_readings_csv(&part.data[..])?;
    let inserted = state.store.insert_batch(&upload.rows)?;

    info!(
        file = %save_path.display(),
        paciente_id = %upload.paciente_id,
        rows = inserted,
        "imported readings"
    );

    Ok((StatusCode::CREATED, Json(json!({ "ok": true }))))
}

async fn list_patients(State(state): State<AppState>) -> Result<Json<Vec<PatientSummary>>, ApiError> {
    Ok(Json(state.store.list_patients()?))
}

async fn get_patient_readings(
    State(state): State<AppState>,
    Path(paciente_id): Path<String>,
    Query(range): Query<RangeParams>,
) -> Result<impl IntoResponse, ApiError> {
    let filtered = state.store.query_readings(
        &paciente_id,
        range.start.as_deref(),
        range.end.as_deref(),
    )?;

    let readings: Vec<Reading> = filtered.items;
    Ok((
        [(UNPARSEABLE_ROWS_HEADER, filtered.unparseable.to_string())],
        Json(readings),
    ))
}

/// Header-safe rendering of a patient id for the attachment name
fn attachment_name(paciente_id: &str) -> String {
    let safe: String = paciente_id
        .chars()
        .map(|c| match c {
            '"' | '\\' | '/' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();
    format!("{}_dados.csv", safe)
}

async fn download_csv(
    State(state): State<AppState>,
    Path(paciente_id): Path<String>,
    Query(range): Query<RangeParams>,
) -> Result<impl IntoResponse, ApiError> {
    let export = state.store.export_csv(
        &paciente_id,
        range.start.as_deref(),
        range.end.as_deref(),
    )?;

    info!(paciente_id = %paciente_id, rows = export.rows, "exported readings");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", attachment_name(&paciente_id)),
            ),
            (UNPARSEABLE_ROWS_HEADER, export.unparseable.to_string()),
        ],
        export.body,
    ))
}

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
    #[serde(flatten)]
    build: BuildInfo,
}

async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        build: BuildInfo::current(),
    })
}
