use crate::config::Config;
use crate::error::ProcessingError;
use crate::processing::{Stage, StepTiming};
use crate::processor::{ImageProcessor, RunReport};
use crate::run_id::RunId;
use crate::storage::{OutputStore, StoredFile};
use crate::upload::{self, ALLOWED_EXTENSIONS};
use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode, Uri},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Upload page served at `/`
const INDEX_HTML: &str = include_str!("index.html");

/// Room for multipart boundaries and headers on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<ImageProcessor>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, ProcessingError> {
        let processor = ImageProcessor::new(&config)?;
        Ok(Self {
            processor: Arc::new(processor),
            config: Arc::new(config),
        })
    }
}

/// A retrievable output of a run
#[derive(Serialize)]
pub struct OutputLink {
    pub name: String,
    pub file_name: String,
    pub url: String,
}

impl From<&StoredFile> for OutputLink {
    fn from(file: &StoredFile) -> Self {
        Self {
            name: file.name.clone(),
            file_name: file.file_name.clone(),
            url: format!("/outputs/{}", file.file_name),
        }
    }
}

/// Upload response
#[derive(Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub run_id: RunId,
    pub outputs: Vec<OutputLink>,
    pub download_url: String,
    pub processing_time_ms: u64,
    pub pipeline_time_ms: u64,
    pub steps: Vec<StepTiming>,
}

/// Listing of an existing run
#[derive(Serialize)]
pub struct RunResponse {
    pub run_id: RunId,
    pub outputs: Vec<OutputLink>,
    pub download_url: String,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Server info response
#[derive(Serialize)]
pub struct InfoResponse {
    pub version: String,
    pub stages: Vec<&'static str>,
    pub allowed_extensions: Vec<&'static str>,
    pub max_file_size_bytes: usize,
    pub output_format: &'static str,
}

fn download_url(run_id: &RunId) -> String {
    format!("/download/{}", run_id)
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_file_size + MULTIPART_OVERHEAD;
    let outputs = ServeDir::new(state.processor.store().root());

    Router::new()
        .route("/", get(handle_index))
        .route("/upload", post(handle_upload))
        .route("/download/:run_id", get(handle_download))
        .route("/runs/:run_id", get(handle_run))
        .route("/health", get(handle_health))
        .route("/info", get(handle_info))
        .nest_service("/outputs", outputs)
        .fallback(handle_not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(config)?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn multipart_error(e: MultipartError, max_file_size: usize) -> ProcessingError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ProcessingError::RequestTooLarge { max: max_file_size }
    } else {
        ProcessingError::InvalidRequest(format!("Failed to parse multipart: {}", e))
    }
}

/// Serve the upload page
async fn handle_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// JSON 404 for unknown routes
async fn handle_not_found(uri: Uri) -> ProcessingError {
    ProcessingError::NotFound(uri.path().to_string())
}

/// Handle image uploads
async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ProcessingError> {
    let start = Instant::now();
    let max_file_size = state.config.max_file_size;

    let mut upload: Option<(String, Bytes)> = None;

    // Parse multipart form
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_file_size))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, max_file_size))?;
        upload = Some((file_name, data));
    }

    let (file_name, data) = upload.ok_or(ProcessingError::MissingFile)?;
    tracing::debug!("Received {} ({} bytes)", file_name, data.len());

    let processor = state.processor.clone();
    let report: RunReport = tokio::task::spawn_blocking(move || {
        let source = upload::decode_upload(&file_name, &data, max_file_size)?;
        processor.process(&source)
    })
    .await
    .map_err(|e| ProcessingError::Internal(format!("Processing task failed: {}", e)))??;

    let processing_time_ms = start.elapsed().as_millis() as u64;
    tracing::info!(
        run_id = %report.run_id,
        "Upload processed in {}ms",
        processing_time_ms
    );

    Ok(Json(UploadResponse {
        success: true,
        outputs: report.files.iter().map(OutputLink::from).collect(),
        download_url: download_url(&report.run_id),
        run_id: report.run_id,
        processing_time_ms,
        pipeline_time_ms: report.pipeline_time_ms,
        steps: report.steps,
    }))
}

/// Handle archive downloads
async fn handle_download(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<Response, ProcessingError> {
    let run_id = RunId::parse(&run_id)?;

    let processor = state.processor.clone();
    let id = run_id.clone();
    let archive = tokio::task::spawn_blocking(move || processor.store().archive(&id))
        .await
        .map_err(|e| ProcessingError::Internal(format!("Archive task failed: {}", e)))??;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        OutputStore::archive_name(&run_id)
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        archive,
    )
        .into_response())
}

/// Handle run listings
async fn handle_run(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<Json<RunResponse>, ProcessingError> {
    let run_id = RunId::parse(&run_id)?;
    let files = state.processor.store().files(&run_id)?;

    Ok(Json(RunResponse {
        outputs: files.iter().map(OutputLink::from).collect(),
        download_url: download_url(&run_id),
        run_id,
    }))
}

/// Handle health check requests
async fn handle_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle info requests
async fn handle_info(State(state): State<AppState>) -> impl IntoResponse {
    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        stages: Stage::ALL.iter().map(|s| s.as_str()).collect(),
        allowed_extensions: ALLOWED_EXTENSIONS.to_vec(),
        max_file_size_bytes: state.config.max_file_size,
        output_format: state.processor.format().extension(),
    })
}
