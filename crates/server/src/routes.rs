//! HTTP routes of the companion server.

use crate::convert::SlideRenderer;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use reuse_core::AddinConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

/// Multipart field carrying the presentation.
const UPLOAD_FIELD: &str = "ppt";

/// URL prefix under which rendered slides are served.
const SCREENSHOTS_ROUTE: &str = "screenshots";

/// Slide folder used when the upload name has no usable stem.
const DEFAULT_FOLDER: &str = "presentation";

/// Largest accepted upload.
const MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

/// Shared state of the server.
pub struct AppState<R> {
    /// Where uploaded presentations are written.
    pub upload_dir: PathBuf,
    /// Where rendered slides are written and served from.
    pub screenshots_dir: PathBuf,
    /// Add-in configuration served at `/config`.
    pub config: Option<AddinConfig>,
    /// Converts uploads into slide images.
    pub renderer: R,
}

/// Response of a successful upload.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Served paths of the slide images, in slide order.
    pub slides: Vec<String>,
}

/// Body of an error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Failures of request handling.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("No file uploaded")]
    NoFile,

    #[error("Invalid upload: {0}")]
    BadUpload(String),

    #[error("{0}")]
    Conversion(String),

    #[error("No add-in configuration")]
    NoConfig,

    #[error("Failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match self {
            Self::NoFile | Self::BadUpload(_) => {
                (StatusCode::BAD_REQUEST, self.to_string()).into_response()
            }
            Self::NoConfig => error_json(StatusCode::NOT_FOUND, self.to_string()),
            Self::Conversion(_) | Self::Io(_) => {
                error_json(StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        }
    }
}

fn error_json(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

/// Build the router.
pub fn router<R: SlideRenderer>(state: Arc<AppState<R>>) -> Router {
    let screenshots = ServeDir::new(&state.screenshots_dir);
    Router::new()
        .route("/", get(welcome))
        .route("/config", get(config::<R>))
        .route("/upload", post(upload::<R>))
        .nest_service(&format!("/{}", SCREENSHOTS_ROUTE), screenshots)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn welcome() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Welcome to reuse slides apis" }))
}

async fn config<R: SlideRenderer>(
    State(state): State<Arc<AppState<R>>>,
) -> Result<Json<AddinConfig>, ServerError> {
    state.config.clone().map(Json).ok_or(ServerError::NoConfig)
}

async fn upload<R: SlideRenderer>(
    State(state): State<Arc<AppState<R>>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ServerError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadUpload(e.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field
            .file_name()
            .and_then(safe_file_name)
            .ok_or_else(|| ServerError::BadUpload("missing file name".into()))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServerError::BadUpload(e.to_string()))?;
        upload = Some((file_name, bytes.to_vec()));
    }

    let (file_name, bytes) = upload.ok_or(ServerError::NoFile)?;
    let stem = slide_folder(&file_name);

    tokio::fs::create_dir_all(&state.upload_dir).await?;
    let saved = state.upload_dir.join(&file_name);
    tokio::fs::write(&saved, &bytes).await?;
    log::info!("Stored upload {} ({} bytes)", saved.display(), bytes.len());

    let out_dir = state.screenshots_dir.join(&stem);
    let images = state
        .renderer
        .render(&saved, &out_dir)
        .await
        .map_err(|e| {
            log::error!("Conversion of {} failed: {}", file_name, e);
            ServerError::Conversion(e.to_string())
        })?;

    let slides = images
        .into_iter()
        .map(|image| format!("{}/{}/{}", SCREENSHOTS_ROUTE, stem, image))
        .collect();
    Ok(Json(UploadResponse { slides }))
}

/// Last path component of a client-supplied file name.
fn safe_file_name(name: &str) -> Option<String> {
    let name = name.rsplit(['/', '\\']).next()?.trim();
    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name.to_string())
    }
}

/// Folder name for the rendered slides of an upload.
///
/// Stems made only of dots would resolve to the screenshots root or above.
fn slide_folder(file_name: &str) -> String {
    match Path::new(file_name).file_stem().and_then(|s| s.to_str()) {
        Some(stem) if !stem.trim_matches('.').trim().is_empty() => stem.to_string(),
        _ => DEFAULT_FOLDER.to_string(),
    }
}
