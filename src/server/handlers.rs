//! HTTP request handlers for API endpoints

use super::types::{
    Base64Request, ErrorResponse, ExtractTextResponse, HealthResponse, HwpxTextResponse, UrlRequest,
};
use super::AppState;
use crate::error::DocTextError;
use crate::extract::{extract, extract_file, extract_from_bytes};
use crate::output::{file_extension, DocumentFormat, ExtractionOutput};
use crate::pipeline::input::is_url;
use crate::pipeline::sniff::sniff;
use axum::{
    body::Bytes,
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Multipart field carrying the uploaded document.
const UPLOAD_FIELD: &str = "file";

// ── Errors ───────────────────────────────────────────────────────────────

/// A JSON error response with its status code.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: error.into(),
                detail: None,
            },
        }
    }

    fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl AppState {
    /// Map a library error to a response: client errors are 400 with their
    /// first message line, everything else a generic 500.
    fn reject(&self, e: DocTextError) -> ApiError {
        let full = e.to_string();
        let mut api = if e.is_client_error() {
            warn!(error = %full, "rejected request");
            ApiError::bad_request(full.lines().next().unwrap_or_default())
        } else {
            error!(error = %full, "extraction failed");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Text extraction failed")
        };
        if self.expose_error_detail {
            api.body.detail = Some(full);
        }
        api
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `POST /extract-text`: any supported format as multipart `file`.
pub async fn extract_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ExtractTextResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    let upload = read_upload(&mut multipart).await?;
    info!(
        %request_id,
        file_name = %upload.file_name,
        bytes = upload.bytes.len(),
        "extract-text upload"
    );

    let output = extract_spooled(&state, &upload, request_id).await?;
    Ok(Json(output.into()))
}

/// `POST /extract-hwpx-text`: HWPX only.
pub async fn extract_hwpx_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<HwpxTextResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    let upload = read_upload(&mut multipart).await?;
    info!(%request_id, file_name = %upload.file_name, "extract-hwpx-text upload");

    let actual = sniff(&upload.bytes, &upload.file_name);
    if actual != DocumentFormat::Hwpx {
        return Err(state.reject(DocTextError::UnexpectedFormat {
            file_name: upload.file_name,
            expected: DocumentFormat::Hwpx,
            actual,
        }));
    }

    let output = extract_spooled(&state, &upload, request_id).await?;
    Ok(Json(HwpxTextResponse { text: output.text }))
}

/// `POST /extract-text/base64`: JSON `{ data, filename }`.
pub async fn extract_base64(
    State(state): State<AppState>,
    Json(request): Json<Base64Request>,
) -> Result<Json<ExtractTextResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    info!(%request_id, file_name = %request.filename, "extract-text base64");

    let bytes = decode_base64(&request.data).map_err(|e| state.reject(e))?;
    let output = extract_from_bytes(bytes, &request.filename, &state.config)
        .await
        .map_err(|e| state.reject(e))?;
    Ok(Json(output.into()))
}

/// `POST /extract-text/url`: JSON `{ url }`.
pub async fn extract_url(
    State(state): State<AppState>,
    Json(request): Json<UrlRequest>,
) -> Result<Json<ExtractTextResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    info!(%request_id, url = %request.url, "extract-text url");

    if !is_url(&request.url) {
        return Err(state.reject(DocTextError::InvalidInput { input: request.url }));
    }
    let output = extract(&request.url, &state.config)
        .await
        .map_err(|e| state.reject(e))?;
    Ok(Json(output.into()))
}

// ── Helpers ──────────────────────────────────────────────────────────────

struct Upload {
    file_name: String,
    bytes: Bytes,
}

async fn read_upload(multipart: &mut Multipart) -> Result<Upload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::new(e.status(), format!("Malformed upload: {}", e.body_text())))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::to_string)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| "upload".to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::new(e.status(), format!("Malformed upload: {}", e.body_text())))?;
        return Ok(Upload { file_name, bytes });
    }
    Err(ApiError::bad_request("No file uploaded (expected multipart field 'file')"))
}

/// Write the upload to a request-scoped temp file and extract from it.
///
/// The temp file is removed before the response is sent, on every path.
async fn extract_spooled(
    state: &AppState,
    upload: &Upload,
    request_id: Uuid,
) -> Result<ExtractionOutput, ApiError> {
    if upload.bytes.is_empty() {
        return Err(ApiError::bad_request("Uploaded file is empty"));
    }
    let spooled = spool(&state.config.work_dir, upload, request_id)
        .await
        .map_err(|e| state.reject(e))?;
    let result = extract_file(spooled.path(), &upload.file_name, &state.config).await;
    drop(spooled);
    result.map_err(|e| state.reject(e))
}

async fn spool(work_dir: &Path, upload: &Upload, request_id: Uuid) -> Result<NamedTempFile, DocTextError> {
    let io_err = |e: std::io::Error| DocTextError::Internal(format!("Failed to store upload: {e}"));

    tokio::fs::create_dir_all(work_dir).await.map_err(io_err)?;
    let suffix = file_extension(&upload.file_name)
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();
    let file = tempfile::Builder::new()
        .prefix(&format!("doctext-upload-{request_id}-"))
        .suffix(&suffix)
        .tempfile_in(work_dir)
        .map_err(io_err)?;
    tokio::fs::write(file.path(), &upload.bytes).await.map_err(io_err)?;
    Ok(file)
}

/// Decode a base64 payload, tolerating a `data:…;base64,` prefix and line breaks.
fn decode_base64(data: &str) -> Result<Vec<u8>, DocTextError> {
    let payload = data.split_once(";base64,").map_or(data, |(_, p)| p);
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(DocTextError::InvalidPayload {
            reason: "base64 data is empty".into(),
        });
    }
    STANDARD.decode(compact).map_err(|e| DocTextError::InvalidPayload {
        reason: format!("malformed base64: {e}"),
    })
}
