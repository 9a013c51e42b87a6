//! File handlers for the HTTP API.

use axum::{
    body::{Body, Bytes},
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use crate::file::relative_path;
use crate::web::dto::FileUploadResponse;
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::FiledropError;

/// File name offered for `/download-all` archives.
pub const ARCHIVE_FILENAME: &str = "uploads.zip";

/// Generate a safe Content-Disposition header value for file downloads.
///
/// Control characters are removed, quotes and backslashes are replaced, and
/// non-ASCII names get an RFC 5987 `filename*` parameter.
fn content_disposition_header(filename: &str) -> String {
    let needs_encoding = !filename.is_ascii()
        || filename.chars().any(|c| c.is_control() || c == '"' || c == '\\');

    if !needs_encoding {
        return format!("attachment; filename=\"{}\"", filename);
    }

    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            _ => c,
        })
        .collect();
    let encoded = urlencoding::encode(filename);

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        sanitized, encoded
    )
}

fn multipart_error(e: MultipartError) -> ApiError {
    tracing::warn!("Failed to read multipart data: {}", e);
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large("Upload exceeds the maximum request size")
    } else {
        ApiError::bad_request("Invalid multipart data")
    }
}

/// Run blocking filesystem work off the async runtime.
async fn blocking<T, F>(f: F) -> crate::Result<T>
where
    F: FnOnce() -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

/// GET /files - List all visible files relative to the upload root.
pub async fn list_files(State(state): State<Arc<AppState>>) -> Result<Json<Vec<String>>, ApiError> {
    let storage = state.storage.clone();

    let files = blocking(move || {
        let base = storage.base_path();
        storage
            .walker()
            .files()
            .filter_map(|path| match path {
                Ok(p) => relative_path(base, &p).map(Ok),
                Err(e) => Some(Err(e)),
            })
            .collect::<crate::Result<Vec<_>>>()
    })
    .await?;

    Ok(Json(files))
}

/// GET /folder-structure - Flattened folder contents as `/` separated paths.
pub async fn folder_structure(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, ApiError> {
    let storage = state.storage.clone();

    let paths = blocking(move || storage.list_files()).await.map_err(|e| {
        tracing::error!("Failed to read folder structure: {}", e);
        ApiError::internal("Failed to read folder structure")
    })?;

    Ok(Json(paths))
}

/// GET /files/*path - Download a single file.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Result<Response<Body>, ApiError> {
    let storage = state.storage.clone();
    let file_path = blocking(move || storage.file_path(&path)).await?;

    let file = tokio::fs::File::open(&file_path)
        .await
        .map_err(FiledropError::from)?;
    let size = file.metadata().await.map_err(FiledropError::from)?.len();

    let filename = file_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let content_type = mime_guess::from_path(&file_path)
        .first_or_octet_stream()
        .to_string();

    let response = Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(&filename),
        )
        .header(header::CONTENT_LENGTH, size)
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })?;

    Ok(response)
}

/// GET /download-all - Download the whole upload root as a zip archive.
///
/// The archive is finalized before the response starts and its temporary
/// file is removed once the response body is dropped.
pub async fn download_all(State(state): State<Arc<AppState>>) -> Result<Response<Body>, ApiError> {
    let exporter = state.exporter();

    let artifact = blocking(move || exporter.export()).await?;
    let size = artifact.size();

    tracing::info!(
        entries = artifact.entries(),
        size,
        path = %artifact.path().display(),
        "Export archive ready"
    );

    let stream = artifact.into_stream().await?;

    let response = Response::builder()
        .header(header::CONTENT_TYPE, "application/zip")
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(ARCHIVE_FILENAME),
        )
        .header(header::CONTENT_LENGTH, size)
        .body(Body::from_stream(stream))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })?;

    Ok(response)
}

/// POST /upload - Upload a file.
///
/// Request body: multipart/form-data with a "file" field and an optional
/// "folder" field naming the destination below the upload root.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<FileUploadResponse>, ApiError> {
    let mut filename: Option<String> = None;
    let mut folder: Option<String> = None;
    let mut content: Option<Bytes> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                filename = field.file_name().map(|s| s.to_string());
                content = Some(field.bytes().await.map_err(multipart_error)?);
            }
            "folder" => {
                folder = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }

    let content = content.ok_or_else(|| ApiError::bad_request("No file provided"))?;
    let filename = filename
        .filter(|f| !f.is_empty())
        .ok_or_else(|| ApiError::bad_request("No file provided"))?;

    if content.len() as u64 > state.max_upload_size {
        let max_mb = state.max_upload_size / 1024 / 1024;
        return Err(ApiError::bad_request(format!(
            "File too large (max {}MB)",
            max_mb
        )));
    }

    let storage = state.storage.clone();
    let stored = blocking(move || storage.save(folder.as_deref(), &filename, &content)).await?;

    tracing::info!(
        path = %stored.path,
        size = stored.size,
        "File uploaded"
    );

    Ok(Json(FileUploadResponse::new(stored)))
}
