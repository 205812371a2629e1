use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::api::response::ApiError;
use crate::config::StorageBackend;
use crate::file_store::FileStoreError;
use crate::AppState;

/// Serve a file held by the local store.
/// Route: GET /static/uploads/:name
///
/// S3 locations are absolute URLs and are fetched from the bucket directly.
pub async fn serve_upload(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    if state.config.storage.backend != StorageBackend::Local {
        return Err(ApiError::not_found("File not found"));
    }

    let data = state
        .catalog
        .store()
        .get(&name)
        .await
        .map_err(|e| match e {
            FileStoreError::NotFound(_) | FileStoreError::InvalidLocation(_) => {
                ApiError::not_found("File not found")
            }
            _ => ApiError::internal(format!("Failed to retrieve file: {e}")),
        })?;

    let mime_type = mime_guess::from_path(&name).first_or_octet_stream();

    let mut response = (StatusCode::OK, data).into_response();
    let headers = response.headers_mut();

    headers.insert(
        header::CONTENT_TYPE,
        mime_type
            .as_ref()
            .parse()
            .unwrap_or(header::HeaderValue::from_static("application/octet-stream")),
    );

    if let Ok(value) = format!("inline; filename=\"{name}\"").parse() {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    // Same-named uploads overwrite each other, so keep the cache short
    headers.insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("public, max-age=300"),
    );

    Ok(response)
}
