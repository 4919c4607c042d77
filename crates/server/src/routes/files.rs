use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};

use service::auth::domain::Principal;
use service::storage::{key_belongs_to, validate_key, StoredFile};

use crate::errors::JsonApiError;
use crate::state::AppState;

/// Stored files render in a sandboxed opaque origin with scripts disabled.
const DOCUMENT_CSP: &str = "sandbox; default-src 'none'; img-src data:; style-src 'unsafe-inline'";

fn content_type(key: &str) -> &'static str {
    let ext = key.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase()).unwrap_or_default();
    match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "json" => "application/json",
        "txt" | "csv" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

/// `POST /files/{name}` with the raw file as body.
#[utoipa::path(post, path = "/files/{name}", tag = "files", params(("name" = String, Path,)),
    responses((status = 201, description = "Stored; returns key, sha256 and size"), (status = 400, description = "Empty body or bad name")))]
pub async fn upload(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<StoredFile>), JsonApiError> {
    if name.is_empty() || name.contains('/') {
        return Err(JsonApiError::new(StatusCode::BAD_REQUEST, "validation_failed", "file name must be a single path segment"));
    }
    if body.is_empty() {
        return Err(JsonApiError::new(StatusCode::BAD_REQUEST, "validation_failed", "empty upload"));
    }
    let stored = state.services.files.put(principal.tenant_id, &name, body.to_vec()).await?;
    tracing::info!(event = "file_uploaded", key = %stored.key, size = stored.size);
    Ok((StatusCode::CREATED, Json(stored)))
}

/// `GET /files/{tenant}/{object}`; keys of other tenants read as missing.
pub async fn download(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, JsonApiError> {
    validate_key(&key)?;
    if !key_belongs_to(&key, principal.tenant_id) {
        return Err(JsonApiError::new(StatusCode::NOT_FOUND, "not_found", "file not found"));
    }
    let bytes = state
        .services
        .files
        .get(&key)
        .await?
        .ok_or_else(|| JsonApiError::new(StatusCode::NOT_FOUND, "not_found", "file not found"))?;
    Ok((
        [
            (header::CONTENT_TYPE, content_type(&key)),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
            (header::CONTENT_SECURITY_POLICY, DOCUMENT_CSP),
        ],
        bytes,
    ))
}
