use axum::{http::header, response::IntoResponse, Json};

use common::types::Health;

#[utoipa::path(get, path = "/health", tag = "system", responses((status = 200, description = "Service is up")))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Prometheus text exposition.
pub async fn metrics() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], service::metrics::gather_text())
}
