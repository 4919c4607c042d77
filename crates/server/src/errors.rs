use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

use models::errors::ModelError;
use service::auth::errors::AuthError;
use service::errors::ServiceError;

/// JSON error body: `{"error": title, "detail": detail}`.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub title: &'static str,
    pub detail: String,
}

impl JsonApiError {
    pub fn new(status: StatusCode, title: &'static str, detail: impl Into<String>) -> Self {
        Self { status, title, detail: detail.into() }
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, detail = %self.detail, "request failed");
        }
        (self.status, Json(serde_json::json!({ "error": self.title, "detail": self.detail }))).into_response()
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        let detail = e.to_string();
        match e {
            ServiceError::Validation(_) | ServiceError::Model(ModelError::Validation(_)) => {
                Self::new(StatusCode::BAD_REQUEST, "validation_failed", detail)
            }
            ServiceError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "not_found", detail),
            ServiceError::Conflict(_) => Self::new(StatusCode::CONFLICT, "conflict", detail),
            ServiceError::Forbidden(_) => Self::new(StatusCode::FORBIDDEN, "forbidden", detail),
            ServiceError::InvalidState(_) => Self::new(StatusCode::CONFLICT, "invalid_state", detail),
            ServiceError::External(_) => Self::new(StatusCode::BAD_GATEWAY, "upstream_unavailable", detail),
            ServiceError::Db(_) | ServiceError::Storage(_) | ServiceError::Model(ModelError::Db(_)) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", detail)
            }
        }
    }
}

impl From<AuthError> for JsonApiError {
    fn from(e: AuthError) -> Self {
        let detail = e.to_string();
        match e {
            AuthError::Validation(_) => Self::new(StatusCode::BAD_REQUEST, "validation_failed", detail),
            AuthError::Conflict | AuthError::TenantConflict => Self::new(StatusCode::CONFLICT, "conflict", detail),
            AuthError::NotFound => Self::new(StatusCode::NOT_FOUND, "not_found", detail),
            AuthError::Unauthorized | AuthError::TokenError(_) => {
                Self::new(StatusCode::UNAUTHORIZED, "unauthorized", detail)
            }
            AuthError::Forbidden(_) => Self::new(StatusCode::FORBIDDEN, "forbidden", detail),
            AuthError::HashError(_) | AuthError::Repository(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", detail)
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_service_errors_to_status() {
        let cases = [
            (ServiceError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ServiceError::Model(ModelError::Validation("x".into())), StatusCode::BAD_REQUEST),
            (ServiceError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ServiceError::Conflict("x".into()), StatusCode::CONFLICT),
            (ServiceError::InvalidState("x".into()), StatusCode::CONFLICT),
            (ServiceError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ServiceError::External("x".into()), StatusCode::BAD_GATEWAY),
            (ServiceError::Db("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(JsonApiError::from(err).status, status);
        }
    }

    #[test]
    fn maps_auth_errors_to_status() {
        assert_eq!(JsonApiError::from(AuthError::Unauthorized).status, StatusCode::UNAUTHORIZED);
        assert_eq!(JsonApiError::from(AuthError::Conflict).status, StatusCode::CONFLICT);
        let tenant = JsonApiError::from(AuthError::TenantConflict);
        assert_eq!(tenant.status, StatusCode::CONFLICT);
        assert_eq!(tenant.detail, "tenant already exists");
        assert_eq!(JsonApiError::from(AuthError::TokenError("exp".into())).status, StatusCode::UNAUTHORIZED);
    }
}
