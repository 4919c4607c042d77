use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("database error: {0}")]
    Db(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("external service error: {0}")]
    External(String),
    #[error("model error: {0}")]
    Model(#[from] models::errors::ModelError),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    pub fn invalid_state(entity: &str, current: impl std::fmt::Debug, action: &str) -> Self {
        Self::InvalidState(format!("cannot {action} {entity} in status {current:?}"))
    }
}

impl From<sea_orm::DbErr> for ServiceError {
    fn from(e: sea_orm::DbErr) -> Self {
        let msg = e.to_string();
        if msg.contains("duplicate key value violates unique constraint") {
            ServiceError::Conflict(msg)
        } else {
            ServiceError::Db(msg)
        }
    }
}

impl From<crate::auth::errors::AuthError> for ServiceError {
    fn from(e: crate::auth::errors::AuthError) -> Self {
        use crate::auth::errors::AuthError;
        match e {
            AuthError::Validation(m) => ServiceError::Validation(m),
            AuthError::Conflict | AuthError::TenantConflict => ServiceError::Conflict(e.to_string()),
            AuthError::NotFound => ServiceError::not_found("user"),
            AuthError::Forbidden(m) => ServiceError::Forbidden(m),
            other => ServiceError::Db(other.to_string()),
        }
    }
}
