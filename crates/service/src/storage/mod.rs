//! Blob storage for uploaded and generated documents.
//!
//! Keys are `"{tenant_id}/{uuid}-{sanitised name}"`; the tenant prefix is how
//! handlers scope reads.

pub mod local;
pub mod memory;

use async_trait::async_trait;
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::errors::ServiceError;

pub use local::LocalFileStore;
pub use memory::MemoryFileStore;

/// Result of a successful `put`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredFile {
    pub key: String,
    pub sha256: String,
    pub size: u64,
}

#[async_trait]
pub trait FileStore: Send + Sync {
    async fn put(&self, tenant_id: Uuid, name: &str, bytes: Vec<u8>) -> Result<StoredFile, ServiceError>;
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ServiceError>;
    async fn delete(&self, key: &str) -> Result<bool, ServiceError>;
}

/// Largest accepted upload.
pub const MAX_FILE_BYTES: usize = 20 * 1024 * 1024;

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Keep `[A-Za-z0-9._-]`, collapse everything else to `_`, cap at 100 chars.
pub fn sanitize_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .take(100)
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() { "file".to_string() } else { trimmed.to_string() }
}

pub fn make_key(tenant_id: Uuid, name: &str) -> String {
    format!("{}/{}-{}", tenant_id, Uuid::new_v4(), sanitize_name(name))
}

/// Keys must be exactly `tenant/object` with no traversal segments.
pub fn validate_key(key: &str) -> Result<(Uuid, &str), ServiceError> {
    let (tenant, object) = key
        .split_once('/')
        .ok_or_else(|| ServiceError::Validation("malformed file key".into()))?;
    let tenant_id = Uuid::parse_str(tenant).map_err(|_| ServiceError::Validation("malformed file key".into()))?;
    if object.is_empty() || object.contains('/') || object.contains('\\') || object.starts_with('.') {
        return Err(ServiceError::Validation("malformed file key".into()));
    }
    Ok((tenant_id, object))
}

pub fn key_belongs_to(key: &str, tenant_id: Uuid) -> bool {
    matches!(validate_key(key), Ok((t, _)) if t == tenant_id)
}
