use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{make_key, sha256_hex, validate_key, FileStore, StoredFile, MAX_FILE_BYTES};
use crate::errors::ServiceError;

/// Files under a root directory, one sub-directory per tenant.
#[derive(Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub async fn new<P: Into<PathBuf>>(root: P) -> Result<Self, ServiceError> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|e| ServiceError::Storage(e.to_string()))?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, ServiceError> {
        let (tenant_id, object) = validate_key(key)?;
        Ok(self.root.join(tenant_id.to_string()).join(object))
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn put(&self, tenant_id: Uuid, name: &str, bytes: Vec<u8>) -> Result<StoredFile, ServiceError> {
        if bytes.is_empty() {
            return Err(ServiceError::Validation("empty file".into()));
        }
        if bytes.len() > MAX_FILE_BYTES {
            return Err(ServiceError::Validation("file too large".into()));
        }
        let key = make_key(tenant_id, name);
        let path = self.path_for(&key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| ServiceError::Storage(e.to_string()))?;
        }
        let sha256 = sha256_hex(&bytes);
        let size = bytes.len() as u64;
        fs::write(&path, bytes).await.map_err(|e| ServiceError::Storage(e.to_string()))?;
        debug!(%key, "file stored");
        Ok(StoredFile { key, sha256, size })
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ServiceError> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ServiceError::Storage(e.to_string())),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, ServiceError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ServiceError::Storage(e.to_string())),
        }
    }
}
