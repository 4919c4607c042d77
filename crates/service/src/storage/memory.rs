use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use super::{make_key, sha256_hex, validate_key, FileStore, StoredFile, MAX_FILE_BYTES};
use crate::errors::ServiceError;

/// In-process file store for tests and local demos.
#[derive(Default)]
pub struct MemoryFileStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryFileStore {
    pub fn len(&self) -> usize { self.files.lock().unwrap().len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn put(&self, tenant_id: Uuid, name: &str, bytes: Vec<u8>) -> Result<StoredFile, ServiceError> {
        if bytes.is_empty() {
            return Err(ServiceError::Validation("empty file".into()));
        }
        if bytes.len() > MAX_FILE_BYTES {
            return Err(ServiceError::Validation("file too large".into()));
        }
        let key = make_key(tenant_id, name);
        let stored = StoredFile { key: key.clone(), sha256: sha256_hex(&bytes), size: bytes.len() as u64 };
        self.files.lock().unwrap().insert(key, bytes);
        Ok(stored)
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ServiceError> {
        validate_key(key)?;
        Ok(self.files.lock().unwrap().get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<bool, ServiceError> {
        validate_key(key)?;
        Ok(self.files.lock().unwrap().remove(key).is_some())
    }
}
