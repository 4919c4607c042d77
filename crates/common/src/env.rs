//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use tracing::{info, warn};

/// Ensure the storage root exists and is writable.
pub async fn ensure_storage_dir(storage_root: &str) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(storage_root)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {storage_root}: {e}"))?;

    let probe = std::path::Path::new(storage_root).join(".write-probe");
    match tokio::fs::write(&probe, b"ok").await {
        Ok(()) => {
            let _ = tokio::fs::remove_file(&probe).await;
            info!(%storage_root, "storage directory ready");
            Ok(())
        }
        Err(e) => {
            warn!(%storage_root, error = %e, "storage directory is not writable");
            Err(anyhow::anyhow!("storage root {storage_root} not writable: {e}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ensure_storage_dir;

    #[tokio::test]
    async fn creates_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("nested/files");
        let root_str = root.to_string_lossy().to_string();
        ensure_storage_dir(&root_str).await.unwrap();
        assert!(root.is_dir());
        assert!(!root.join(".write-probe").exists());
    }
}
