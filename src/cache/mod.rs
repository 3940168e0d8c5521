// Durable mirror of remote collections, with an in-memory fallback for
// hosts without a writable data directory.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::debug;

use crate::config::MirrorConfig;

/// Well-known mirror keys.
///
/// Collection keys match the remote resource names; the two checkout keys
/// hold single staged records rather than lists.
pub mod keys {
    pub const PRODUCTS: &str = "products";
    pub const CATEGORIES: &str = "categories";
    pub const BRANDS: &str = "brands";
    pub const ATTRIBUTE_TYPES: &str = "attributeTypes";
    pub const ATTRIBUTE_VALUES: &str = "attributeValues";
    pub const ORDERS: &str = "orders";
    pub const CUSTOMERS: &str = "customers";
    pub const PENDING_ORDER: &str = "pendingOrder";
    pub const COMPLETED_ORDER: &str = "completedOrder";
    pub const SESSION: &str = "session";
}

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Mirror operation failed: {0}")]
    OperationFailed(String),
}

/// Persistence surface the stores and checkout staging write through.
///
/// Values are opaque JSON strings; callers own the schema of each key.
#[async_trait]
pub trait MirrorStore: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<String>, MirrorError>;
    async fn save(&self, key: &str, value: &str) -> Result<(), MirrorError>;
    async fn remove(&self, key: &str) -> Result<(), MirrorError>;
    async fn exists(&self, key: &str) -> Result<bool, MirrorError>;
    async fn clear(&self) -> Result<(), MirrorError>;
}

// In-memory mirror, used in tests and on hosts without durable storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryMirror {
    store: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryMirror {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MirrorStore for MemoryMirror {
    async fn load(&self, key: &str) -> Result<Option<String>, MirrorError> {
        let store = self.store.read().unwrap();
        Ok(store.get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), MirrorError> {
        let mut store = self.store.write().unwrap();
        store.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), MirrorError> {
        let mut store = self.store.write().unwrap();
        store.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, MirrorError> {
        let store = self.store.read().unwrap();
        Ok(store.contains_key(key))
    }

    async fn clear(&self) -> Result<(), MirrorError> {
        let mut store = self.store.write().unwrap();
        store.clear();
        Ok(())
    }
}

/// File-backed mirror: one JSON document per key under a data directory.
#[derive(Debug, Clone)]
pub struct FileMirror {
    dir: PathBuf,
}

impl FileMirror {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys are fixed identifiers, but never trust them as raw paths.
        let safe: String = key
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

#[async_trait]
impl MirrorStore for FileMirror {
    async fn load(&self, key: &str) -> Result<Option<String>, MirrorError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), MirrorError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await?;
        // Rename so readers never observe a half-written document.
        tokio::fs::rename(&tmp, &path).await?;
        debug!(key, path = %path.display(), "mirror saved");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), MirrorError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, MirrorError> {
        Ok(Path::new(&self.path_for(key)).exists())
    }

    async fn clear(&self) -> Result<(), MirrorError> {
        match tokio::fs::read_dir(&self.dir).await {
            Ok(mut entries) => {
                while let Some(entry) = entries.next_entry().await? {
                    if entry.path().extension().is_some_and(|ext| ext == "json") {
                        tokio::fs::remove_file(entry.path()).await?;
                    }
                }
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Builds the mirror backend selected by configuration.
pub fn build_mirror(config: &MirrorConfig) -> Arc<dyn MirrorStore> {
    match config.backend.to_ascii_lowercase().as_str() {
        "in-memory" => Arc::new(MemoryMirror::new()),
        _ => Arc::new(FileMirror::new(config.dir.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_memory_mirror_round_trip() {
        let mirror = MemoryMirror::new();
        assert_eq!(
            mirror.load(keys::PRODUCTS).await.expect("Failed to load"),
            None
        );
        mirror
            .save(keys::PRODUCTS, r#"[{"id":"p1"}]"#)
            .await
            .expect("Failed to save");
        assert!(mirror
            .exists(keys::PRODUCTS)
            .await
            .expect("Failed to check existence"));
        assert_eq!(
            mirror
                .load(keys::PRODUCTS)
                .await
                .expect("Failed to load")
                .as_deref(),
            Some(r#"[{"id":"p1"}]"#)
        );
        mirror
            .remove(keys::PRODUCTS)
            .await
            .expect("Failed to remove");
        assert_eq!(
            mirror.load(keys::PRODUCTS).await.expect("Failed to load"),
            None
        );
    }

    #[tokio::test]
    async fn test_file_mirror_survives_reopen() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        {
            let mirror = FileMirror::new(dir.path());
            mirror
                .save(keys::PENDING_ORDER, r#"{"tempOrderId":"169-u1"}"#)
                .await
                .expect("Failed to save");
        }
        let reopened = FileMirror::new(dir.path());
        assert_eq!(
            reopened
                .load(keys::PENDING_ORDER)
                .await
                .expect("Failed to load")
                .as_deref(),
            Some(r#"{"tempOrderId":"169-u1"}"#)
        );
    }

    #[tokio::test]
    async fn test_file_mirror_missing_key_is_none() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let mirror = FileMirror::new(dir.path());
        assert_eq!(
            mirror.load("completedOrder").await.expect("Failed to load"),
            None
        );
        mirror
            .remove("completedOrder")
            .await
            .expect("Removing a missing key should be a no-op");
    }

    #[tokio::test]
    async fn test_file_mirror_clear_removes_documents() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let mirror = FileMirror::new(dir.path());
        mirror
            .save(keys::BRANDS, "[]")
            .await
            .expect("Failed to save");
        mirror
            .save(keys::CUSTOMERS, "[]")
            .await
            .expect("Failed to save");
        mirror.clear().await.expect("Failed to clear");
        assert_eq!(mirror.load(keys::BRANDS).await.expect("Failed to load"), None);
        assert_eq!(
            mirror.load(keys::CUSTOMERS).await.expect("Failed to load"),
            None
        );
    }

    #[tokio::test]
    async fn test_path_sanitization_strips_separators() {
        let mirror = FileMirror::new("/tmp/unused");
        let path = mirror.path_for("../../etc/passwd");
        assert_eq!(path, PathBuf::from("/tmp/unused/etcpasswd.json"));
    }
}
