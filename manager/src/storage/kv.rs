//! Key-value persistence store
//!
//! The manager treats persistence as an opaque store of JSON blobs keyed by
//! string. The file-backed implementation keeps one file per key.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::errors::ManagerError;

/// Opaque blob store: `get` returns the stored blob or absent, `put`
/// overwrites unconditionally.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, ManagerError>;
    async fn put(&self, key: &str, value: &str) -> Result<(), ManagerError>;
}

/// File-backed store: one `<key>.json` file per key under a base directory.
#[derive(Debug, Clone)]
pub struct FileKvStore {
    base_dir: PathBuf,
}

impl FileKvStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl KvStore for FileKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ManagerError> {
        match fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ManagerError::Persistence(format!(
                "read of key {key} failed: {e}"
            ))),
        }
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), ManagerError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ManagerError::Persistence(e.to_string()))?;
        }

        // Write through a temp file and rename so readers never observe a
        // partially written blob.
        let temp_path = path.with_extension("tmp");
        let result: Result<(), std::io::Error> = async {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(value.as_bytes()).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&temp_path, &path).await
        }
        .await;

        result.map_err(|e| ManagerError::Persistence(format!("write of key {key} failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> FileKvStore {
        let dir = std::env::temp_dir().join(format!("fleetkeeper-kv-{}", uuid::Uuid::new_v4()));
        FileKvStore::new(dir)
    }

    #[test]
    fn test_get_absent_key() {
        let store = temp_store();
        let value = tokio_test::block_on(store.get("missing")).unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn test_put_get_roundtrip() {
        let store = temp_store();
        tokio_test::block_on(store.put("accounts", r#"[{"alias":"a"}]"#)).unwrap();
        let value = tokio_test::block_on(store.get("accounts")).unwrap();
        assert_eq!(value.as_deref(), Some(r#"[{"alias":"a"}]"#));
    }

    #[test]
    fn test_put_overwrites() {
        let store = temp_store();
        tokio_test::block_on(store.put("k", "one")).unwrap();
        tokio_test::block_on(store.put("k", "two")).unwrap();
        let value = tokio_test::block_on(store.get("k")).unwrap();
        assert_eq!(value.as_deref(), Some("two"));
    }
}
