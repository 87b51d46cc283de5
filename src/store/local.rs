//! Local filesystem object store

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::model::config::FILE_SERVE_PREFIX;

use super::ObjectStore;

/// Stores asset bytes under a root directory, one subdirectory per file id
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a store path below the root, rejecting traversal segments
    fn resolve(&self, path: &str) -> anyhow::Result<PathBuf> {
        let relative = Path::new(path);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            anyhow::bail!("invalid object path '{}'", path);
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, path: &str, bytes: &[u8]) -> anyhow::Result<()> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&target, bytes).await?;
        Ok(())
    }

    async fn get(&self, path: &str) -> anyhow::Result<Vec<u8>> {
        let target = self.resolve(path)?;
        let bytes = fs::read(&target).await?;
        Ok(bytes)
    }

    async fn delete(&self, path: &str) -> anyhow::Result<()> {
        let target = self.resolve(path)?;
        match fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn url_for(&self, file_id: &str) -> String {
        format!("{}{}", FILE_SERVE_PREFIX, file_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());

        store.put("abc/logo.png", b"PNGDATA").await.unwrap();
        let bytes = store.get("abc/logo.png").await.unwrap();
        assert_eq!(bytes, b"PNGDATA");

        store.delete("abc/logo.png").await.unwrap();
        assert!(store.get("abc/logo.png").await.is_err());
        // Deleting again is not an error
        store.delete("abc/logo.png").await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        assert!(store.put("../escape", b"x").await.is_err());
        assert!(store.get("../../etc/passwd").await.is_err());
    }

    #[test]
    fn test_url_for() {
        let store = LocalObjectStore::new("/tmp/files");
        assert_eq!(store.url_for("abc"), "/api/v1/resource/files/abc");
    }
}
