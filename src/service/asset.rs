// Asset upload and retrieval service

use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ConfpackError;
use crate::model::asset::AssetInfo;
use crate::model::common::now_millis;
use crate::model::config::Scope;
use crate::store::{AssetStore, ObjectStore};

/// Store uploaded bytes and record the asset. Bytes are written before the
/// metadata row; a failed row insert rolls the bytes back best-effort.
pub async fn upload(
    assets: &dyn AssetStore,
    objects: &dyn ObjectStore,
    scope: Scope,
    file_name: String,
    content_type: String,
    remark: String,
    bytes: &[u8],
) -> anyhow::Result<AssetInfo> {
    if file_name.trim().is_empty() {
        return Err(ConfpackError::Validation("file name is required".to_string()).into());
    }
    if bytes.is_empty() {
        return Err(ConfpackError::Validation("file content is empty".to_string()).into());
    }

    let file_id = Uuid::new_v4().to_string();
    let path = format!("{}/{}", file_id, file_name);
    objects.put(&path, bytes).await?;

    let now = now_millis();
    let info = AssetInfo {
        file_id: file_id.clone(),
        scope,
        file_name,
        content_type,
        file_size: bytes.len() as i64,
        path: path.clone(),
        url: objects.url_for(&file_id),
        remark,
        gmt_create: now,
        gmt_modified: now,
    };

    if let Err(e) = assets.insert(&info).await {
        if let Err(cleanup) = objects.delete(&path).await {
            warn!(%path, error = %cleanup, "failed to remove orphaned upload");
        }
        return Err(e);
    }

    info!(file_id = %info.file_id, size = info.file_size, "asset uploaded");
    Ok(info)
}

pub async fn find(assets: &dyn AssetStore, file_id: &str) -> anyhow::Result<AssetInfo> {
    assets.find_by_file_id(file_id).await?.ok_or_else(|| {
        ConfpackError::NotFound(format!("file '{}' does not exist", file_id)).into()
    })
}

/// Fetch the raw bytes of an asset together with its metadata
pub async fn fetch_bytes(
    assets: &dyn AssetStore,
    objects: &dyn ObjectStore,
    file_id: &str,
) -> anyhow::Result<(AssetInfo, Vec<u8>)> {
    let info = find(assets, file_id).await?;
    let bytes = objects.get(&info.path).await.map_err(|e| {
        ConfpackError::Storage(format!("file '{}' bytes unavailable: {}", file_id, e))
    })?;
    Ok((info, bytes))
}

/// Delete the metadata row first, then the bytes
pub async fn delete(
    assets: &dyn AssetStore,
    objects: &dyn ObjectStore,
    file_id: &str,
) -> anyhow::Result<()> {
    let info = find(assets, file_id).await?;
    assets.delete(file_id).await?;
    if let Err(e) = objects.delete(&info.path).await {
        warn!(%file_id, error = %e, "asset bytes left behind after delete");
    }
    info!(%file_id, "asset deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{LocalObjectStore, MemoryStore};

    #[tokio::test]
    async fn test_upload_and_fetch_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new();
        let objects = LocalObjectStore::new(dir.path());

        let info = upload(
            &store,
            &objects,
            Scope::business("acme"),
            "logo.png".to_string(),
            "image/png".to_string(),
            String::new(),
            b"PNGDATA",
        )
        .await
        .unwrap();

        assert_eq!(info.file_size, 7);
        assert!(info.url.ends_with(&info.file_id));

        let (found, bytes) = fetch_bytes(&store, &objects, &info.file_id).await.unwrap();
        assert_eq!(found.file_name, "logo.png");
        assert_eq!(bytes, b"PNGDATA");
    }

    #[tokio::test]
    async fn test_upload_rejects_empty_input() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new();
        let objects = LocalObjectStore::new(dir.path());

        assert!(upload(
            &store,
            &objects,
            Scope::business("acme"),
            "  ".to_string(),
            String::new(),
            String::new(),
            b"data",
        )
        .await
        .is_err());

        assert!(upload(
            &store,
            &objects,
            Scope::business("acme"),
            "empty.bin".to_string(),
            String::new(),
            String::new(),
            b"",
        )
        .await
        .is_err());
    }

    #[tokio::test]
    async fn test_delete_removes_row_and_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new();
        let objects = LocalObjectStore::new(dir.path());

        let info = upload(
            &store,
            &objects,
            Scope::business("acme"),
            "logo.png".to_string(),
            "image/png".to_string(),
            String::new(),
            b"PNGDATA",
        )
        .await
        .unwrap();

        delete(&store, &objects, &info.file_id).await.unwrap();
        assert!(find(&store, &info.file_id).await.is_err());
        assert!(objects.get(&info.path).await.is_err());
    }
}
