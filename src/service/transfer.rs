// Config transfer engine
// Orchestrates export (select -> normalize -> resolve references -> package)
// and import (unpack -> validate -> merge by resource key/alias -> restore
// asset bytes) over the store abstractions

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ConfpackError;
use crate::model::common::now_millis;
use crate::model::config::{ResourceConfigInfo, Scope};
use crate::model::transfer::ArchiveConfigItem;
use crate::model::asset::AssetInfo;
use crate::service::{archive, content, reference, static_bundle};
use crate::store::{AssetStore, ConfigStore, ObjectStore};

pub struct TransferService {
    configs: Arc<dyn ConfigStore>,
    assets: Arc<dyn AssetStore>,
    objects: Arc<dyn ObjectStore>,
}

/// Keep the first (most recently modified) row per alias, preserving order
fn dedup_by_alias(rows: Vec<ResourceConfigInfo>) -> Vec<ResourceConfigInfo> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| seen.insert(row.alias.clone()))
        .collect()
}

impl TransferService {
    pub fn new(
        configs: Arc<dyn ConfigStore>,
        assets: Arc<dyn AssetStore>,
        objects: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            configs,
            assets,
            objects,
        }
    }

    /// Export the configs of one scope: deduplicated by alias with the most
    /// recently updated row winning, resource keys stripped, optionally
    /// followed by the system scope's configs.
    pub async fn export(
        &self,
        scope: &Scope,
        include_system: bool,
    ) -> anyhow::Result<Vec<ResourceConfigInfo>> {
        let mut result = dedup_by_alias(self.configs.find_by_scope(scope).await?);

        let system = Scope::system();
        if include_system && *scope != system {
            result.extend(dedup_by_alias(self.configs.find_by_scope(&system).await?));
        }

        for row in &mut result {
            row.resource_key.clear();
        }
        Ok(result)
    }

    async fn normalize_all(
        &self,
        rows: &mut [ResourceConfigInfo],
    ) -> anyhow::Result<()> {
        for row in rows.iter_mut() {
            content::normalize(row, &*self.assets).await?;
        }
        Ok(())
    }

    /// Resolve every referenced asset id to its bytes. A reference whose
    /// asset row or byte content is gone aborts the packaging; no partial
    /// archive is emitted.
    async fn collect_files(
        &self,
        rows: &[ResourceConfigInfo],
    ) -> anyhow::Result<Vec<archive::ArchiveFile>> {
        let mut files = Vec::new();
        for file_id in reference::extract(rows) {
            let asset = self
                .assets
                .find_by_file_id(&file_id)
                .await?
                .ok_or_else(|| {
                    ConfpackError::Storage(format!(
                        "asset '{}' referenced by exported configs does not exist",
                        file_id
                    ))
                })?;
            let bytes = self.objects.get(&asset.path).await.map_err(|e| {
                ConfpackError::Storage(format!(
                    "asset '{}' bytes unavailable at '{}': {}",
                    file_id, asset.path, e
                ))
            })?;
            files.push(archive::ArchiveFile {
                file_id,
                file_name: asset.file_name,
                bytes,
            });
        }
        Ok(files)
    }

    /// Export one scope as a transfer archive
    pub async fn export_archive(
        &self,
        scope: &Scope,
        include_system: bool,
    ) -> anyhow::Result<Vec<u8>> {
        let mut rows = self.export(scope, include_system).await?;
        self.normalize_all(&mut rows).await?;
        let files = self.collect_files(&rows).await?;
        let items: Vec<ArchiveConfigItem> =
            rows.into_iter().map(ArchiveConfigItem::from).collect();
        info!(
            scope = %scope.key(),
            configs = items.len(),
            files = files.len(),
            "exporting transfer archive"
        );
        archive::write_archive(&items, &files)
    }

    /// Export the requested scopes as a static bundle suitable for a CDN or
    /// static file server
    pub async fn export_static_bundle(
        &self,
        scopes: &[Scope],
        include_system: bool,
    ) -> anyhow::Result<Vec<u8>> {
        let mut scoped: Vec<(Scope, Vec<ResourceConfigInfo>)> = Vec::new();
        for scope in scopes {
            let mut rows = self.export(scope, false).await?;
            self.normalize_all(&mut rows).await?;
            scoped.push((scope.clone(), rows));
        }

        let mut system_rows = if include_system {
            self.export(&Scope::system(), false).await?
        } else {
            Vec::new()
        };
        self.normalize_all(&mut system_rows).await?;

        let all: Vec<ResourceConfigInfo> = scoped
            .iter()
            .flat_map(|(_, rows)| rows.iter())
            .chain(system_rows.iter())
            .cloned()
            .collect();
        let files = self.collect_files(&all).await?;

        let replacements: HashMap<String, String> = files
            .iter()
            .map(|f| {
                (
                    f.file_id.clone(),
                    format!("{}{}/{}", archive::STATIC_ASSETS_PREFIX, f.file_id, f.file_name),
                )
            })
            .collect();

        let document = static_bundle::build(&scoped, &system_rows, include_system, &replacements);
        archive::write_static_bundle(&document, &files)
    }

    /// Import config records. With `overwrite` every existing config row is
    /// hard-deleted first. Records are processed in input order; duplicate
    /// (scope, alias) pairs within one call are skipped after the first.
    /// Fail-fast: the first failing record aborts the call (writes already
    /// committed stay committed).
    pub async fn import(
        &self,
        items: Vec<ArchiveConfigItem>,
        overwrite: bool,
    ) -> anyhow::Result<Vec<ResourceConfigInfo>> {
        if overwrite {
            let deleted = self.configs.delete_all().await?;
            warn!(deleted, "overwrite import wiped existing configs");
        }

        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut imported = Vec::new();

        for item in items {
            let mut info = item.into_info();
            content::normalize(&mut info, &*self.assets).await?;

            if !seen.insert((info.scope.key(), info.alias.clone())) {
                debug!(
                    scope = %info.scope.key(),
                    alias = %info.alias,
                    "skipping duplicate alias within import"
                );
                continue;
            }

            let existing = if !info.resource_key.is_empty() {
                self.configs
                    .find_by_resource_key(&info.scope, &info.resource_key)
                    .await?
            } else {
                None
            };
            let existing = match existing {
                Some(found) => Some(found),
                None => self.configs.find_by_alias(&info.scope, &info.alias).await?,
            };

            match existing {
                Some(current) => {
                    info.resource_key = current.resource_key;
                    info.gmt_create = current.gmt_create;
                    info.gmt_modified = now_millis();
                    self.configs.update(&info).await?;
                }
                None => {
                    if info.resource_key.is_empty() {
                        info.resource_key = Uuid::new_v4().to_string();
                    }
                    let now = now_millis();
                    info.gmt_create = now;
                    info.gmt_modified = now;
                    self.configs.insert(&info).await?;
                }
            }
            imported.push(info);
        }

        info!(imported = imported.len(), "config import finished");
        Ok(imported)
    }

    /// Import an archive in either layout: import the manifest's records,
    /// then restore every asset byte entry and upsert its metadata row.
    pub async fn import_archive(
        &self,
        data: &[u8],
        overwrite: bool,
    ) -> anyhow::Result<Vec<ResourceConfigInfo>> {
        let parsed = archive::read_archive(data)?;
        let imported = self.import(parsed.items, overwrite).await?;

        for file in parsed.files {
            let scope = reference::infer_scope(&file.file_id, &imported);
            if scope.is_empty() {
                warn!(
                    file_id = %file.file_id,
                    "could not infer owning scope for restored asset"
                );
            }

            let path = format!("{}/{}", file.file_id, file.file_name);
            self.objects.put(&path, &file.bytes).await?;
            let url = self.objects.url_for(&file.file_id);
            let now = now_millis();

            match self.assets.find_by_file_id(&file.file_id).await? {
                Some(mut existing) => {
                    existing.file_name = file.file_name;
                    existing.file_size = file.bytes.len() as i64;
                    existing.path = path;
                    existing.url = url;
                    if !scope.is_empty() {
                        existing.scope = scope;
                    }
                    existing.gmt_modified = now;
                    self.assets.update(&existing).await?;
                }
                None => {
                    self.assets
                        .insert(&AssetInfo {
                            file_id: file.file_id.clone(),
                            scope,
                            file_name: file.file_name,
                            content_type: String::new(),
                            file_size: file.bytes.len() as i64,
                            path,
                            url,
                            remark: String::new(),
                            gmt_create: now,
                            gmt_modified: now,
                        })
                        .await?;
                }
            }
        }

        Ok(imported)
    }
}
