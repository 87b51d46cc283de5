//! In-memory store for standalone deployments and tests
//!
//! Mirrors the database-backed store's observable behavior over plain
//! collections behind a `parking_lot` lock.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::model::asset::AssetInfo;
use crate::model::common::Page;
use crate::model::config::{ResourceConfigInfo, Scope};

use super::{AssetStore, ConfigStore};

#[derive(Default)]
pub struct MemoryStore {
    configs: RwLock<Vec<ResourceConfigInfo>>,
    assets: RwLock<HashMap<String, AssetInfo>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sort_recent_first(rows: &mut [ResourceConfigInfo]) {
    rows.sort_by(|a, b| b.gmt_modified.cmp(&a.gmt_modified));
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn find_by_resource_key(
        &self,
        scope: &Scope,
        resource_key: &str,
    ) -> anyhow::Result<Option<ResourceConfigInfo>> {
        let configs = self.configs.read();
        Ok(configs
            .iter()
            .find(|c| c.scope == *scope && c.resource_key == resource_key)
            .cloned())
    }

    async fn find_by_alias(
        &self,
        scope: &Scope,
        alias: &str,
    ) -> anyhow::Result<Option<ResourceConfigInfo>> {
        let configs = self.configs.read();
        let mut matches: Vec<ResourceConfigInfo> = configs
            .iter()
            .filter(|c| c.scope == *scope && c.alias == alias)
            .cloned()
            .collect();
        sort_recent_first(&mut matches);
        Ok(matches.into_iter().next())
    }

    async fn find_by_scope(&self, scope: &Scope) -> anyhow::Result<Vec<ResourceConfigInfo>> {
        let configs = self.configs.read();
        let mut rows: Vec<ResourceConfigInfo> = configs
            .iter()
            .filter(|c| c.scope == *scope)
            .cloned()
            .collect();
        sort_recent_first(&mut rows);
        Ok(rows)
    }

    async fn search_page(
        &self,
        scope: &Scope,
        alias: &str,
        name: &str,
        include_perm: bool,
        page_no: u64,
        page_size: u64,
    ) -> anyhow::Result<Page<ResourceConfigInfo>> {
        let configs = self.configs.read();
        let mut rows: Vec<ResourceConfigInfo> = configs
            .iter()
            .filter(|c| c.scope == *scope)
            .filter(|c| alias.is_empty() || c.alias.contains(alias))
            .filter(|c| name.is_empty() || c.name.contains(name))
            .filter(|c| include_perm || !c.is_perm)
            .cloned()
            .collect();
        sort_recent_first(&mut rows);

        let page_size = page_size.max(1);
        let total = rows.len() as u64;
        let start = ((page_no.saturating_sub(1)) * page_size) as usize;
        let items: Vec<ResourceConfigInfo> = rows
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .collect();
        Ok(Page::new(total, page_no, page_size, items))
    }

    async fn insert(&self, info: &ResourceConfigInfo) -> anyhow::Result<()> {
        let mut configs = self.configs.write();
        if configs
            .iter()
            .any(|c| c.resource_key == info.resource_key)
        {
            anyhow::bail!("resource key '{}' already exists", info.resource_key);
        }
        configs.push(info.clone());
        Ok(())
    }

    async fn update(&self, info: &ResourceConfigInfo) -> anyhow::Result<()> {
        let mut configs = self.configs.write();
        let slot = configs
            .iter_mut()
            .find(|c| c.scope == info.scope && c.resource_key == info.resource_key)
            .ok_or_else(|| {
                anyhow::anyhow!("config '{}' not found for update", info.resource_key)
            })?;
        let gmt_create = slot.gmt_create;
        *slot = info.clone();
        slot.gmt_create = gmt_create;
        Ok(())
    }

    async fn delete(&self, scope: &Scope, resource_key: &str) -> anyhow::Result<bool> {
        let mut configs = self.configs.write();
        let before = configs.len();
        configs.retain(|c| !(c.scope == *scope && c.resource_key == resource_key));
        Ok(configs.len() < before)
    }

    async fn delete_all(&self) -> anyhow::Result<u64> {
        let mut configs = self.configs.write();
        let count = configs.len() as u64;
        configs.clear();
        Ok(count)
    }
}

#[async_trait]
impl AssetStore for MemoryStore {
    async fn find_by_file_id(&self, file_id: &str) -> anyhow::Result<Option<AssetInfo>> {
        Ok(self.assets.read().get(file_id).cloned())
    }

    async fn insert(&self, info: &AssetInfo) -> anyhow::Result<()> {
        let mut assets = self.assets.write();
        if assets.contains_key(&info.file_id) {
            anyhow::bail!("file id '{}' already exists", info.file_id);
        }
        assets.insert(info.file_id.clone(), info.clone());
        Ok(())
    }

    async fn update(&self, info: &AssetInfo) -> anyhow::Result<()> {
        let mut assets = self.assets.write();
        if !assets.contains_key(&info.file_id) {
            anyhow::bail!("asset '{}' not found for update", info.file_id);
        }
        assets.insert(info.file_id.clone(), info.clone());
        Ok(())
    }

    async fn delete(&self, file_id: &str) -> anyhow::Result<bool> {
        Ok(self.assets.write().remove(file_id).is_some())
    }
}
