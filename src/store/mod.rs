//! Storage abstraction layer
//!
//! The transfer engine and services talk to these traits only. `db` provides
//! the sea-orm backed implementation for external MySQL/PostgreSQL, `memory`
//! a standalone in-process implementation, `local` a filesystem object store.

pub mod db;
pub mod local;
pub mod memory;

use async_trait::async_trait;

use crate::model::asset::AssetInfo;
use crate::model::common::Page;
use crate::model::config::{ResourceConfigInfo, Scope};

pub use db::DbStore;
pub use local::LocalObjectStore;
pub use memory::MemoryStore;

/// Persistence for config rows, keyed by (scope, resource_key) with alias
/// uniqueness within a scope
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn find_by_resource_key(
        &self,
        scope: &Scope,
        resource_key: &str,
    ) -> anyhow::Result<Option<ResourceConfigInfo>>;

    async fn find_by_alias(
        &self,
        scope: &Scope,
        alias: &str,
    ) -> anyhow::Result<Option<ResourceConfigInfo>>;

    /// All rows of a scope, most recently modified first
    async fn find_by_scope(&self, scope: &Scope) -> anyhow::Result<Vec<ResourceConfigInfo>>;

    /// Paged search with optional alias/name filters. `include_perm` controls
    /// whether permission-gated rows appear.
    async fn search_page(
        &self,
        scope: &Scope,
        alias: &str,
        name: &str,
        include_perm: bool,
        page_no: u64,
        page_size: u64,
    ) -> anyhow::Result<Page<ResourceConfigInfo>>;

    async fn insert(&self, info: &ResourceConfigInfo) -> anyhow::Result<()>;

    async fn update(&self, info: &ResourceConfigInfo) -> anyhow::Result<()>;

    async fn delete(&self, scope: &Scope, resource_key: &str) -> anyhow::Result<bool>;

    /// Hard-delete every config row. Used only by overwrite imports.
    async fn delete_all(&self) -> anyhow::Result<u64>;
}

/// Persistence for uploaded asset metadata, keyed by file id
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn find_by_file_id(&self, file_id: &str) -> anyhow::Result<Option<AssetInfo>>;

    async fn insert(&self, info: &AssetInfo) -> anyhow::Result<()>;

    async fn update(&self, info: &AssetInfo) -> anyhow::Result<()>;

    async fn delete(&self, file_id: &str) -> anyhow::Result<bool>;
}

/// Narrow byte storage capability for asset content
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, path: &str, bytes: &[u8]) -> anyhow::Result<()>;

    async fn get(&self, path: &str) -> anyhow::Result<Vec<u8>>;

    async fn delete(&self, path: &str) -> anyhow::Result<()>;

    /// Serving URL for a stored file
    fn url_for(&self, file_id: &str) -> String;
}
