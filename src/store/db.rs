//! Database-backed store implementation over sea-orm

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

use crate::entity::{asset_file, resource_config};
use crate::model::asset::AssetInfo;
use crate::model::common::Page;
use crate::model::config::{ResourceConfigInfo, Scope};

use super::{AssetStore, ConfigStore};

/// External-database store; implements both the config and asset stores
#[derive(Clone)]
pub struct DbStore {
    db: DatabaseConnection,
}

impl DbStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn config_to_info(model: resource_config::Model) -> ResourceConfigInfo {
    ResourceConfigInfo {
        resource_key: model.resource_key,
        scope: Scope::parse_key(&model.scope_key),
        alias: model.alias,
        name: model.name,
        r#type: model.config_type,
        content: model.content,
        remark: model.remark,
        is_perm: model.is_perm,
        gmt_create: model.gmt_create,
        gmt_modified: model.gmt_modified,
    }
}

fn asset_to_info(model: asset_file::Model) -> AssetInfo {
    AssetInfo {
        file_id: model.file_id,
        scope: Scope::parse_key(&model.scope_key),
        file_name: model.file_name,
        content_type: model.content_type,
        file_size: model.file_size,
        path: model.path,
        url: model.url,
        remark: model.remark,
        gmt_create: model.gmt_create,
        gmt_modified: model.gmt_modified,
    }
}

#[async_trait]
impl ConfigStore for DbStore {
    async fn find_by_resource_key(
        &self,
        scope: &Scope,
        resource_key: &str,
    ) -> anyhow::Result<Option<ResourceConfigInfo>> {
        let model = resource_config::Entity::find()
            .filter(resource_config::Column::ScopeKey.eq(scope.key()))
            .filter(resource_config::Column::ResourceKey.eq(resource_key))
            .one(&self.db)
            .await?;
        Ok(model.map(config_to_info))
    }

    async fn find_by_alias(
        &self,
        scope: &Scope,
        alias: &str,
    ) -> anyhow::Result<Option<ResourceConfigInfo>> {
        let model = resource_config::Entity::find()
            .filter(resource_config::Column::ScopeKey.eq(scope.key()))
            .filter(resource_config::Column::Alias.eq(alias))
            .order_by_desc(resource_config::Column::GmtModified)
            .one(&self.db)
            .await?;
        Ok(model.map(config_to_info))
    }

    async fn find_by_scope(&self, scope: &Scope) -> anyhow::Result<Vec<ResourceConfigInfo>> {
        let models = resource_config::Entity::find()
            .filter(resource_config::Column::ScopeKey.eq(scope.key()))
            .order_by_desc(resource_config::Column::GmtModified)
            .order_by_desc(resource_config::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(config_to_info).collect())
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
        let mut query = resource_config::Entity::find()
            .filter(resource_config::Column::ScopeKey.eq(scope.key()))
            .order_by_desc(resource_config::Column::GmtModified);

        if !alias.is_empty() {
            query = query.filter(resource_config::Column::Alias.contains(alias));
        }
        if !name.is_empty() {
            query = query.filter(resource_config::Column::Name.contains(name));
        }
        if !include_perm {
            query = query.filter(
                Condition::all().add(resource_config::Column::IsPerm.eq(false)),
            );
        }

        let paginator = query.paginate(&self.db, page_size.max(1));
        let total_count = paginator.num_items().await?;
        let models = paginator.fetch_page(page_no.saturating_sub(1)).await?;

        Ok(Page::new(
            total_count,
            page_no,
            page_size.max(1),
            models.into_iter().map(config_to_info).collect(),
        ))
    }

    async fn insert(&self, info: &ResourceConfigInfo) -> anyhow::Result<()> {
        let model = resource_config::ActiveModel {
            resource_key: Set(info.resource_key.clone()),
            scope_key: Set(info.scope.key()),
            alias: Set(info.alias.clone()),
            name: Set(info.name.clone()),
            config_type: Set(info.r#type.clone()),
            content: Set(info.content.clone()),
            remark: Set(info.remark.clone()),
            is_perm: Set(info.is_perm),
            gmt_create: Set(info.gmt_create),
            gmt_modified: Set(info.gmt_modified),
            ..Default::default()
        };
        model.insert(&self.db).await?;
        Ok(())
    }

    async fn update(&self, info: &ResourceConfigInfo) -> anyhow::Result<()> {
        let existing = resource_config::Entity::find()
            .filter(resource_config::Column::ScopeKey.eq(info.scope.key()))
            .filter(resource_config::Column::ResourceKey.eq(info.resource_key.as_str()))
            .one(&self.db)
            .await?
            .ok_or_else(|| {
                anyhow::anyhow!("config '{}' not found for update", info.resource_key)
            })?;

        let mut model: resource_config::ActiveModel = existing.into();
        model.alias = Set(info.alias.clone());
        model.name = Set(info.name.clone());
        model.config_type = Set(info.r#type.clone());
        model.content = Set(info.content.clone());
        model.remark = Set(info.remark.clone());
        model.is_perm = Set(info.is_perm);
        model.gmt_modified = Set(info.gmt_modified);
        model.update(&self.db).await?;
        Ok(())
    }

    async fn delete(&self, scope: &Scope, resource_key: &str) -> anyhow::Result<bool> {
        let result = resource_config::Entity::delete_many()
            .filter(resource_config::Column::ScopeKey.eq(scope.key()))
            .filter(resource_config::Column::ResourceKey.eq(resource_key))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn delete_all(&self) -> anyhow::Result<u64> {
        let result = resource_config::Entity::delete_many().exec(&self.db).await?;
        Ok(result.rows_affected)
    }
}

#[async_trait]
impl AssetStore for DbStore {
    async fn find_by_file_id(&self, file_id: &str) -> anyhow::Result<Option<AssetInfo>> {
        let model = asset_file::Entity::find()
            .filter(asset_file::Column::FileId.eq(file_id))
            .one(&self.db)
            .await?;
        Ok(model.map(asset_to_info))
    }

    async fn insert(&self, info: &AssetInfo) -> anyhow::Result<()> {
        let model = asset_file::ActiveModel {
            file_id: Set(info.file_id.clone()),
            scope_key: Set(info.scope.key()),
            file_name: Set(info.file_name.clone()),
            content_type: Set(info.content_type.clone()),
            file_size: Set(info.file_size),
            path: Set(info.path.clone()),
            url: Set(info.url.clone()),
            remark: Set(info.remark.clone()),
            gmt_create: Set(info.gmt_create),
            gmt_modified: Set(info.gmt_modified),
            ..Default::default()
        };
        model.insert(&self.db).await?;
        Ok(())
    }

    async fn update(&self, info: &AssetInfo) -> anyhow::Result<()> {
        let existing = asset_file::Entity::find()
            .filter(asset_file::Column::FileId.eq(info.file_id.as_str()))
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow::anyhow!("asset '{}' not found for update", info.file_id))?;

        let mut model: asset_file::ActiveModel = existing.into();
        model.scope_key = Set(info.scope.key());
        model.file_name = Set(info.file_name.clone());
        model.content_type = Set(info.content_type.clone());
        model.file_size = Set(info.file_size);
        model.path = Set(info.path.clone());
        model.url = Set(info.url.clone());
        model.remark = Set(info.remark.clone());
        model.gmt_modified = Set(info.gmt_modified);
        model.update(&self.db).await?;
        Ok(())
    }

    async fn delete(&self, file_id: &str) -> anyhow::Result<bool> {
        let result = asset_file::Entity::delete_many()
            .filter(asset_file::Column::FileId.eq(file_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }
}
