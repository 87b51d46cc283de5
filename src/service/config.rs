// Config CRUD service

use tracing::info;
use uuid::Uuid;

use crate::error::ConfpackError;
use crate::model::common::{now_millis, Page};
use crate::model::config::{ResourceConfigInfo, Scope, PROTECTED_ALIASES};
use crate::service::content;
use crate::store::{AssetStore, ConfigStore};

/// Create a config. The alias must be unused within the scope; an empty
/// resource key gets a generated one.
pub async fn add(
    configs: &dyn ConfigStore,
    assets: &dyn AssetStore,
    mut info: ResourceConfigInfo,
) -> anyhow::Result<ResourceConfigInfo> {
    content::normalize(&mut info, assets).await?;

    if configs
        .find_by_alias(&info.scope, &info.alias)
        .await?
        .is_some()
    {
        return Err(ConfpackError::Validation(format!(
            "alias '{}' already exists in scope '{}'",
            info.alias,
            info.scope.key()
        ))
        .into());
    }

    if info.resource_key.is_empty() {
        info.resource_key = Uuid::new_v4().to_string();
    }
    let now = now_millis();
    info.gmt_create = now;
    info.gmt_modified = now;

    configs.insert(&info).await?;
    info!(scope = %info.scope.key(), alias = %info.alias, "config created");
    Ok(info)
}

/// Update a config addressed by resource key. Moving to an alias held by a
/// different config in the same scope is rejected.
pub async fn update(
    configs: &dyn ConfigStore,
    assets: &dyn AssetStore,
    mut info: ResourceConfigInfo,
) -> anyhow::Result<ResourceConfigInfo> {
    content::normalize(&mut info, assets).await?;

    let current = configs
        .find_by_resource_key(&info.scope, &info.resource_key)
        .await?
        .ok_or_else(|| {
            ConfpackError::NotFound(format!("config '{}' does not exist", info.resource_key))
        })?;

    if let Some(holder) = configs.find_by_alias(&info.scope, &info.alias).await?
        && holder.resource_key != info.resource_key
    {
        return Err(ConfpackError::Validation(format!(
            "alias '{}' already exists in scope '{}'",
            info.alias,
            info.scope.key()
        ))
        .into());
    }

    info.gmt_create = current.gmt_create;
    info.gmt_modified = now_millis();
    configs.update(&info).await?;
    Ok(info)
}

/// Delete a config by resource key. Protected aliases cannot be deleted.
pub async fn delete(
    configs: &dyn ConfigStore,
    scope: &Scope,
    resource_key: &str,
) -> anyhow::Result<()> {
    let current = configs
        .find_by_resource_key(scope, resource_key)
        .await?
        .ok_or_else(|| {
            ConfpackError::NotFound(format!("config '{}' does not exist", resource_key))
        })?;

    if PROTECTED_ALIASES.contains(&current.alias.as_str()) {
        return Err(ConfpackError::Protected(format!(
            "config '{}' cannot be deleted",
            current.alias
        ))
        .into());
    }

    configs.delete(scope, resource_key).await?;
    info!(scope = %scope.key(), alias = %current.alias, "config deleted");
    Ok(())
}

/// Fetch one config. Permission-gated rows are invisible to unidentified
/// callers, indistinguishable from absent ones.
pub async fn detail(
    configs: &dyn ConfigStore,
    scope: &Scope,
    resource_key: &str,
    identified: bool,
) -> anyhow::Result<ResourceConfigInfo> {
    let found = configs.find_by_resource_key(scope, resource_key).await?;
    match found {
        Some(info) if !info.is_perm || identified => Ok(info),
        _ => Err(ConfpackError::NotFound(format!(
            "config '{}' does not exist",
            resource_key
        ))
        .into()),
    }
}

/// Paged search within a scope
pub async fn search_page(
    configs: &dyn ConfigStore,
    scope: &Scope,
    alias: &str,
    name: &str,
    identified: bool,
    page_no: u64,
    page_size: u64,
) -> anyhow::Result<Page<ResourceConfigInfo>> {
    configs
        .search_page(scope, alias, name, identified, page_no, page_size)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::BUSINESS_SELECT_ALIAS;
    use crate::store::MemoryStore;

    fn sample(scope: Scope, alias: &str) -> ResourceConfigInfo {
        ResourceConfigInfo {
            scope,
            alias: alias.to_string(),
            name: alias.to_string(),
            r#type: "text".to_string(),
            content: "hello".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_add_generates_resource_key_and_rejects_duplicate_alias() {
        let store = MemoryStore::new();
        let scope = Scope::business("acme");

        let created = add(&store, &store, sample(scope.clone(), "title"))
            .await
            .unwrap();
        assert!(!created.resource_key.is_empty());

        let err = add(&store, &store, sample(scope.clone(), "title"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfpackError>(),
            Some(ConfpackError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_update_rejects_alias_collision() {
        let store = MemoryStore::new();
        let scope = Scope::business("acme");

        add(&store, &store, sample(scope.clone(), "title"))
            .await
            .unwrap();
        let second = add(&store, &store, sample(scope.clone(), "subtitle"))
            .await
            .unwrap();

        let mut renamed = second.clone();
        renamed.alias = "title".to_string();
        let err = update(&store, &store, renamed).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfpackError>(),
            Some(ConfpackError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_update_missing_config_is_not_found() {
        let store = MemoryStore::new();
        let mut info = sample(Scope::business("acme"), "title");
        info.resource_key = "no-such-key".to_string();
        let err = update(&store, &store, info).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfpackError>(),
            Some(ConfpackError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_protected_alias_is_rejected() {
        let store = MemoryStore::new();
        let scope = Scope::business("acme");
        let created = add(&store, &store, sample(scope.clone(), BUSINESS_SELECT_ALIAS))
            .await
            .unwrap();

        let err = delete(&store, &scope, &created.resource_key)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfpackError>(),
            Some(ConfpackError::Protected(_))
        ));

        // Still present
        assert!(detail(&store, &scope, &created.resource_key, true)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_detail_hides_perm_configs_from_unidentified_callers() {
        let store = MemoryStore::new();
        let scope = Scope::business("acme");
        let mut info = sample(scope.clone(), "secret");
        info.is_perm = true;
        let created = add(&store, &store, info).await.unwrap();

        let err = detail(&store, &scope, &created.resource_key, false)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfpackError>(),
            Some(ConfpackError::NotFound(_))
        ));
        assert!(detail(&store, &scope, &created.resource_key, true)
            .await
            .is_ok());
    }
}
