//! Transfer (export/import) wire models
//!
//! `ArchiveConfigItem` is the record shape written to the `configs.json`
//! manifest of an export archive; `BundleEntry` is the per-alias entry shape
//! of the nested static bundle document.

use serde::{Deserialize, Serialize};

use super::common::now_millis;
use super::config::{ResourceConfigInfo, Scope};

/// Reserved top-level keys of the static bundle document; every other key is
/// a scope identifier.
pub const BUNDLE_RESERVED_KEYS: &[&str] = &["business_keys", "include_system", "business_select"];

/// Legacy flat manifest key inside a static bundle document
pub const BUNDLE_LEGACY_CONFIGS_KEY: &str = "configs";

/// One config record in the archive manifest
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ArchiveConfigItem {
    #[serde(default)]
    pub resource_key: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub scope: Scope,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "type", default)]
    pub r#type: String,
    #[serde(default)]
    pub remark: String,
    #[serde(default)]
    pub is_perm: bool,
}

impl From<ResourceConfigInfo> for ArchiveConfigItem {
    fn from(info: ResourceConfigInfo) -> Self {
        ArchiveConfigItem {
            resource_key: info.resource_key,
            alias: info.alias,
            name: info.name,
            scope: info.scope,
            content: info.content,
            r#type: info.r#type,
            remark: info.remark,
            is_perm: info.is_perm,
        }
    }
}

impl ArchiveConfigItem {
    pub fn into_info(self) -> ResourceConfigInfo {
        let now = now_millis();
        ResourceConfigInfo {
            resource_key: self.resource_key,
            scope: self.scope,
            alias: self.alias,
            name: self.name,
            r#type: self.r#type,
            content: self.content,
            remark: self.remark,
            is_perm: self.is_perm,
            gmt_create: now,
            gmt_modified: now,
        }
    }
}

/// Per-alias entry of the static bundle document. `content` is parsed JSON
/// for cleanly-parsing `config` typed records, a raw string otherwise.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BundleEntry {
    pub resource_key: String,
    pub name: String,
    #[serde(rename = "type")]
    pub r#type: String,
    pub remark: String,
    pub is_perm: bool,
    pub content: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::Scope;

    #[test]
    fn test_archive_item_manifest_shape() {
        let item = ArchiveConfigItem {
            resource_key: "rk-1".to_string(),
            alias: "logo".to_string(),
            name: "Logo".to_string(),
            scope: Scope::env_pipeline("prod", "web"),
            content: "asset://abc".to_string(),
            r#type: "image".to_string(),
            remark: String::new(),
            is_perm: false,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["scope"], "prod:web");
        assert_eq!(json["type"], "image");
        assert_eq!(json["alias"], "logo");
    }

    #[test]
    fn test_archive_item_tolerates_missing_fields() {
        let item: ArchiveConfigItem =
            serde_json::from_str(r#"{"alias":"a","content":"x","type":"text"}"#).unwrap();
        assert_eq!(item.alias, "a");
        assert!(item.resource_key.is_empty());
        assert!(item.scope.is_empty());
    }
}
