//! Resource config domain model
//!
//! A config is addressed by a scope (an ordered tuple of named dimensions)
//! plus a human alias unique within that scope. The two historical scope
//! shapes, environment+pipeline and the flat legacy business key, are both
//! representations of the same `Scope` type.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Fixed serving path prefix for uploaded asset bytes
pub const FILE_SERVE_PREFIX: &str = "/api/v1/resource/files/";

/// Reserved scope key that holds system/default configs
pub const SYSTEM_SCOPE_KEY: &str = "system";

/// Alias promoted to a top-level field of the static bundle
pub const BUSINESS_SELECT_ALIAS: &str = "business_select";

/// Aliases that must never be deleted
pub const PROTECTED_ALIASES: &[&str] = &[BUSINESS_SELECT_ALIAS];

/// One named dimension of a scope, e.g. ("environment", "prod")
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ScopeDimension {
    pub name: String,
    pub value: String,
}

/// Addressing axis under which configs and assets are namespaced
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Scope {
    dimensions: Vec<ScopeDimension>,
}

impl Scope {
    /// Two-dimensional environment+pipeline scope
    pub fn env_pipeline(environment: &str, pipeline: &str) -> Self {
        Scope {
            dimensions: vec![
                ScopeDimension {
                    name: "environment".to_string(),
                    value: environment.trim().to_string(),
                },
                ScopeDimension {
                    name: "pipeline".to_string(),
                    value: pipeline.trim().to_string(),
                },
            ],
        }
    }

    /// One-dimensional legacy business-key scope
    pub fn business(key: &str) -> Self {
        Scope {
            dimensions: vec![ScopeDimension {
                name: "business".to_string(),
                value: key.trim().to_string(),
            }],
        }
    }

    /// Reserved scope for system/default configs
    pub fn system() -> Self {
        Scope::business(SYSTEM_SCOPE_KEY)
    }

    /// Empty scope, used when ownership could not be inferred
    pub fn empty() -> Self {
        Scope { dimensions: vec![] }
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty() || self.dimensions.iter().all(|d| d.value.is_empty())
    }

    pub fn dimensions(&self) -> &[ScopeDimension] {
        &self.dimensions
    }

    /// Canonical key: dimension values joined with `:`. Legacy one-dimension
    /// scopes render as their bare key, so `system` stays `system`.
    pub fn key(&self) -> String {
        self.dimensions
            .iter()
            .map(|d| d.value.as_str())
            .collect::<Vec<_>>()
            .join(":")
    }

    /// Parse a canonical key back into a scope. A key with two segments is
    /// an environment+pipeline scope, anything else a legacy business key.
    pub fn parse_key(key: &str) -> Self {
        let key = key.trim();
        if key.is_empty() {
            return Scope::empty();
        }
        let parts: Vec<&str> = key.split(':').collect();
        if parts.len() == 2 {
            Scope::env_pipeline(parts[0], parts[1])
        } else {
            Scope::business(key)
        }
    }
}

impl Serialize for Scope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.key())
    }
}

impl<'de> Deserialize<'de> for Scope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        Ok(Scope::parse_key(&key))
    }
}

/// Canonical config content types
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigType {
    Image,
    Text,
    Color,
    Config,
}

impl ConfigType {
    /// Normalize a raw type tag: trimmed, case-insensitive, synonyms folded.
    /// Unrecognized tags default to the generic `config` type.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "image" => ConfigType::Image,
            "text" | "string" | "copy" => ConfigType::Text,
            "color" | "colour" | "color_tag" | "color-tag" => ConfigType::Color,
            _ => ConfigType::Config,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigType::Image => "image",
            ConfigType::Text => "text",
            ConfigType::Color => "color",
            ConfigType::Config => "config",
        }
    }
}

/// Full config record as held by the stores
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ResourceConfigInfo {
    pub resource_key: String,
    pub scope: Scope,
    pub alias: String,
    pub name: String,
    pub r#type: String,
    pub content: String,
    pub remark: String,
    pub is_perm: bool,
    pub gmt_create: i64,
    pub gmt_modified: i64,
}
