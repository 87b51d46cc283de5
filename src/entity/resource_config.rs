//! Resource config entity
//!
//! One row per config. `resource_key` is globally unique; (`scope_key`,
//! `alias`) is unique within a scope.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "resource_config")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Opaque globally-unique identifier
    #[sea_orm(unique)]
    pub resource_key: String,
    /// Canonical scope key, e.g. "prod:web" or a legacy business key
    pub scope_key: String,
    /// Human-facing name, unique within a scope
    pub alias: String,
    pub name: String,
    /// Canonical type tag: image, text, color or config
    pub config_type: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub remark: String,
    /// Visible only to identified callers when set
    pub is_perm: bool,
    /// Creation timestamp, epoch milliseconds
    pub gmt_create: i64,
    /// Modification timestamp, epoch milliseconds
    pub gmt_modified: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
