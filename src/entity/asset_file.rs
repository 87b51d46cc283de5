//! Uploaded asset metadata entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "asset_file")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Opaque identifier assigned at upload time
    #[sea_orm(unique)]
    pub file_id: String,
    /// Canonical scope key; may be empty when ownership is unknown
    pub scope_key: String,
    pub file_name: String,
    pub content_type: String,
    pub file_size: i64,
    /// Object store path of the byte content
    pub path: String,
    /// Resolved serving URL
    pub url: String,
    pub remark: String,
    pub gmt_create: i64,
    pub gmt_modified: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
