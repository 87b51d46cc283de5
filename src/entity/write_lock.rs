//! Distributed write lock entity
//!
//! One row per lock key. A row is held until released by its owner token or
//! until `expires_at` passes, whichever comes first.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "write_lock")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub lock_key: String,
    /// Token the holder must present to release
    pub owner_token: String,
    /// Expiry timestamp, epoch milliseconds
    pub expires_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
