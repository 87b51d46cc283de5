//! Uploaded asset metadata model

use serde::{Deserialize, Serialize};

use super::config::Scope;

/// Metadata for an uploaded binary file. The byte content lives in the
/// object store under `path`; configs reference the file only through its
/// `file_id` embedded in their content.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AssetInfo {
    pub file_id: String,
    pub scope: Scope,
    pub file_name: String,
    pub content_type: String,
    pub file_size: i64,
    pub path: String,
    pub url: String,
    pub remark: String,
    pub gmt_create: i64,
    pub gmt_modified: i64,
}
