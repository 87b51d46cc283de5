//! Request forms and query parameters for the v1 resource API

use serde::Deserialize;

use crate::error::ConfpackError;
use crate::model::config::{ResourceConfigInfo, Scope};

/// Resolve the scope addressing shared by config and transfer endpoints:
/// the legacy flat business key wins over the environment+pipeline pair.
fn resolve_scope(environment: &str, pipeline: &str, business: &str) -> Scope {
    if !business.trim().is_empty() {
        Scope::business(business)
    } else if !environment.trim().is_empty() {
        Scope::env_pipeline(environment, pipeline)
    } else {
        Scope::empty()
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigForm {
    #[serde(default)]
    pub resource_key: String,
    #[serde(default)]
    pub environment: String,
    #[serde(default)]
    pub pipeline: String,
    #[serde(default)]
    pub business: String,
    pub alias: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub r#type: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub remark: String,
    #[serde(default)]
    pub is_perm: bool,
}

impl ConfigForm {
    pub fn scope(&self) -> Scope {
        resolve_scope(&self.environment, &self.pipeline, &self.business)
    }

    pub fn into_info(self) -> ResourceConfigInfo {
        let scope = self.scope();
        ResourceConfigInfo {
            resource_key: self.resource_key,
            scope,
            alias: self.alias,
            name: self.name,
            r#type: self.r#type,
            content: self.content,
            remark: self.remark,
            is_perm: self.is_perm,
            gmt_create: 0,
            gmt_modified: 0,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeParam {
    #[serde(default)]
    pub environment: String,
    #[serde(default)]
    pub pipeline: String,
    #[serde(default)]
    pub business: String,
}

impl ScopeParam {
    pub fn to_scope(&self) -> Scope {
        resolve_scope(&self.environment, &self.pipeline, &self.business)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSearchParam {
    #[serde(default)]
    pub environment: String,
    #[serde(default)]
    pub pipeline: String,
    #[serde(default)]
    pub business: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_page_no")]
    pub page_no: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

impl ConfigSearchParam {
    pub fn to_scope(&self) -> Scope {
        resolve_scope(&self.environment, &self.pipeline, &self.business)
    }
}

fn default_page_no() -> u64 {
    1
}

fn default_page_size() -> u64 {
    20
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportParam {
    #[serde(default)]
    pub environment: String,
    #[serde(default)]
    pub pipeline: String,
    #[serde(default)]
    pub business: String,
    #[serde(default)]
    pub include_system: bool,
    /// `archive` (default) or `static`
    #[serde(default)]
    pub format: String,
    #[serde(rename = "static", default)]
    pub static_flag: bool,
    /// Additional scope keys for multi-scope static bundles, comma separated
    #[serde(default)]
    pub scopes: String,
}

impl ExportParam {
    pub fn to_scope(&self) -> Scope {
        resolve_scope(&self.environment, &self.pipeline, &self.business)
    }

    pub fn is_static(&self) -> bool {
        self.static_flag || self.format.eq_ignore_ascii_case("static")
    }

    /// All requested scopes: the addressed one plus any `scopes` extras
    pub fn all_scopes(&self) -> Vec<Scope> {
        let mut result = Vec::new();
        let primary = self.to_scope();
        if !primary.is_empty() {
            result.push(primary);
        }
        for key in self.scopes.split(',') {
            let scope = Scope::parse_key(key);
            if !scope.is_empty() && !result.contains(&scope) {
                result.push(scope);
            }
        }
        result
    }

    /// Validated scope list for an export request. At least one scope must
    /// be addressed; more than one only makes sense for static bundles.
    pub fn export_scopes(&self) -> Result<Vec<Scope>, ConfpackError> {
        let scopes = self.all_scopes();
        if scopes.is_empty() {
            return Err(ConfpackError::Validation("no scope addressed".to_string()));
        }
        if !self.is_static() && scopes.len() > 1 {
            return Err(ConfpackError::Validation(
                "multiple scopes are only supported for static bundle exports".to_string(),
            ));
        }
        Ok(scopes)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetUploadParam {
    #[serde(default)]
    pub environment: String,
    #[serde(default)]
    pub pipeline: String,
    #[serde(default)]
    pub business: String,
    #[serde(default)]
    pub remark: String,
}

impl AssetUploadParam {
    pub fn to_scope(&self) -> Scope {
        resolve_scope(&self.environment, &self.pipeline, &self.business)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportParam {
    #[serde(default)]
    pub overwrite: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_resolution_precedence() {
        let p = ScopeParam {
            environment: "prod".to_string(),
            pipeline: "web".to_string(),
            business: String::new(),
        };
        assert_eq!(p.to_scope().key(), "prod:web");

        let p = ScopeParam {
            environment: "prod".to_string(),
            pipeline: "web".to_string(),
            business: "acme".to_string(),
        };
        assert_eq!(p.to_scope().key(), "acme");

        assert!(ScopeParam::default().to_scope().is_empty());
    }

    #[test]
    fn test_export_param_scopes() {
        let p = ExportParam {
            business: "acme".to_string(),
            scopes: "prod:web, acme ,".to_string(),
            ..Default::default()
        };
        let scopes = p.all_scopes();
        assert_eq!(scopes.len(), 2);
        assert_eq!(scopes[0].key(), "acme");
        assert_eq!(scopes[1].key(), "prod:web");
    }

    #[test]
    fn test_export_scopes_validation() {
        // Addressing no scope at all is rejected
        let p = ExportParam::default();
        assert!(matches!(
            p.export_scopes(),
            Err(ConfpackError::Validation(_))
        ));

        // Multiple scopes need the static bundle format
        let p = ExportParam {
            business: "acme".to_string(),
            scopes: "prod:web".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            p.export_scopes(),
            Err(ConfpackError::Validation(_))
        ));

        let p = ExportParam {
            business: "acme".to_string(),
            scopes: "prod:web".to_string(),
            format: "static".to_string(),
            ..Default::default()
        };
        assert_eq!(p.export_scopes().unwrap().len(), 2);

        let p = ExportParam {
            business: "acme".to_string(),
            ..Default::default()
        };
        assert_eq!(p.export_scopes().unwrap().len(), 1);
    }

    #[test]
    fn test_config_form_into_info() {
        let form: ConfigForm = serde_json::from_str(
            r#"{"environment":"prod","pipeline":"web","alias":"title","type":"text","content":"hi","isPerm":true}"#,
        )
        .unwrap();
        let info = form.into_info();
        assert_eq!(info.scope.key(), "prod:web");
        assert_eq!(info.alias, "title");
        assert!(info.is_perm);
    }
}
