// Static bundle builder
// Produces the denormalized nested document served as static/config.json:
// scope key -> alias -> entry, with all asset references rewritten to
// bundle-relative paths. Pure; the archive codec does the packaging I/O.

use std::collections::HashMap;

use serde_json::{Map, Value, json};

use crate::model::config::{
    BUSINESS_SELECT_ALIAS, ResourceConfigInfo, Scope, SYSTEM_SCOPE_KEY,
};
use crate::model::transfer::BundleEntry;
use crate::service::reference;

fn entry_value(info: &ResourceConfigInfo, replacements: &HashMap<String, String>) -> Value {
    let rewritten = reference::rewrite_content(&info.content, &info.r#type, replacements);
    // Structured content is emitted as parsed JSON when it parses cleanly,
    // as a raw string otherwise
    let content = if info.r#type == "config" {
        serde_json::from_str::<Value>(&rewritten).unwrap_or(Value::String(rewritten))
    } else {
        Value::String(rewritten)
    };

    serde_json::to_value(BundleEntry {
        resource_key: info.resource_key.clone(),
        name: info.name.clone(),
        r#type: info.r#type.clone(),
        remark: info.remark.clone(),
        is_perm: info.is_perm,
        content,
    })
    .unwrap_or(Value::Null)
}

fn scope_object(
    configs: &[ResourceConfigInfo],
    replacements: &HashMap<String, String>,
) -> Value {
    let mut entries = Map::new();
    for info in configs {
        entries.insert(info.alias.clone(), entry_value(info, replacements));
    }
    Value::Object(entries)
}

/// Build the nested bundle document for the given scopes, in request order.
/// The reserved `system` key is always present, even when empty.
pub fn build(
    scopes: &[(Scope, Vec<ResourceConfigInfo>)],
    system_configs: &[ResourceConfigInfo],
    include_system: bool,
    replacements: &HashMap<String, String>,
) -> Value {
    let mut document = Map::new();

    let business_keys: Vec<Value> = scopes
        .iter()
        .map(|(scope, _)| Value::String(scope.key()))
        .collect();
    document.insert("business_keys".to_string(), Value::Array(business_keys));
    document.insert("include_system".to_string(), json!(include_system));

    let business_select = scopes
        .iter()
        .flat_map(|(_, configs)| configs.iter())
        .find(|c| c.alias == BUSINESS_SELECT_ALIAS)
        .map(|c| c.content.clone())
        .unwrap_or_default();
    document.insert("business_select".to_string(), Value::String(business_select));

    document.insert(
        SYSTEM_SCOPE_KEY.to_string(),
        scope_object(system_configs, replacements),
    );

    for (scope, configs) in scopes {
        let key = scope.key();
        if key == SYSTEM_SCOPE_KEY {
            continue;
        }
        document.insert(key, scope_object(configs, replacements));
    }

    Value::Object(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(scope: Scope, alias: &str, ty: &str, content: &str) -> ResourceConfigInfo {
        ResourceConfigInfo {
            resource_key: format!("rk-{}", alias),
            scope,
            alias: alias.to_string(),
            name: alias.to_string(),
            r#type: ty.to_string(),
            content: content.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_system_key_always_present() {
        let document = build(&[], &[], false, &HashMap::new());
        assert!(document["system"].is_object());
        assert_eq!(document["include_system"], false);
        assert_eq!(document["business_select"], "");
    }

    #[test]
    fn test_entries_grouped_by_scope_key() {
        let scope = Scope::env_pipeline("prod", "web");
        let configs = vec![config(scope.clone(), "title", "text", "hello")];
        let document = build(&[(scope, configs)], &[], false, &HashMap::new());

        assert_eq!(document["business_keys"][0], "prod:web");
        let entry = &document["prod:web"]["title"];
        assert_eq!(entry["resource_key"], "rk-title");
        assert_eq!(entry["type"], "text");
        assert_eq!(entry["content"], "hello");
        assert_eq!(entry["is_perm"], false);
    }

    #[test]
    fn test_structured_content_emitted_parsed() {
        let scope = Scope::business("acme");
        let configs = vec![
            config(scope.clone(), "theme", "config", r##"{"primary":"#FFAA00"}"##),
            config(scope.clone(), "broken", "config", "not json"),
        ];
        let document = build(&[(scope, configs)], &[], false, &HashMap::new());

        assert_eq!(document["acme"]["theme"]["content"]["primary"], "#FFAA00");
        assert_eq!(document["acme"]["broken"]["content"], "not json");
    }

    #[test]
    fn test_references_rewritten() {
        let scope = Scope::business("acme");
        let configs = vec![config(scope.clone(), "logo", "image", "asset://abc")];
        let mut replacements = HashMap::new();
        replacements.insert("abc".to_string(), "static/assets/abc/logo.png".to_string());

        let document = build(&[(scope, configs)], &[], false, &replacements);
        assert_eq!(
            document["acme"]["logo"]["content"],
            "static/assets/abc/logo.png"
        );
    }

    #[test]
    fn test_business_select_promoted() {
        let scope = Scope::business("acme");
        let configs = vec![config(scope.clone(), "business_select", "text", "acme")];
        let document = build(&[(scope, configs)], &[], true, &HashMap::new());
        assert_eq!(document["business_select"], "acme");
        assert_eq!(document["include_system"], true);
    }

    #[test]
    fn test_system_configs_land_under_system_key() {
        let system = vec![config(Scope::system(), "banner", "text", "hi")];
        let document = build(&[], &system, true, &HashMap::new());
        assert_eq!(document["system"]["banner"]["content"], "hi");
    }
}
