// Asset reference resolver
// Recognizes and rewrites asset ids embedded in config content across the
// three addressing schemes: asset://<id>, the resolved serving path and the
// static bundle path. Structured (JSON) content is walked down to its string
// leaves.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::model::config::{ConfigType, ResourceConfigInfo, Scope};

static ASSET_SCHEME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"asset://([A-Za-z0-9_\-]+)").expect("Invalid regex pattern")
});

static SERVE_PATH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/api/v1/resource/files/([A-Za-z0-9_\-]+)").expect("Invalid regex pattern")
});

static STATIC_PATH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"static/assets/([A-Za-z0-9_\-]+)/[^\s"']*"#).expect("Invalid regex pattern")
});

/// Collect asset ids referenced in a single text, in order of occurrence
fn collect_from_text(text: &str, seen: &mut HashSet<String>, out: &mut Vec<String>) {
    let mut matches: Vec<(usize, String)> = Vec::new();
    for pattern in [
        &*ASSET_SCHEME_PATTERN,
        &*SERVE_PATH_PATTERN,
        &*STATIC_PATH_PATTERN,
    ] {
        for caps in pattern.captures_iter(text) {
            let whole = caps.get(0).unwrap();
            matches.push((whole.start(), caps[1].to_string()));
        }
    }
    matches.sort_by_key(|(start, _)| *start);
    for (_, id) in matches {
        if seen.insert(id.clone()) {
            out.push(id);
        }
    }
}

/// Apply `f` to every string leaf of a JSON value
fn walk_strings(value: &serde_json::Value, f: &mut dyn FnMut(&str)) {
    match value {
        serde_json::Value::String(s) => f(s),
        serde_json::Value::Array(items) => {
            for item in items {
                walk_strings(item, f);
            }
        }
        serde_json::Value::Object(map) => {
            for item in map.values() {
                walk_strings(item, f);
            }
        }
        _ => {}
    }
}

/// Rewrite every string leaf of a JSON value in place
fn rewrite_strings(value: &mut serde_json::Value, f: &dyn Fn(&str) -> String) {
    match value {
        serde_json::Value::String(s) => *s = f(s),
        serde_json::Value::Array(items) => {
            for item in items {
                rewrite_strings(item, f);
            }
        }
        serde_json::Value::Object(map) => {
            for item in map.values_mut() {
                rewrite_strings(item, f);
            }
        }
        _ => {}
    }
}

fn collect_from_config(
    info: &ResourceConfigInfo,
    seen: &mut HashSet<String>,
    out: &mut Vec<String>,
) {
    if ConfigType::from_tag(&info.r#type) == ConfigType::Config {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&info.content) {
            walk_strings(&value, &mut |leaf| collect_from_text(leaf, seen, out));
            return;
        }
    }
    collect_from_text(&info.content, seen, out);
}

/// Extract every distinct asset id referenced by the given configs, in order
/// of first occurrence
pub fn extract(configs: &[ResourceConfigInfo]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for info in configs {
        collect_from_config(info, &mut seen, &mut out);
    }
    out
}

fn replace_ids(text: &str, pattern: &Regex, replacements: &HashMap<String, String>) -> String {
    pattern
        .replace_all(text, |caps: &regex::Captures| {
            match replacements.get(&caps[1]) {
                Some(replacement) => replacement.clone(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Substitute every address form of each mapped id with its replacement.
/// Unmapped ids are left untouched. The static form is rewritten first so
/// replacement text produced by the other two passes is not re-matched.
pub fn rewrite_text(text: &str, replacements: &HashMap<String, String>) -> String {
    let text = replace_ids(text, &STATIC_PATH_PATTERN, replacements);
    let text = replace_ids(&text, &SERVE_PATH_PATTERN, replacements);
    replace_ids(&text, &ASSET_SCHEME_PATTERN, replacements)
}

/// Rewrite a config's content. `config`-typed content that parses as JSON is
/// rewritten leaf by leaf and re-serialized; everything else as raw text.
pub fn rewrite_content(
    content: &str,
    config_type: &str,
    replacements: &HashMap<String, String>,
) -> String {
    if ConfigType::from_tag(config_type) == ConfigType::Config {
        if let Ok(mut value) = serde_json::from_str::<serde_json::Value>(content) {
            rewrite_strings(&mut value, &|leaf| rewrite_text(leaf, replacements));
            if let Ok(serialized) = serde_json::to_string(&value) {
                return serialized;
            }
        }
    }
    rewrite_text(content, replacements)
}

/// Best-effort inference of the scope owning an asset restored from an
/// archive that carries no per-file scope metadata: the scope of the first
/// imported config referencing the id wins; a sole imported config is used
/// as a last resort; otherwise the scope stays empty. Known limitation:
/// assets referenced from multiple scopes, or from none, may come back with
/// the wrong or no owner.
pub fn infer_scope(file_id: &str, configs: &[ResourceConfigInfo]) -> Scope {
    for info in configs {
        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        collect_from_config(info, &mut seen, &mut ids);
        if ids.iter().any(|id| id == file_id) {
            return info.scope.clone();
        }
    }
    if configs.len() == 1 {
        return configs[0].scope.clone();
    }
    Scope::empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_config(scope: Scope, content: &str) -> ResourceConfigInfo {
        ResourceConfigInfo {
            scope,
            r#type: "text".to_string(),
            content: content.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_extract_covers_all_three_forms_in_order() {
        let configs = vec![text_config(
            Scope::business("acme"),
            "a asset://abc123 b /api/v1/resource/files/def456 c static/assets/ghi789/pic.png",
        )];
        assert_eq!(extract(&configs), vec!["abc123", "def456", "ghi789"]);
    }

    #[test]
    fn test_extract_deduplicates_across_forms() {
        let configs = vec![text_config(
            Scope::business("acme"),
            "asset://abc123 and /api/v1/resource/files/abc123 and static/assets/abc123/x.png",
        )];
        assert_eq!(extract(&configs), vec!["abc123"]);
    }

    #[test]
    fn test_extract_walks_nested_json() {
        let configs = vec![ResourceConfigInfo {
            r#type: "config".to_string(),
            content: r#"{"banner":{"img":"asset://one"},"items":[{"bg":"/api/v1/resource/files/two"},"static/assets/three/a.png"]}"#
                .to_string(),
            ..Default::default()
        }];
        let ids = extract(&configs);
        assert_eq!(ids.len(), 3);
        assert!(ids.contains(&"one".to_string()));
        assert!(ids.contains(&"two".to_string()));
        assert!(ids.contains(&"three".to_string()));
    }

    #[test]
    fn test_rewrite_all_forms() {
        let mut replacements = HashMap::new();
        replacements.insert("abc".to_string(), "static/assets/abc/logo.png".to_string());

        assert_eq!(
            rewrite_text("asset://abc", &replacements),
            "static/assets/abc/logo.png"
        );
        assert_eq!(
            rewrite_text("/api/v1/resource/files/abc", &replacements),
            "static/assets/abc/logo.png"
        );
        assert_eq!(
            rewrite_text("x static/assets/abc/old.png y", &replacements),
            "x static/assets/abc/logo.png y"
        );
    }

    #[test]
    fn test_rewrite_leaves_unmapped_ids_untouched() {
        let mut replacements = HashMap::new();
        replacements.insert("abc".to_string(), "/new/abc".to_string());
        assert_eq!(
            rewrite_text("asset://abc asset://other", &replacements),
            "/new/abc asset://other"
        );
    }

    #[test]
    fn test_rewrite_structured_content() {
        let mut replacements = HashMap::new();
        replacements.insert("one".to_string(), "static/assets/one/a.png".to_string());
        let rewritten = rewrite_content(
            r#"{"img":"asset://one","n":1}"#,
            "config",
            &replacements,
        );
        let value: serde_json::Value = serde_json::from_str(&rewritten).unwrap();
        assert_eq!(value["img"], "static/assets/one/a.png");
        assert_eq!(value["n"], 1);
    }

    #[test]
    fn test_infer_scope_from_reference() {
        let prod = Scope::env_pipeline("prod", "web");
        let configs = vec![
            text_config(Scope::business("other"), "no refs here"),
            text_config(prod.clone(), "asset://abc123"),
        ];
        assert_eq!(infer_scope("abc123", &configs), prod);
    }

    #[test]
    fn test_infer_scope_sole_config_fallback() {
        let scope = Scope::business("acme");
        let configs = vec![text_config(scope.clone(), "nothing referenced")];
        assert_eq!(infer_scope("xyz", &configs), scope);
    }

    #[test]
    fn test_infer_scope_gives_up() {
        let configs = vec![
            text_config(Scope::business("a"), "x"),
            text_config(Scope::business("b"), "y"),
        ];
        assert!(infer_scope("xyz", &configs).is_empty());
    }
}
