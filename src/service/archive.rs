// Archive codec
// Reads and writes the zip container forms: transfer archives carry a
// configs.json manifest plus a files/<id>/<name> byte tree, static bundles a
// static/config.json document plus a static/assets/<id>/<name> byte tree.
// Reading accepts either layout and normalizes to one record list.

use std::io::{Cursor, Read, Write};

use zip::{ZipArchive, ZipWriter, write::SimpleFileOptions};

use crate::error::ConfpackError;
use crate::model::config::Scope;
use crate::model::transfer::{
    ArchiveConfigItem, BUNDLE_LEGACY_CONFIGS_KEY, BUNDLE_RESERVED_KEYS,
};

pub const MANIFEST_ENTRY: &str = "configs.json";
pub const FILES_PREFIX: &str = "files/";
pub const STATIC_MANIFEST_ENTRY: &str = "static/config.json";
pub const STATIC_ASSETS_PREFIX: &str = "static/assets/";

/// One asset byte entry of an archive
#[derive(Clone, Debug)]
pub struct ArchiveFile {
    pub file_id: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Normalized result of reading any archive form
#[derive(Debug, Default)]
pub struct ParsedArchive {
    pub items: Vec<ArchiveConfigItem>,
    pub files: Vec<ArchiveFile>,
}

fn zip_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o644)
}

/// Create a transfer archive: manifest plus one entry per referenced asset
pub fn write_archive(
    items: &[ArchiveConfigItem],
    files: &[ArchiveFile],
) -> anyhow::Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    let mut zip = ZipWriter::new(&mut buffer);
    let options = zip_options();

    zip.start_file(MANIFEST_ENTRY, options)?;
    zip.write_all(&serde_json::to_vec_pretty(items)?)?;

    for file in files {
        let path = format!("{}{}/{}", FILES_PREFIX, file.file_id, file.file_name);
        zip.start_file(&path, options)?;
        zip.write_all(&file.bytes)?;
    }

    zip.finish()?;
    Ok(buffer.into_inner())
}

/// Create a static bundle: nested document plus the asset byte tree
pub fn write_static_bundle(
    document: &serde_json::Value,
    files: &[ArchiveFile],
) -> anyhow::Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    let mut zip = ZipWriter::new(&mut buffer);
    let options = zip_options();

    zip.start_file(STATIC_MANIFEST_ENTRY, options)?;
    zip.write_all(&serde_json::to_vec_pretty(document)?)?;

    for file in files {
        let path = format!("{}{}/{}", STATIC_ASSETS_PREFIX, file.file_id, file.file_name);
        zip.start_file(&path, options)?;
        zip.write_all(&file.bytes)?;
    }

    zip.finish()?;
    Ok(buffer.into_inner())
}

/// Split a zip entry name of the form `<prefix><id>/<name>`
fn split_file_entry(name: &str, prefix: &str) -> Option<(String, String)> {
    let rest = name.strip_prefix(prefix)?;
    let (file_id, file_name) = rest.split_once('/')?;
    if file_id.is_empty() || file_name.is_empty() {
        return None;
    }
    Some((file_id.to_string(), file_name.to_string()))
}

/// Parse either archive layout. Unknown entries are ignored; a missing or
/// undecodable manifest aborts the whole read.
pub fn read_archive(data: &[u8]) -> anyhow::Result<ParsedArchive> {
    let cursor = Cursor::new(data);
    let mut archive = ZipArchive::new(cursor)
        .map_err(|e| ConfpackError::ArchiveFormat(format!("not a zip archive: {}", e)))?;

    let mut flat_manifest: Option<Vec<u8>> = None;
    let mut static_manifest: Option<Vec<u8>> = None;
    let mut files: Vec<ArchiveFile> = Vec::new();

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }
        let name = file.name().to_string();

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;

        if name == MANIFEST_ENTRY {
            flat_manifest = Some(bytes);
        } else if name == STATIC_MANIFEST_ENTRY {
            static_manifest = Some(bytes);
        } else if let Some((file_id, file_name)) = split_file_entry(&name, FILES_PREFIX)
            .or_else(|| split_file_entry(&name, STATIC_ASSETS_PREFIX))
        {
            files.push(ArchiveFile {
                file_id,
                file_name,
                bytes,
            });
        }
        // Anything else is an unknown entry and skipped
    }

    let items = if let Some(bytes) = flat_manifest {
        serde_json::from_slice::<Vec<ArchiveConfigItem>>(&bytes).map_err(|e| {
            ConfpackError::ArchiveFormat(format!("undecodable {}: {}", MANIFEST_ENTRY, e))
        })?
    } else if let Some(bytes) = static_manifest {
        let value: serde_json::Value = serde_json::from_slice(&bytes).map_err(|e| {
            ConfpackError::ArchiveFormat(format!("undecodable {}: {}", STATIC_MANIFEST_ENTRY, e))
        })?;
        parse_static_manifest(&value)?
    } else {
        return Err(ConfpackError::ArchiveFormat(format!(
            "archive has neither {} nor {}",
            MANIFEST_ENTRY, STATIC_MANIFEST_ENTRY
        ))
        .into());
    };

    Ok(ParsedArchive { items, files })
}

fn str_field(entry: &serde_json::Value, field: &str) -> String {
    entry[field].as_str().unwrap_or_default().to_string()
}

fn content_field(entry: &serde_json::Value) -> String {
    match &entry["content"] {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Normalize a static bundle document into the flat record list. Both the
/// nested-by-scope shape and the legacy flat `configs` array are accepted.
pub fn parse_static_manifest(value: &serde_json::Value) -> anyhow::Result<Vec<ArchiveConfigItem>> {
    let document = value.as_object().ok_or_else(|| {
        ConfpackError::ArchiveFormat("static manifest is not a JSON object".to_string())
    })?;

    let mut items: Vec<ArchiveConfigItem> = Vec::new();

    if let Some(configs) = document
        .get(BUNDLE_LEGACY_CONFIGS_KEY)
        .and_then(|v| v.as_array())
    {
        // Legacy flat shape: records share a default scope taken from the
        // document's business_select unless they carry their own
        let default_scope = document
            .get("business_select")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(Scope::business)
            .unwrap_or_else(Scope::empty);

        for entry in configs {
            let scope = match entry["scope"].as_str() {
                Some(key) if !key.is_empty() => Scope::parse_key(key),
                _ => default_scope.clone(),
            };
            items.push(ArchiveConfigItem {
                resource_key: str_field(entry, "resource_key"),
                alias: str_field(entry, "alias"),
                name: str_field(entry, "name"),
                scope,
                content: content_field(entry),
                r#type: str_field(entry, "type"),
                remark: str_field(entry, "remark"),
                is_perm: entry["is_perm"].as_bool().unwrap_or(false),
            });
        }
        return Ok(items);
    }

    for (key, scoped) in document {
        if BUNDLE_RESERVED_KEYS.contains(&key.as_str()) {
            continue;
        }
        let Some(entries) = scoped.as_object() else {
            continue;
        };
        let scope = Scope::parse_key(key);
        for (alias, entry) in entries {
            items.push(ArchiveConfigItem {
                resource_key: str_field(entry, "resource_key"),
                alias: alias.clone(),
                name: str_field(entry, "name"),
                scope: scope.clone(),
                content: content_field(entry),
                r#type: str_field(entry, "type"),
                remark: str_field(entry, "remark"),
                is_perm: entry["is_perm"].as_bool().unwrap_or(false),
            });
        }
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(alias: &str, content: &str) -> ArchiveConfigItem {
        ArchiveConfigItem {
            alias: alias.to_string(),
            name: alias.to_string(),
            scope: Scope::env_pipeline("prod", "web"),
            content: content.to_string(),
            r#type: "text".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_archive_round_trip() {
        let items = vec![item("title", "hello")];
        let files = vec![ArchiveFile {
            file_id: "abc".to_string(),
            file_name: "logo.png".to_string(),
            bytes: b"PNGDATA".to_vec(),
        }];

        let data = write_archive(&items, &files).unwrap();
        let parsed = read_archive(&data).unwrap();

        assert_eq!(parsed.items.len(), 1);
        assert_eq!(parsed.items[0].alias, "title");
        assert_eq!(parsed.items[0].scope.key(), "prod:web");
        assert_eq!(parsed.files.len(), 1);
        assert_eq!(parsed.files[0].file_id, "abc");
        assert_eq!(parsed.files[0].file_name, "logo.png");
        assert_eq!(parsed.files[0].bytes, b"PNGDATA");
    }

    #[test]
    fn test_unknown_entries_ignored() {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut zip = ZipWriter::new(&mut buffer);
            let options = SimpleFileOptions::default();
            zip.start_file(MANIFEST_ENTRY, options).unwrap();
            zip.write_all(b"[]").unwrap();
            zip.start_file("README.txt", options).unwrap();
            zip.write_all(b"junk").unwrap();
            zip.start_file("files/badentry", options).unwrap();
            zip.write_all(b"junk").unwrap();
            zip.finish().unwrap();
        }

        let parsed = read_archive(&buffer.into_inner()).unwrap();
        assert!(parsed.items.is_empty());
        assert!(parsed.files.is_empty());
    }

    #[test]
    fn test_missing_manifest_is_error() {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut zip = ZipWriter::new(&mut buffer);
            let options = SimpleFileOptions::default();
            zip.start_file("files/abc/x.png", options).unwrap();
            zip.write_all(b"data").unwrap();
            zip.finish().unwrap();
        }

        let err = read_archive(&buffer.into_inner()).unwrap_err();
        assert!(err.downcast_ref::<ConfpackError>().is_some());
    }

    #[test]
    fn test_garbage_bytes_is_error() {
        assert!(read_archive(b"definitely not a zip").is_err());
    }

    #[test]
    fn test_static_bundle_round_trip() {
        let document = serde_json::json!({
            "business_keys": ["prod:web"],
            "include_system": true,
            "business_select": "",
            "system": {},
            "prod:web": {
                "logo": {
                    "resource_key": "rk-1",
                    "name": "Logo",
                    "type": "image",
                    "remark": "",
                    "is_perm": false,
                    "content": "static/assets/abc/logo.png"
                },
                "theme": {
                    "resource_key": "rk-2",
                    "name": "Theme",
                    "type": "config",
                    "remark": "",
                    "is_perm": false,
                    "content": {"primary": "#FFAA00"}
                }
            }
        });
        let files = vec![ArchiveFile {
            file_id: "abc".to_string(),
            file_name: "logo.png".to_string(),
            bytes: b"PNGDATA".to_vec(),
        }];

        let data = write_static_bundle(&document, &files).unwrap();
        let parsed = read_archive(&data).unwrap();

        assert_eq!(parsed.items.len(), 2);
        let logo = parsed.items.iter().find(|i| i.alias == "logo").unwrap();
        assert_eq!(logo.scope.key(), "prod:web");
        assert_eq!(logo.content, "static/assets/abc/logo.png");
        let theme = parsed.items.iter().find(|i| i.alias == "theme").unwrap();
        // Structured content comes back as serialized JSON text
        let value: serde_json::Value = serde_json::from_str(&theme.content).unwrap();
        assert_eq!(value["primary"], "#FFAA00");
        assert_eq!(parsed.files.len(), 1);
    }

    #[test]
    fn test_legacy_flat_configs_shape() {
        let document = serde_json::json!({
            "business_select": "acme",
            "configs": [
                {"alias": "title", "name": "Title", "type": "text", "content": "hello"},
                {"alias": "other", "type": "text", "content": "x", "scope": "prod:web"}
            ]
        });
        let items = parse_static_manifest(&document).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].scope.key(), "acme");
        assert_eq!(items[1].scope.key(), "prod:web");
    }
}
