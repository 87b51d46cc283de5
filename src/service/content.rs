// Content validation and normalization service
// Trims incoming config records, folds type tag synonyms and canonicalizes
// content per type before anything touches the stores

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::error::ConfpackError;
use crate::model::config::{ConfigType, FILE_SERVE_PREFIX, ResourceConfigInfo};
use crate::service::archive::STATIC_ASSETS_PREFIX;
use crate::store::AssetStore;

static COLOR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("Invalid regex pattern")
});

/// Trim all string fields, normalize the type tag and validate/canonicalize
/// content for the resulting type.
///
/// The only lookup performed is resolving `asset://` image references; a
/// missing asset is tolerated and rewritten to a path synthesized from the
/// bare id.
pub async fn normalize(
    info: &mut ResourceConfigInfo,
    assets: &dyn AssetStore,
) -> anyhow::Result<()> {
    info.alias = info.alias.trim().to_string();
    info.name = info.name.trim().to_string();
    info.remark = info.remark.trim().to_string();
    info.content = info.content.trim().to_string();

    let config_type = ConfigType::from_tag(&info.r#type);
    info.r#type = config_type.as_str().to_string();

    match config_type {
        ConfigType::Image => normalize_image(info, assets).await,
        ConfigType::Text => {
            if info.content.is_empty() {
                return Err(ConfpackError::Validation(format!(
                    "text config '{}' has empty content",
                    info.alias
                ))
                .into());
            }
            Ok(())
        }
        ConfigType::Color => {
            info.content = normalize_color(&info.content).ok_or_else(|| {
                ConfpackError::Validation(format!(
                    "config '{}' has invalid color '{}'",
                    info.alias, info.content
                ))
            })?;
            Ok(())
        }
        ConfigType::Config => {
            info.content = canonicalize_json_object(&info.content).map_err(|e| {
                ConfpackError::Validation(format!("config '{}': {}", info.alias, e))
            })?;
            Ok(())
        }
    }
}

async fn normalize_image(
    info: &mut ResourceConfigInfo,
    assets: &dyn AssetStore,
) -> anyhow::Result<()> {
    if info.content.is_empty() {
        return Err(ConfpackError::Validation(format!(
            "image config '{}' has empty content",
            info.alias
        ))
        .into());
    }

    if let Some(file_id) = info.content.strip_prefix("asset://") {
        match assets.find_by_file_id(file_id).await? {
            Some(asset) if !asset.url.is_empty() => info.content = asset.url,
            Some(_) => info.content = format!("{}{}", FILE_SERVE_PREFIX, file_id),
            None => {
                // Deliberately lenient: the reference may point at an asset
                // restored later, so synthesize the serving path from the id
                warn!(
                    alias = %info.alias,
                    file_id = %file_id,
                    "image asset not found, falling back to synthesized path"
                );
                info.content = format!("{}{}", FILE_SERVE_PREFIX, file_id);
            }
        }
        return Ok(());
    }

    // Static bundle exports carry relative asset paths; fold them back to
    // the serving path on the way in
    if let Some(rest) = info.content.strip_prefix(STATIC_ASSETS_PREFIX)
        && let Some((file_id, _)) = rest.split_once('/')
        && !file_id.is_empty()
    {
        info.content = format!("{}{}", FILE_SERVE_PREFIX, file_id);
        return Ok(());
    }

    if info.content.starts_with("http://")
        || info.content.starts_with("https://")
        || info.content.starts_with(FILE_SERVE_PREFIX)
    {
        return Ok(());
    }

    Err(ConfpackError::Validation(format!(
        "image config '{}' has unrecognized content '{}'",
        info.alias, info.content
    ))
    .into())
}

/// Expand `#RGB` to `#RRGGBB` and uppercase; `None` for anything that is not
/// a hex color.
pub fn normalize_color(content: &str) -> Option<String> {
    let content = content.trim();
    if !COLOR_PATTERN.is_match(content) {
        return None;
    }
    let digits = &content[1..];
    let expanded: String = if digits.len() == 3 {
        digits.chars().flat_map(|c| [c, c]).collect()
    } else {
        digits.to_string()
    };
    Some(format!("#{}", expanded.to_uppercase()))
}

/// Parse content as a JSON object and re-serialize it. Arrays, scalars, null
/// and the empty object are rejected.
pub fn canonicalize_json_object(content: &str) -> anyhow::Result<String> {
    let value: serde_json::Value = serde_json::from_str(content)
        .map_err(|e| anyhow::anyhow!("content is not valid JSON: {}", e))?;
    let object = value
        .as_object()
        .ok_or_else(|| anyhow::anyhow!("content is not a JSON object"))?;
    if object.is_empty() {
        anyhow::bail!("content is an empty JSON object");
    }
    Ok(serde_json::to_string(&value)?)
}
