use std::sync::OnceLock;

use regex::Regex;

use crate::errors::{AssetScanError, AssetScanResult};
use crate::extractor::types::{Asset, OTHER_SUB_CATEGORY};

static FENCE: OnceLock<Regex> = OnceLock::new();

fn fence() -> &'static Regex {
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").expect("fence pattern compiles")
    })
}

/// Parses the recognizer's text response into asset records.
///
/// Accepts a bare JSON array, an array wrapped in a Markdown code fence or
/// surrounded by prose, or an object holding the array under a single key.
/// Records are trimmed; descriptions are left empty when absent.
pub fn parse_assets(content: &str) -> AssetScanResult<Vec<Asset>> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AssetScanError::EmptyCapabilityResponse(
            "recognizer returned no content".into(),
        ));
    }

    let json = extract_json(content)?;
    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| AssetScanError::MalformedResponse(format!("invalid JSON: {e}")))?;

    let array = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(map) => {
            let mut arrays = map.into_iter().filter_map(|(_, v)| match v {
                serde_json::Value::Array(items) => Some(items),
                _ => None,
            });
            match (arrays.next(), arrays.next()) {
                (Some(items), None) => items,
                _ => {
                    return Err(AssetScanError::MalformedResponse(
                        "expected a JSON array of assets".into(),
                    ))
                }
            }
        }
        other => {
            return Err(AssetScanError::MalformedResponse(format!(
                "expected a JSON array of assets, got {}",
                json_kind(&other)
            )))
        }
    };

    array
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let asset: Asset = serde_json::from_value(item)
                .map_err(|e| AssetScanError::MalformedResponse(format!("asset #{i}: {e}")))?;
            normalize(asset)
                .map_err(|field| AssetScanError::MalformedResponse(format!("asset #{i}: empty {field}")))
        })
        .collect()
}

/// Strips a code fence or surrounding prose, returning the JSON text.
fn extract_json(content: &str) -> AssetScanResult<&str> {
    if content.starts_with('[') || content.starts_with('{') {
        return Ok(content);
    }

    if let Some(inner) = fence().captures(content).and_then(|c| c.get(1)) {
        return Ok(inner.as_str());
    }

    match (content.find('['), content.rfind(']')) {
        (Some(start), Some(end)) if start < end => Ok(&content[start..=end]),
        _ => Err(AssetScanError::MalformedResponse(
            "no JSON array found in response".into(),
        )),
    }
}

/// Trims every field. Returns the name of the first required field left blank.
fn normalize(mut asset: Asset) -> Result<Asset, &'static str> {
    asset.asset_type = asset.asset_type.trim().to_string();
    if asset.asset_type.is_empty() {
        return Err("assetType");
    }
    asset.color = asset.color.trim().to_string();
    if asset.color.is_empty() {
        return Err("color");
    }
    asset.sub_category = asset.sub_category.trim().to_string();
    if asset.sub_category.is_empty() {
        asset.sub_category = OTHER_SUB_CATEGORY.to_string();
    }
    asset.description = asset.description.trim().to_string();
    Ok(asset)
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
