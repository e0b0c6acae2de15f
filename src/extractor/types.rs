use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Closed set of inventory categories. Anything unrecognised maps to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum AssetCategory {
    Furniture,
    Vehicles,
    Tools,
    Structure,
    Electronics,
    Safety,
    Equipment,
    Appliances,
    Valuables,
    #[default]
    Other,
}

impl AssetCategory {
    pub const ALL: [AssetCategory; 10] = [
        AssetCategory::Furniture,
        AssetCategory::Vehicles,
        AssetCategory::Tools,
        AssetCategory::Structure,
        AssetCategory::Electronics,
        AssetCategory::Safety,
        AssetCategory::Equipment,
        AssetCategory::Appliances,
        AssetCategory::Valuables,
        AssetCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetCategory::Furniture => "Furniture",
            AssetCategory::Vehicles => "Vehicles",
            AssetCategory::Tools => "Tools",
            AssetCategory::Structure => "Structure",
            AssetCategory::Electronics => "Electronics",
            AssetCategory::Safety => "Safety",
            AssetCategory::Equipment => "Equipment",
            AssetCategory::Appliances => "Appliances",
            AssetCategory::Valuables => "Valuables",
            AssetCategory::Other => "Other",
        }
    }

    /// Case-insensitive match against the category names; falls back to `Other`.
    pub fn parse(label: &str) -> Self {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(label))
            .unwrap_or(AssetCategory::Other)
    }
}

impl From<String> for AssetCategory {
    fn from(label: String) -> Self {
        Self::parse(&label)
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const OTHER_SUB_CATEGORY: &str = "Other";

fn other_sub_category() -> String {
    OTHER_SUB_CATEGORY.to_string()
}

/// `null` and unknown labels both land on `Other`.
fn category_or_other<'de, D: Deserializer<'de>>(deserializer: D) -> Result<AssetCategory, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?
        .map(AssetCategory::from)
        .unwrap_or_default())
}

fn sub_category_or_other<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(other_sub_category))
}

/// One distinct physical object seen in the walkthrough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    #[serde(alias = "asset_type", alias = "Asset Type", alias = "type")]
    pub asset_type: String,
    #[serde(default, alias = "Category", deserialize_with = "category_or_other")]
    pub category: AssetCategory,
    #[serde(
        default = "other_sub_category",
        deserialize_with = "sub_category_or_other",
        alias = "sub_category",
        alias = "subcategory",
        alias = "Sub-Category"
    )]
    pub sub_category: String,
    #[serde(alias = "Color", alias = "colour")]
    pub color: String,
    /// Search query for price lookup.
    #[serde(default, alias = "Description")]
    pub description: String,
}

impl Asset {
    pub fn new(
        asset_type: impl Into<String>,
        category: AssetCategory,
        sub_category: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        let mut asset = Self {
            asset_type: asset_type.into(),
            category,
            sub_category: sub_category.into(),
            color: color.into(),
            description: String::new(),
        };
        asset.ensure_description();
        asset
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn has_specific_sub_category(&self) -> bool {
        !self.sub_category.is_empty() && !self.sub_category.eq_ignore_ascii_case(OTHER_SUB_CATEGORY)
    }

    /// Fills an empty description with "<color> [<subCategory>] <assetType>".
    pub fn ensure_description(&mut self) {
        if !self.description.trim().is_empty() {
            return;
        }
        let mut words: Vec<&str> = Vec::with_capacity(3);
        if !self.color.is_empty() {
            words.push(&self.color);
        }
        if self.has_specific_sub_category()
            && !self
                .asset_type
                .to_lowercase()
                .contains(&self.sub_category.to_lowercase())
        {
            words.push(&self.sub_category);
        }
        words.push(&self.asset_type);
        self.description = words.join(" ");
    }
}
