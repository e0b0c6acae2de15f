use std::collections::BTreeSet;

use crate::extractor::types::{Asset, AssetCategory};

/// Token overlap at or above which two labels are taken to name the same thing.
const SIMILARITY_THRESHOLD: f64 = 0.5;

/// Normalized identity of an asset: what it is, how it is grouped, what color it is.
#[derive(Debug, Clone)]
struct IdentityKey {
    kind: BTreeSet<String>,
    sub_category: Option<String>,
    color: BTreeSet<String>,
    category: AssetCategory,
}

impl IdentityKey {
    fn of(asset: &Asset) -> Self {
        Self {
            kind: tokens(&asset.asset_type),
            sub_category: asset
                .has_specific_sub_category()
                .then(|| asset.sub_category.trim().to_lowercase()),
            color: tokens(&asset.color),
            category: asset.category,
        }
    }

    /// Same physical object: overlapping type words, compatible colors, and no
    /// conflicting specific category or subCategory.
    fn matches(&self, other: &IdentityKey) -> bool {
        if jaccard(&self.kind, &other.kind) < SIMILARITY_THRESHOLD {
            return false;
        }
        if !self.color.is_empty()
            && !other.color.is_empty()
            && jaccard(&self.color, &other.color) < SIMILARITY_THRESHOLD
        {
            return false;
        }
        if let (Some(a), Some(b)) = (&self.sub_category, &other.sub_category) {
            if a != b {
                return false;
            }
        }
        self.category == other.category
            || self.category == AssetCategory::Other
            || other.category == AssetCategory::Other
    }
}

/// Merges records that describe the same physical object.
///
/// The first-seen record keeps its position and its populated fields; later
/// sightings only fill in what it lacks (a specific category or subCategory,
/// a color) or extend a shorter description.
pub fn consolidate(assets: Vec<Asset>) -> Vec<Asset> {
    let mut merged: Vec<(IdentityKey, Asset)> = Vec::with_capacity(assets.len());

    for asset in assets {
        let key = IdentityKey::of(&asset);
        match merged.iter_mut().find(|(existing, _)| existing.matches(&key)) {
            Some((existing_key, first_seen)) => {
                tracing::debug!(
                    kept = %first_seen.asset_type,
                    merged = %asset.asset_type,
                    "consolidating duplicate sighting"
                );
                absorb(first_seen, asset);
                *existing_key = IdentityKey::of(first_seen);
            }
            None => merged.push((key, asset)),
        }
    }

    merged.into_iter().map(|(_, asset)| asset).collect()
}

fn absorb(first_seen: &mut Asset, later: Asset) {
    if first_seen.category == AssetCategory::Other {
        first_seen.category = later.category;
    }
    if !first_seen.has_specific_sub_category() && later.has_specific_sub_category() {
        first_seen.sub_category = later.sub_category;
    }
    if first_seen.color.is_empty() {
        first_seen.color = later.color;
    }
    if later.description.len() > first_seen.description.len() {
        first_seen.description = later.description;
    }
}

fn tokens(label: &str) -> BTreeSet<String> {
    label
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| singular(&w.to_lowercase()))
        .collect()
}

fn singular(word: &str) -> String {
    if word.len() > 3 && word.ends_with('s') && !word.ends_with("ss") {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}

fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let shared = a.intersection(b).count() as f64;
    let total = a.union(b).count() as f64;
    shared / total
}
