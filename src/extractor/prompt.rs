use crate::extractor::types::AssetCategory;

/// Instruction sent alongside the frames. Fixes the response contract: a bare
/// JSON array whose elements carry the `Asset` keys.
pub fn asset_inventory_prompt() -> String {
    let categories = AssetCategory::ALL
        .iter()
        .map(AssetCategory::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "\
You are analyzing still frames sampled from a walkthrough video of a home or property \
for asset management purposes. Your task is to:
1. Identify every distinct physical asset visible in the frames that someone would log in \
a home inventory system: furniture, electronics, appliances, decor, tools and other valuables.
2. For each asset produce a JSON object with exactly these keys:
   - \"assetType\": short label, e.g. Sofa, TV, Lamp, Stovetop, Washing Machine, Painting
   - \"category\": one of {categories}. Use \"Other\" if none fits.
   - \"subCategory\": a more specific grouping within the category, or \"Other\" if no match is found.
   - \"color\": dominant color(s).
   - \"description\": a concise product description suitable as a shopping search query \
(brand, material, size or style when visible).
3. Ensure no duplicate items. The frames overlap: if the same physical object is visible in \
several frames, output it once and enrich that single entry with details from every frame.

Respond only with a JSON array containing the consolidated list of unique assets. \
Respond with [] if no assets are visible."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_lists_every_category_and_key() {
        let prompt = asset_inventory_prompt();
        for category in AssetCategory::ALL {
            assert!(prompt.contains(category.as_str()));
        }
        for key in ["assetType", "category", "subCategory", "color", "description"] {
            assert!(prompt.contains(&format!("\"{key}\"")));
        }
    }
}
