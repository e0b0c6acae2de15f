use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::errors::AssetScanResult;

/// Product-search capability queried once per asset.
#[async_trait]
pub trait ProductSearch: Send + Sync {
    /// Provider label recorded as `priceSource`.
    fn name(&self) -> &str;

    /// Runs one query. "No results" is `Ok` with an empty result set;
    /// `Err` means the backend itself failed.
    async fn search(&self, query: &str) -> AssetScanResult<SearchResponse>;
}

/// Provider payloads are decoded leniently: a field of the wrong type reads
/// as absent instead of failing the whole response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default, deserialize_with = "lenient_results")]
    pub shopping_results: Option<Vec<SearchResult>>,
    #[serde(default, deserialize_with = "lenient_results")]
    pub organic_results: Option<Vec<SearchResult>>,
    /// Set by the provider when the query was rejected or found nothing.
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_text")]
    pub error: Option<String>,
}

impl SearchResponse {
    pub fn with_results(results: Vec<SearchResult>) -> Self {
        Self {
            shopping_results: Some(results),
            ..Self::default()
        }
    }

    /// Shopping results when present, organic results otherwise.
    pub fn results(&self) -> &[SearchResult] {
        match (&self.shopping_results, &self.organic_results) {
            (Some(shopping), _) if !shopping.is_empty() => shopping.as_slice(),
            (_, Some(organic)) => organic.as_slice(),
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(default)]
    pub price: Option<PriceField>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub extracted_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub link: Option<String>,
}

impl SearchResult {
    pub fn priced(raw: &str, currency: Option<&str>) -> Self {
        Self {
            price: Some(PriceField::Detailed(PriceDetail {
                raw: Some(raw.to_string()),
                currency: currency.map(str::to_string),
                ..PriceDetail::default()
            })),
            ..Self::default()
        }
    }
}

/// Providers report price either as display text or as a structured object.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PriceField {
    Text(String),
    Number(f64),
    Detailed(PriceDetail),
    Unrecognized(Value),
}

impl<'de> Deserialize<'de> for PriceField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(text) => PriceField::Text(text),
            Value::Number(n) => match n.as_f64() {
                Some(v) => PriceField::Number(v),
                None => PriceField::Unrecognized(Value::Number(n)),
            },
            Value::Object(_) => match PriceDetail::deserialize(&value) {
                Ok(detail) => PriceField::Detailed(detail),
                Err(_) => PriceField::Unrecognized(value),
            },
            other => PriceField::Unrecognized(other),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceDetail {
    #[serde(default, deserialize_with = "lenient_text")]
    pub raw: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub value: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub extracted_value: Option<f64>,
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        _ => None,
    })
}

/// Accepts numbers and numeric strings such as `"45.00"`.
fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    })
}

/// A list that is not an array reads as absent; entries that are not objects
/// keep their position as empty results.
fn lenient_results<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<SearchResult>>, D::Error> {
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(None);
    };
    Ok(Some(
        items
            .iter()
            .map(|item| match item {
                Value::Object(_) => SearchResult::deserialize(item).unwrap_or_default(),
                _ => SearchResult::default(),
            })
            .collect(),
    ))
}

impl PriceField {
    /// Display text of the price, if any non-blank text is available.
    pub fn raw(&self) -> Option<String> {
        let text = match self {
            PriceField::Text(text) => Some(text.clone()),
            PriceField::Number(n) => Some(n.to_string()),
            PriceField::Detailed(detail) => detail.raw.clone(),
            PriceField::Unrecognized(_) => None,
        };
        text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
    }

    pub fn currency(&self) -> Option<String> {
        match self {
            PriceField::Detailed(detail) => detail.currency.clone().filter(|c| !c.is_empty()),
            _ => None,
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            PriceField::Number(n) => Some(*n),
            PriceField::Detailed(detail) => detail.extracted_value.or(detail.value),
            _ => None,
        }
    }
}
