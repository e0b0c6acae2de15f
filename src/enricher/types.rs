use serde::{Deserialize, Serialize};

use crate::extractor::Asset;

/// Coarse trust label for a price estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Low,
}

/// How the lookup for one asset ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupStatus {
    /// A price was found.
    Priced,
    /// The search succeeded but yielded no usable price.
    NoPrice,
    /// The search backend could not be reached or refused the request.
    Failed,
}

/// What a pricing strategy concluded from a result set.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceEstimate {
    pub price: Option<String>,
    pub value: Option<f64>,
    pub currency: Option<String>,
    pub confidence: Confidence,
}

impl PriceEstimate {
    pub fn none() -> Self {
        Self {
            price: None,
            value: None,
            currency: None,
            confidence: Confidence::Low,
        }
    }
}

/// An asset with its market price estimate. One per input asset, same order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedAsset {
    #[serde(flatten)]
    pub asset: Asset,
    /// Raw price text as returned by the search provider, e.g. "$45.00".
    pub estimated_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_value: Option<f64>,
    pub currency: Option<String>,
    pub confidence: Confidence,
    pub price_source: String,
    pub lookup: LookupStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PricedAsset {
    pub fn from_estimate(asset: Asset, estimate: PriceEstimate, source: &str) -> Self {
        let lookup = if estimate.price.is_some() {
            LookupStatus::Priced
        } else {
            LookupStatus::NoPrice
        };
        Self {
            asset,
            estimated_price: estimate.price,
            estimated_value: estimate.value,
            currency: estimate.currency,
            confidence: estimate.confidence,
            price_source: source.to_string(),
            lookup,
            error: None,
        }
    }

    pub fn failed(asset: Asset, source: &str, error: impl ToString) -> Self {
        Self {
            asset,
            estimated_price: None,
            estimated_value: None,
            currency: None,
            confidence: Confidence::Low,
            price_source: source.to_string(),
            lookup: LookupStatus::Failed,
            error: Some(error.to_string()),
        }
    }
}
