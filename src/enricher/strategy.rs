use crate::enricher::search::SearchResult;
use crate::enricher::types::{Confidence, PriceEstimate};

pub const DEFAULT_CURRENCY: &str = "USD";

/// Turns a search result set into a price estimate.
pub trait PricingStrategy: Send + Sync {
    fn estimate(&self, results: &[SearchResult]) -> PriceEstimate;
}

/// Trusts the first result: its price is taken verbatim with `High`
/// confidence. No price on the first result means no estimate.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstResultStrategy;

impl PricingStrategy for FirstResultStrategy {
    fn estimate(&self, results: &[SearchResult]) -> PriceEstimate {
        let Some(first) = results.first() else {
            return PriceEstimate::none();
        };
        let Some(price) = first.price.as_ref() else {
            return PriceEstimate::none();
        };
        let Some(raw) = price.raw() else {
            return PriceEstimate::none();
        };

        PriceEstimate {
            price: Some(raw),
            value: price.value().or(first.extracted_price),
            currency: Some(price.currency().unwrap_or_else(|| DEFAULT_CURRENCY.to_string())),
            confidence: Confidence::High,
        }
    }
}
