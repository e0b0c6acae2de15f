//! Price enrichment: one independent product search per asset, fanned out
//! with bounded concurrency and collected back in input order.
pub mod scripted;
pub mod search;
pub mod serpapi;
pub mod strategy;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use tokio::sync::watch;

use crate::errors::AssetScanError;
use crate::extractor::Asset;

pub use scripted::ScriptedSearch;
pub use search::{ProductSearch, SearchResponse, SearchResult};
pub use serpapi::SerpApiSearch;
pub use strategy::{FirstResultStrategy, PricingStrategy};
pub use types::{Confidence, LookupStatus, PriceEstimate, PricedAsset};

/// Output of an enrichment pass. When `cancelled` is set, `priced` holds the
/// assets completed before cancellation, in input order, with no gaps.
#[derive(Debug, Clone)]
pub struct Enrichment {
    pub priced: Vec<PricedAsset>,
    pub cancelled: bool,
}

pub struct PriceEnricher {
    search: Arc<dyn ProductSearch>,
    strategy: Arc<dyn PricingStrategy>,
    concurrency: usize,
    query_timeout: Duration,
}

impl PriceEnricher {
    pub fn new(search: Arc<dyn ProductSearch>) -> Self {
        Self {
            search,
            strategy: Arc::new(FirstResultStrategy),
            concurrency: 4,
            query_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_strategy(mut self, strategy: Arc<dyn PricingStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Prices every asset. Never fails as a whole: lookup failures are
    /// recorded on the affected asset only.
    pub async fn enrich(&self, assets: Vec<Asset>) -> Vec<PricedAsset> {
        let (_keep_alive, cancel) = watch::channel(false);
        self.enrich_until(assets, cancel).await.priced
    }

    /// Like `enrich`, but stops when `cancel` flips to `true`. In-flight
    /// lookups are abandoned; completed ones are kept.
    pub async fn enrich_until(
        &self,
        assets: Vec<Asset>,
        mut cancel: watch::Receiver<bool>,
    ) -> Enrichment {
        let total = assets.len();
        tracing::info!(
            assets = total,
            concurrency = self.concurrency,
            source = self.search.name(),
            "pricing assets"
        );

        let mut priced = Vec::with_capacity(total);
        if *cancel.borrow() {
            return Enrichment {
                priced,
                cancelled: true,
            };
        }

        let mut lookups = std::pin::pin!(stream::iter(assets.into_iter().enumerate())
            .map(|(index, asset)| self.price_one(index, asset))
            .buffered(self.concurrency));

        let mut watching = true;
        let mut cancelled = false;
        loop {
            tokio::select! {
                changed = cancel.changed(), if watching => match changed {
                    Ok(()) if *cancel.borrow() => {
                        cancelled = true;
                        break;
                    }
                    Ok(()) => {}
                    Err(_) => watching = false,
                },
                next = lookups.next() => match next {
                    Some(item) => priced.push(item),
                    None => break,
                },
            }
        }

        if cancelled {
            tracing::warn!(
                completed = priced.len(),
                total = total,
                "price lookups cancelled; keeping completed results"
            );
        }
        Enrichment { priced, cancelled }
    }

    async fn price_one(&self, index: usize, asset: Asset) -> PricedAsset {
        let source = self.search.name();
        let query = asset.description.clone();

        let outcome = match tokio::time::timeout(self.query_timeout, self.search.search(&query)).await {
            Ok(result) => result,
            Err(_) => Err(AssetScanError::SearchBackendUnavailable(format!(
                "no response within {}s",
                self.query_timeout.as_secs()
            ))),
        };

        match outcome {
            Ok(response) => {
                let estimate = self.strategy.estimate(response.results());
                let priced = PricedAsset::from_estimate(asset, estimate, source);
                tracing::debug!(
                    index = index,
                    query = %query,
                    price = ?priced.estimated_price,
                    confidence = ?priced.confidence,
                    "asset priced"
                );
                priced
            }
            Err(e) => {
                tracing::warn!(index = index, query = %query, error = %e, "price lookup failed");
                PricedAsset::failed(asset, source, e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::AssetCategory;

    fn asset(ty: &str, color: &str) -> Asset {
        Asset::new(ty, AssetCategory::Other, "Other", color)
    }

    fn lamp_results() -> SearchResponse {
        SearchResponse::with_results(vec![SearchResult::priced("$45.00", Some("USD"))])
    }

    #[tokio::test]
    async fn priced_result_propagates_raw_price() {
        let search = ScriptedSearch::new().respond("Black Lamp", lamp_results());
        let enricher = PriceEnricher::new(Arc::new(search));
        let out = enricher.enrich(vec![asset("Lamp", "Black")]).await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].estimated_price.as_deref(), Some("$45.00"));
        assert_eq!(out[0].currency.as_deref(), Some("USD"));
        assert_eq!(out[0].confidence, Confidence::High);
        assert_eq!(out[0].lookup, LookupStatus::Priced);
        assert_eq!(out[0].price_source, "scripted");
    }

    #[tokio::test]
    async fn zero_results_is_low_confidence_not_an_error() {
        let enricher = PriceEnricher::new(Arc::new(ScriptedSearch::new()));
        let out = enricher.enrich(vec![asset("Antique Globe", "Green")]).await;
        assert_eq!(out[0].estimated_price, None);
        assert_eq!(out[0].currency, None);
        assert_eq!(out[0].confidence, Confidence::Low);
        assert_eq!(out[0].lookup, LookupStatus::NoPrice);
        assert_eq!(out[0].error, None);
    }

    #[tokio::test]
    async fn one_failing_lookup_does_not_disturb_the_others() {
        let search = ScriptedSearch::new()
            .respond("Black Lamp", lamp_results())
            .fail("Brown Sofa", "401 Unauthorized")
            .respond(
                "White Fridge",
                SearchResponse::with_results(vec![SearchResult::priced("$999.00", Some("USD"))]),
            );
        let enricher = PriceEnricher::new(Arc::new(search)).with_concurrency(3);
        let out = enricher
            .enrich(vec![asset("Lamp", "Black"), asset("Sofa", "Brown"), asset("Fridge", "White")])
            .await;

        let types: Vec<&str> = out.iter().map(|p| p.asset.asset_type.as_str()).collect();
        assert_eq!(types, vec!["Lamp", "Sofa", "Fridge"]);
        assert_eq!(out[0].confidence, Confidence::High);
        assert_eq!(out[1].estimated_price, None);
        assert_eq!(out[1].confidence, Confidence::Low);
        assert_eq!(out[1].lookup, LookupStatus::Failed);
        assert!(out[1].error.as_deref().unwrap().contains("401"));
        assert_eq!(out[2].estimated_price.as_deref(), Some("$999.00"));
    }

    #[tokio::test(start_paused = true)]
    async fn order_is_kept_when_early_lookups_finish_last() {
        let search = ScriptedSearch::new()
            .respond("Black Lamp", lamp_results())
            .delay("Black Lamp", Duration::from_secs(5))
            .delay("Brown Sofa", Duration::from_secs(1));
        let enricher = PriceEnricher::new(Arc::new(search)).with_concurrency(4);
        let out = enricher
            .enrich(vec![asset("Lamp", "Black"), asset("Sofa", "Brown"), asset("Chair", "Red")])
            .await;
        let types: Vec<&str> = out.iter().map(|p| p.asset.asset_type.as_str()).collect();
        assert_eq!(types, vec!["Lamp", "Sofa", "Chair"]);
        assert_eq!(out[0].lookup, LookupStatus::Priced);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_lookup_times_out_as_failure() {
        let search = ScriptedSearch::new()
            .respond("Black Lamp", lamp_results())
            .delay("Black Lamp", Duration::from_secs(120));
        let enricher = PriceEnricher::new(Arc::new(search)).with_query_timeout(Duration::from_secs(2));
        let out = enricher.enrich(vec![asset("Lamp", "Black")]).await;
        assert_eq!(out[0].lookup, LookupStatus::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_keeps_completed_prefix() {
        let search = ScriptedSearch::new()
            .respond("Black Lamp", lamp_results())
            .delay("Brown Sofa", Duration::from_secs(60));
        let enricher = PriceEnricher::new(Arc::new(search))
            .with_concurrency(1)
            .with_query_timeout(Duration::from_secs(600));
        let (tx, rx) = watch::channel(false);

        let cancel = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            let _ = tx.send(true);
        });
        let result = enricher
            .enrich_until(
                vec![asset("Lamp", "Black"), asset("Sofa", "Brown"), asset("Chair", "Red")],
                rx,
            )
            .await;
        cancel.await.unwrap();

        assert!(result.cancelled);
        assert_eq!(result.priced.len(), 1);
        assert_eq!(result.priced[0].asset.asset_type, "Lamp");
        assert_eq!(result.priced[0].confidence, Confidence::High);
    }

    #[tokio::test]
    async fn already_cancelled_prices_nothing() {
        let (_tx, rx) = watch::channel(true);
        let enricher = PriceEnricher::new(Arc::new(ScriptedSearch::new()));
        let result = enricher.enrich_until(vec![asset("Lamp", "Black")], rx).await;
        assert!(result.cancelled);
        assert!(result.priced.is_empty());
    }

    struct AlwaysLow;

    impl PricingStrategy for AlwaysLow {
        fn estimate(&self, _results: &[SearchResult]) -> PriceEstimate {
            PriceEstimate::none()
        }
    }

    #[tokio::test]
    async fn strategy_is_replaceable() {
        let search = ScriptedSearch::new().respond("Black Lamp", lamp_results());
        let enricher = PriceEnricher::new(Arc::new(search)).with_strategy(Arc::new(AlwaysLow));
        let out = enricher.enrich(vec![asset("Lamp", "Black")]).await;
        assert_eq!(out[0].confidence, Confidence::Low);
        assert_eq!(out[0].lookup, LookupStatus::NoPrice);
    }
}
