use async_trait::async_trait;

use crate::config::SearchConfig;
use crate::enricher::search::{ProductSearch, SearchResponse};
use crate::errors::{AssetScanError, AssetScanResult};

/// SerpApi-backed product search.
pub struct SerpApiSearch {
    api_base: String,
    api_key: String,
    engine: String,
    location: String,
    hl: String,
    client: reqwest::Client,
}

impl SerpApiSearch {
    pub fn new(cfg: &SearchConfig, api_key: String) -> Self {
        Self {
            api_base: cfg.api_base.clone(),
            api_key,
            engine: cfg.engine.clone(),
            location: cfg.location.clone(),
            hl: cfg.hl.clone(),
            client: reqwest::Client::new(),
        }
    }

    fn params<'a>(&'a self, query: &'a str) -> [(&'static str, &'a str); 5] {
        [
            ("api_key", self.api_key.as_str()),
            ("engine", self.engine.as_str()),
            ("q", query),
            ("location", self.location.as_str()),
            ("hl", self.hl.as_str()),
        ]
    }
}

/// SerpApi reports an empty result set through the `error` field.
fn is_empty_result_notice(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("hasn't returned any results") || message.contains("no results")
}

#[async_trait]
impl ProductSearch for SerpApiSearch {
    fn name(&self) -> &str {
        "SerpAPI"
    }

    async fn search(&self, query: &str) -> AssetScanResult<SearchResponse> {
        tracing::debug!(engine = %self.engine, query = %query, "querying SerpApi");

        let response = self
            .client
            .get(&self.api_base)
            .query(&self.params(query))
            .send()
            .await
            .map_err(|e| AssetScanError::SearchBackendUnavailable(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AssetScanError::SearchBackendUnavailable(format!("{status}: {body}")));
        }

        let mut body: SearchResponse = response.json().await.map_err(|e| {
            AssetScanError::SearchBackendUnavailable(format!("unreadable response: {e}"))
        })?;

        if let Some(message) = body.error.take() {
            if is_empty_result_notice(&message) {
                tracing::debug!(query = %query, "SerpApi returned no results");
                return Ok(SearchResponse::default());
            }
            return Err(AssetScanError::SearchBackendUnavailable(message));
        }

        tracing::debug!(query = %query, results = body.results().len(), "SerpApi response");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_carries_fixed_locale_and_engine() {
        let search = SerpApiSearch::new(&SearchConfig::default(), "secret".into());
        let params = search.params("Modern Black Desk Lamp");
        assert_eq!(
            params,
            [
                ("api_key", "secret"),
                ("engine", "amazon"),
                ("q", "Modern Black Desk Lamp"),
                ("location", "United States"),
                ("hl", "en"),
            ]
        );
    }

    #[test]
    fn empty_result_notices_are_recognized() {
        assert!(is_empty_result_notice(
            "Google hasn't returned any results for this query."
        ));
        assert!(!is_empty_result_notice("Invalid API key. Your API key should be here: ..."));
    }

    #[tokio::test]
    async fn unreachable_backend_is_search_unavailable() {
        let cfg = SearchConfig {
            api_base: "http://127.0.0.1:9/search".into(),
            ..SearchConfig::default()
        };
        let search = SerpApiSearch::new(&cfg, String::new());
        assert!(matches!(
            search.search("lamp").await,
            Err(AssetScanError::SearchBackendUnavailable(_))
        ));
    }
}
