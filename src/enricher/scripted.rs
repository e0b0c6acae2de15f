use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::enricher::search::{ProductSearch, SearchResponse};
use crate::errors::{AssetScanError, AssetScanResult};

enum Reply {
    Results(SearchResponse),
    Failure(String),
}

/// Deterministic search backend keyed by exact query text. Unknown queries
/// return an empty result set.
#[derive(Default)]
pub struct ScriptedSearch {
    replies: HashMap<String, Reply>,
    delays: HashMap<String, Duration>,
}

impl ScriptedSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, query: &str, response: SearchResponse) -> Self {
        self.replies.insert(query.to_string(), Reply::Results(response));
        self
    }

    pub fn fail(mut self, query: &str, message: &str) -> Self {
        self.replies
            .insert(query.to_string(), Reply::Failure(message.to_string()));
        self
    }

    pub fn delay(mut self, query: &str, delay: Duration) -> Self {
        self.delays.insert(query.to_string(), delay);
        self
    }
}

#[async_trait]
impl ProductSearch for ScriptedSearch {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn search(&self, query: &str) -> AssetScanResult<SearchResponse> {
        if let Some(delay) = self.delays.get(query) {
            tokio::time::sleep(*delay).await;
        }
        match self.replies.get(query) {
            Some(Reply::Results(response)) => Ok(response.clone()),
            Some(Reply::Failure(message)) => {
                Err(AssetScanError::SearchBackendUnavailable(message.clone()))
            }
            None => Ok(SearchResponse::default()),
        }
    }
}
