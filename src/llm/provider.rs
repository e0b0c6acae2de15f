use async_trait::async_trait;

use crate::errors::AssetScanResult;
use crate::llm::types::{CallConfig, ChatMessage, LlmResponse};

/// Chat-completion capability used by the asset extractor.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Identifier used in logs.
    fn name(&self) -> &str;

    /// Sends the conversation and returns the accumulated response text.
    async fn chat(&self, messages: Vec<ChatMessage>, cfg: &CallConfig)
        -> AssetScanResult<LlmResponse>;
}
