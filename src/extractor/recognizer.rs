use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;

use crate::errors::{AssetScanError, AssetScanResult};
use crate::extractor::prompt::asset_inventory_prompt;
use crate::llm::provider::LlmProvider;
use crate::llm::types::{CallConfig, ChatMessage, ContentPart, ImageUrl};
use crate::sampler::Frame;

/// Black-box capability that looks at all frames at once and answers with a
/// deduplicated asset list as JSON text.
#[async_trait]
pub trait AssetRecognizer: Send + Sync {
    fn name(&self) -> &str;

    /// Returns the raw response text. Parsing is left to the extractor.
    async fn recognize(&self, frames: &[Frame]) -> AssetScanResult<String>;
}

/// Recognizer backed by a vision-capable chat model.
pub struct VisionRecognizer {
    provider: Arc<dyn LlmProvider>,
    call: CallConfig,
    image_detail: Option<String>,
}

impl VisionRecognizer {
    pub fn new(provider: Arc<dyn LlmProvider>, call: CallConfig) -> Self {
        Self {
            provider,
            call,
            image_detail: None,
        }
    }

    pub fn with_image_detail(mut self, detail: Option<String>) -> Self {
        self.image_detail = detail;
        self
    }

    fn build_message(&self, frames: &[Frame]) -> ChatMessage {
        let mut parts = Vec::with_capacity(frames.len() + 1);
        parts.push(ContentPart::Text {
            text: asset_inventory_prompt(),
        });
        for frame in frames {
            let b64 = base64::engine::general_purpose::STANDARD.encode(frame.encoded_jpeg());
            parts.push(ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: format!("data:image/jpeg;base64,{b64}"),
                    detail: self.image_detail.clone(),
                },
            });
        }
        ChatMessage::user_parts(parts)
    }
}

#[async_trait]
impl AssetRecognizer for VisionRecognizer {
    fn name(&self) -> &str {
        self.provider.name()
    }

    async fn recognize(&self, frames: &[Frame]) -> AssetScanResult<String> {
        let message = self.build_message(frames);
        let response = self.provider.chat(vec![message], &self.call).await?;
        if response.content.trim().is_empty() {
            return Err(AssetScanError::EmptyCapabilityResponse(format!(
                "model '{}' returned no content",
                self.call.model
            )));
        }
        Ok(response.content)
    }
}

/// Deterministic recognizer that replays a canned response.
pub struct ScriptedRecognizer {
    response: String,
    delay: Option<Duration>,
}

impl ScriptedRecognizer {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            delay: None,
        }
    }

    pub fn from_file(path: &std::path::Path) -> AssetScanResult<Self> {
        Ok(Self::new(std::fs::read_to_string(path)?))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl AssetRecognizer for ScriptedRecognizer {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn recognize(&self, _frames: &[Frame]) -> AssetScanResult<String> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.response.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::{LlmResponse, MessageContent};
    use crate::sampler::synthetic::SyntheticSource;
    use crate::sampler::FrameSampler;
    use std::sync::Mutex;

    struct RecordingProvider {
        reply: String,
        seen: Mutex<Vec<ChatMessage>>,
    }

    #[async_trait]
    impl LlmProvider for RecordingProvider {
        fn name(&self) -> &str {
            "recording"
        }

        async fn chat(
            &self,
            messages: Vec<ChatMessage>,
            _cfg: &CallConfig,
        ) -> AssetScanResult<LlmResponse> {
            self.seen.lock().unwrap().extend(messages);
            Ok(LlmResponse {
                content: self.reply.clone(),
                reasoning: String::new(),
            })
        }
    }

    fn call() -> CallConfig {
        CallConfig {
            model: "test-model".into(),
            stream: false,
            temperature: 0.1,
        }
    }

    #[tokio::test]
    async fn attaches_prompt_and_every_frame_in_one_call() {
        let dir = tempfile::tempdir().unwrap();
        let frames = FrameSampler::new(1.0, dir.path())
            .sample(&mut SyntheticSource::new(Some(1.0), 3, 8, 8))
            .unwrap()
            .frames;
        let provider = Arc::new(RecordingProvider {
            reply: "[]".into(),
            seen: Mutex::new(Vec::new()),
        });
        let recognizer = VisionRecognizer::new(provider.clone(), call())
            .with_image_detail(Some("low".into()));

        let reply = recognizer.recognize(&frames).await.unwrap();
        assert_eq!(reply, "[]");

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let MessageContent::Parts(parts) = &seen[0].content else {
            panic!("expected multi-part message");
        };
        assert_eq!(parts.len(), 4);
        assert!(matches!(&parts[0], ContentPart::Text { text } if text.contains("JSON array")));
        for part in &parts[1..] {
            let ContentPart::ImageUrl { image_url } = part else {
                panic!("expected image part");
            };
            assert!(image_url.url.starts_with("data:image/jpeg;base64,"));
            assert_eq!(image_url.detail.as_deref(), Some("low"));
        }
    }

    #[tokio::test]
    async fn blank_model_reply_is_empty_response() {
        let provider = Arc::new(RecordingProvider {
            reply: "   ".into(),
            seen: Mutex::new(Vec::new()),
        });
        let recognizer = VisionRecognizer::new(provider, call());
        assert!(matches!(
            recognizer.recognize(&[]).await,
            Err(AssetScanError::EmptyCapabilityResponse(_))
        ));
    }
}
