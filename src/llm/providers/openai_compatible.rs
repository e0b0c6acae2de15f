use async_trait::async_trait;
use futures_util::StreamExt;

use crate::errors::{AssetScanError, AssetScanResult};
use crate::llm::provider::LlmProvider;
use crate::llm::sse_parser;
use crate::llm::types::{CallConfig, ChatMessage, LlmResponse, StreamChunkKind};

pub struct OpenAiCompatibleProvider {
    id: String,
    api_base: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(id: String, api_base: String, api_key: String) -> Self {
        Self {
            id,
            api_base,
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.id
    }

    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        cfg: &CallConfig,
    ) -> AssetScanResult<LlmResponse> {
        let body = serde_json::json!({
            "model": cfg.model,
            "messages": &messages,
            "stream": cfg.stream,
            "temperature": cfg.temperature,
        });

        tracing::debug!(
            provider = %self.id,
            model = %cfg.model,
            stream = cfg.stream,
            "sending LLM request"
        );
        tracing::debug!(
            body = %sanitized_body(&body),
            "request body (sanitized, base64 omitted)"
        );

        let response = self
            .client
            .post(&self.api_base)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let err_body = response.text().await.unwrap_or_default();
            return Err(AssetScanError::LlmProvider(format!("{}: {}", status, err_body)));
        }

        if cfg.stream {
            self.handle_stream(response).await
        } else {
            self.handle_json(response).await
        }
    }
}

impl OpenAiCompatibleProvider {
    /// Accumulates an SSE response into a single `LlmResponse`. Lines are
    /// decoded only once complete, so multibyte characters split across
    /// network chunks survive.
    async fn handle_stream(&self, response: reqwest::Response) -> AssetScanResult<LlmResponse> {
        let mut byte_stream = response.bytes_stream();
        let mut line_buf: Vec<u8> = Vec::new();
        let mut resp = LlmResponse::default();
        let mut done = false;

        'stream: while let Some(result) = byte_stream.next().await {
            line_buf.extend_from_slice(&result?);

            while let Some(pos) = line_buf.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = line_buf.drain(..=pos).collect();
                if apply_sse_line(&mut resp, &line) {
                    done = true;
                    break 'stream;
                }
            }
        }

        // Last line of a stream that ends without a newline.
        if !done && !line_buf.is_empty() {
            apply_sse_line(&mut resp, &line_buf);
        }

        tracing::info!(
            content_len = resp.content.len(),
            reasoning_len = resp.reasoning.len(),
            "LLM stream complete"
        );
        Ok(resp)
    }

    async fn handle_json(&self, response: reqwest::Response) -> AssetScanResult<LlmResponse> {
        let json: serde_json::Value = response.json().await?;

        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("")
            .to_string();
        let reasoning = json["choices"][0]["message"]["reasoning_content"]
            .as_str()
            .unwrap_or("")
            .to_string();

        tracing::info!(content_len = content.len(), "LLM JSON response received");

        Ok(LlmResponse { content, reasoning })
    }
}

/// Folds one raw SSE line into `resp`. Returns `true` at end of stream.
fn apply_sse_line(resp: &mut LlmResponse, raw: &[u8]) -> bool {
    let line = String::from_utf8_lossy(raw);
    let line = line.trim();
    if line.is_empty() {
        return false;
    }
    match sse_parser::parse_sse_line(line) {
        Ok(Some(chunk)) => match chunk.kind {
            StreamChunkKind::Reasoning => resp.reasoning.push_str(&chunk.content),
            StreamChunkKind::Content => resp.content.push_str(&chunk.content),
            StreamChunkKind::Done => return true,
        },
        Ok(None) => {}
        Err(e) => {
            tracing::debug!("SSE parse skipped: {e}");
        }
    }
    false
}

/// Renders the request body for logging with inline image payloads replaced.
fn sanitized_body(body: &serde_json::Value) -> String {
    let mut log_body = body.clone();
    if let Some(msgs) = log_body.get_mut("messages").and_then(|m| m.as_array_mut()) {
        for msg in msgs {
            let Some(parts) = msg.get_mut("content").and_then(|c| c.as_array_mut()) else {
                continue;
            };
            for part in parts {
                if part.get("type").and_then(|t| t.as_str()) != Some("image_url") {
                    continue;
                }
                if let Some(url) = part.get_mut("image_url").and_then(|i| i.get_mut("url")) {
                    *url = serde_json::Value::String("<omitted_base64_image>".to_string());
                }
            }
        }
    }
    serde_json::to_string(&log_body).unwrap_or_default()
}
