//! OpenAI-compatible chat-completions client (Ollama, LM Studio).

use crate::config::llm::LlmConfig;
use crate::core::{ChatMessage, Narrator, StreamSink, Translator};
use crate::utils::error::{Result, TarotError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

const TRANSLATE_PROMPT: &str =
    "次の日本語を英語に訳してください。訳した文章だけを返してください：\n\n";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    stream: bool,
}

/// Splits a server-sent events byte stream into `data:` payloads.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feeds raw bytes and returns every complete `data:` payload. Lines may
    /// be split across chunks, including inside multi-byte characters.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);
        let mut payloads = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(payload) = self.take_line(&line) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Flushes a trailing line without a newline.
    pub fn finish(&mut self) -> Option<String> {
        let line = std::mem::take(&mut self.buffer);
        self.take_line(&line)
    }

    fn take_line(&mut self, line: &[u8]) -> Option<String> {
        if self.done {
            return None;
        }
        let text = String::from_utf8_lossy(line);
        let payload = text.trim_end_matches(['\r', '\n']).strip_prefix("data:")?.trim();
        if payload == "[DONE]" {
            self.done = true;
            return None;
        }
        (!payload.is_empty()).then(|| payload.to_string())
    }
}

/// `choices[0].delta.content` of a streamed chunk.
pub fn delta_content(payload: &str) -> Option<String> {
    let value: Value = serde_json::from_str(payload).ok()?;
    value["choices"][0]["delta"]["content"]
        .as_str()
        .map(|s| s.to_string())
}

/// Message of an `{"error": ...}` payload sent in place of a chunk.
pub fn stream_error(payload: &str) -> Option<String> {
    let value: Value = serde_json::from_str(payload).ok()?;
    let error = value.get("error").filter(|e| !e.is_null())?;
    Some(
        error
            .as_str()
            .or_else(|| error["message"].as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| error.to_string()),
    )
}

#[derive(Debug, Clone)]
pub struct OpenAiChatClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiChatClient {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post(&self, messages: &[ChatMessage], stream: bool) -> Result<reqwest::Response> {
        let body = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            stream,
        };

        tracing::debug!("POST {} (stream={})", self.endpoint, stream);
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(TarotError::collaborator(
                "chat completion",
                format!("HTTP {}: {}", status, detail),
            ));
        }
        Ok(response)
    }

    /// Non-streaming completion; returns `choices[0].message.content`.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let response = self.post(messages, false).await?;
        let value: Value = response.json().await?;
        value["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                TarotError::collaborator("chat completion", "response has no message content")
            })
    }
}

#[async_trait]
impl Translator for OpenAiChatClient {
    async fn translate(&self, text: &str) -> Result<String> {
        let messages = [ChatMessage::user(format!("{}{}", TRANSLATE_PROMPT, text))];
        let translated = self.complete(&messages).await?;
        Ok(translated.trim().to_string())
    }
}

#[async_trait]
impl Narrator for OpenAiChatClient {
    async fn stream(&self, messages: &[ChatMessage], sink: &mut dyn StreamSink) -> Result<String> {
        let mut response = self.post(messages, true).await?;
        let mut decoder = SseDecoder::new();
        let mut text = String::new();

        while let Some(bytes) = response.chunk().await? {
            for payload in decoder.push(&bytes) {
                if let Some(message) = stream_error(&payload) {
                    return Err(TarotError::collaborator(
                        "chat completion stream",
                        format!("{} (after {} characters)", message, text.chars().count()),
                    ));
                }
                if let Some(piece) = delta_content(&payload).filter(|p| !p.is_empty()) {
                    sink.chunk(&piece);
                    text.push_str(&piece);
                }
            }
            if decoder.is_done() {
                break;
            }
        }

        if let Some(payload) = decoder.finish() {
            if let Some(message) = stream_error(&payload) {
                return Err(TarotError::collaborator("chat completion stream", message));
            }
            if let Some(piece) = delta_content(&payload).filter(|p| !p.is_empty()) {
                sink.chunk(&piece);
                text.push_str(&piece);
            }
        }

        tracing::debug!("Streamed {} characters", text.chars().count());
        Ok(text)
    }
}
