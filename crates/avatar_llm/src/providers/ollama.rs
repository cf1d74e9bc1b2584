//! Ollama provider.
//!
//! Ollama exposes an OpenAI-compatible API at localhost:11434/v1, so
//! the wire format is shared with the OpenAI provider.

use crate::ChatModel;
use avatar_core::config::LlmConfig;
use avatar_core::{AvatarError, ChatMessage, Result, Role};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct OllamaChat {
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OllamaChat {
    pub fn new(cfg: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build Ollama HTTP client: {}", e);
                AvatarError::LanguageModel
            })?;
        let base_url = cfg
            .base_url
            .clone()
            .unwrap_or_else(|| "http://localhost:11434/v1".to_string())
            .trim_end_matches('/')
            .to_string();
        Ok(Self {
            client,
            base_url,
            model: cfg.model.clone(),
            temperature: cfg.temperature,
        })
    }
}

/// Convert turns to OpenAI-compatible chat messages with a leading
/// system instruction (shared with the OpenAI provider).
pub(crate) fn build_openai_messages(system: &str, messages: &[ChatMessage]) -> Vec<Value> {
    let mut wire = vec![json!({"role": "system", "content": system})];
    for msg in messages {
        let role = match msg.role {
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        wire.push(json!({"role": role, "content": msg.content}));
    }
    wire
}

/// Pull the first choice's text out of an OpenAI-style response.
pub(crate) fn extract_content(resp: &Value) -> Option<String> {
    resp["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.to_string())
}

#[async_trait]
impl ChatModel for OllamaChat {
    async fn chat(&self, system: &str, messages: &[ChatMessage]) -> Result<String> {
        let payload = json!({
            "model": self.model,
            "messages": build_openai_messages(system, messages),
            "temperature": self.temperature,
        });

        tracing::debug!("Sending {} messages to Ollama", messages.len());
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Ollama request failed: {}", e);
                AvatarError::LanguageModel
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!("Ollama error {}: {}", status, detail);
            return Err(AvatarError::LanguageModel);
        }

        let resp_json: Value = response.json().await.map_err(|e| {
            tracing::warn!("Ollama returned non-JSON body: {}", e);
            AvatarError::LanguageModel
        })?;
        extract_content(&resp_json).ok_or_else(|| {
            tracing::warn!("Ollama response missing content: {}", resp_json);
            AvatarError::LanguageModel
        })
    }
}
