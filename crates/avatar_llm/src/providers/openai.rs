//! OpenAI provider. Same wire format as Ollama, plus bearer auth.

use crate::providers::ollama::{build_openai_messages, extract_content};
use crate::ChatModel;
use avatar_core::config::LlmConfig;
use avatar_core::{AvatarError, ChatMessage, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct OpenAiChat {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiChat {
    pub fn new(cfg: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build OpenAI HTTP client: {}", e);
                AvatarError::LanguageModel
            })?;
        let base_url = cfg
            .base_url
            .clone()
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string())
            .trim_end_matches('/')
            .to_string();
        Ok(Self {
            client,
            base_url,
            api_key: cfg.api_key.clone().unwrap_or_default(),
            model: cfg.model.clone(),
            temperature: cfg.temperature,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn chat(&self, system: &str, messages: &[ChatMessage]) -> Result<String> {
        let payload = json!({
            "model": self.model,
            "messages": build_openai_messages(system, messages),
            "temperature": self.temperature,
        });

        tracing::debug!("Sending {} messages to OpenAI", messages.len());
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("OpenAI request failed: {}", e);
                AvatarError::LanguageModel
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!("OpenAI error {}: {}", status, detail);
            return Err(AvatarError::LanguageModel);
        }

        let resp_json: Value = response.json().await.map_err(|e| {
            tracing::warn!("OpenAI returned non-JSON body: {}", e);
            AvatarError::LanguageModel
        })?;
        extract_content(&resp_json).ok_or_else(|| {
            tracing::warn!("OpenAI response missing content: {}", resp_json);
            AvatarError::LanguageModel
        })
    }
}
