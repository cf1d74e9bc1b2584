//! Text-to-speech adapter.
//!
//! The production synthesizer calls an ElevenLabs-style HTTP service and
//! buffers the (possibly chunked) audio stream before returning. No
//! internal retry; every failure collapses into the single opaque
//! synthesis error.

use crate::workspace::{Bucket, Workspace, WorkflowContext};
use avatar_core::config::TtsConfig;
use avatar_core::{AvatarError, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use std::path::PathBuf;
use std::time::Duration;

#[async_trait]
pub trait VoiceSynthesizer: Send + Sync {
    /// Synthesize `text` into audio bytes (MP3).
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}

/// Remote synthesis over the ElevenLabs HTTP API.
#[derive(Debug, Clone)]
pub struct ElevenLabsSynthesizer {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    voice_id: String,
    model_id: String,
}

impl ElevenLabsSynthesizer {
    pub fn new(cfg: &TtsConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build TTS HTTP client: {}", e);
                AvatarError::Synthesis
            })?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
            voice_id: cfg.voice_id.clone(),
            model_id: cfg.model_id.clone(),
        })
    }
}

#[async_trait]
impl VoiceSynthesizer for ElevenLabsSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let url = format!("{}/v1/text-to-speech/{}", self.base_url, self.voice_id);

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .json(&serde_json::json!({
                "text": text,
                "model_id": self.model_id,
            }))
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("TTS request failed: {}", e);
                AvatarError::Synthesis
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!("TTS service error {}: {}", status, detail);
            return Err(AvatarError::Synthesis);
        }

        // The service streams chunked audio; buffer it fully.
        let mut stream = response.bytes_stream();
        let mut audio = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                tracing::warn!("TTS stream interrupted: {}", e);
                AvatarError::Synthesis
            })?;
            audio.extend_from_slice(&chunk);
        }

        tracing::debug!("Synthesized {} bytes of audio", audio.len());
        Ok(audio)
    }
}

/// Deterministic synthesizer for tests and keyless local runs.
#[derive(Debug, Clone)]
pub struct MockSynthesizer {
    audio: Vec<u8>,
}

impl MockSynthesizer {
    pub fn new(audio: Vec<u8>) -> Self {
        Self { audio }
    }
}

impl Default for MockSynthesizer {
    fn default() -> Self {
        Self {
            audio: b"ID3mock-mp3-bytes".to_vec(),
        }
    }
}

#[async_trait]
impl VoiceSynthesizer for MockSynthesizer {
    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>> {
        Ok(self.audio.clone())
    }
}

/// Persist synthesized bytes as `output/audio.mp3` for the downstream
/// lipsync stage.
pub async fn save_to_file(
    workspace: &Workspace,
    ctx: &WorkflowContext,
    audio: &[u8],
) -> Result<PathBuf> {
    workspace
        .file_under(ctx, Bucket::Output, "audio.mp3", Some(audio))
        .await
}
