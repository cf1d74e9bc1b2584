//! Speech-to-text adapter: ffmpeg normalization + whisper CLI.
//!
//! Input audio is normalized to 16 kHz mono WAV in the workflow's
//! `input/` bucket, then recognized with a fixed target language. Every
//! engine failure — bad exit, timeout, missing transcript artifact —
//! collapses into the single opaque transcription error. An empty
//! transcript is a valid result; the caller decides what to do with it.

use crate::exec::CommandRunner;
use crate::workspace::{Bucket, Workspace, WorkflowContext};
use avatar_core::config::{PathsConfig, SttConfig};
use avatar_core::{AvatarError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

const TARGET_SAMPLE_RATE: &str = "16000";

#[derive(Clone)]
pub struct Transcriber {
    runner: Arc<dyn CommandRunner>,
    ffmpeg: PathBuf,
    whisper: PathBuf,
    model: String,
    language: String,
    timeout: Duration,
}

impl Transcriber {
    pub fn new(runner: Arc<dyn CommandRunner>, stt: &SttConfig, paths: &PathsConfig) -> Self {
        Self {
            runner,
            ffmpeg: paths.ffmpeg.clone(),
            whisper: paths.whisper.clone(),
            model: stt.model.clone(),
            language: stt.language.clone(),
            timeout: Duration::from_secs(stt.timeout_secs),
        }
    }

    /// Transcribe `audio_path`, staging intermediates in the workflow's
    /// `input/` bucket and persisting a copy of the transcript as
    /// `input/transcript.txt`.
    pub async fn transcribe(
        &self,
        workspace: &Workspace,
        ctx: &WorkflowContext,
        audio_path: &Path,
    ) -> Result<String> {
        let wav_path = self.normalize(workspace, ctx, audio_path).await?;

        let out_dir = wav_path
            .parent()
            .ok_or(AvatarError::Transcription)?
            .to_path_buf();
        let args = vec![
            wav_path.display().to_string(),
            "--model".to_string(),
            self.model.clone(),
            "--language".to_string(),
            self.language.clone(),
            "--output_format".to_string(),
            "txt".to_string(),
            "--output_dir".to_string(),
            out_dir.display().to_string(),
        ];

        let run = self
            .runner
            .run(&self.whisper, &args, self.timeout)
            .await
            .map_err(|e| {
                tracing::warn!("Whisper invocation failed: {}", e);
                AvatarError::Transcription
            })?;
        if !run.success {
            tracing::warn!("Whisper exited with {:?}: {}", run.code, run.stderr);
            return Err(AvatarError::Transcription);
        }

        // Whisper writes `<stem>.txt` next to the flag-selected dir.
        let txt_path = out_dir.join(format!(
            "{}.txt",
            wav_path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or(AvatarError::Transcription)?
        ));
        let raw = tokio::fs::read_to_string(&txt_path).await.map_err(|e| {
            tracing::warn!("Missing transcript artifact {}: {}", txt_path.display(), e);
            AvatarError::Transcription
        })?;
        let transcript = raw.trim().to_string();

        workspace
            .file_under(ctx, Bucket::Input, "transcript.txt", Some(transcript.as_bytes()))
            .await?;

        tracing::debug!("Transcription: {}", transcript);
        Ok(transcript)
    }

    /// Convert to 16 kHz mono WAV in `input/converted.wav`, skipping
    /// the conversion when the input is already a WAV container.
    async fn normalize(
        &self,
        workspace: &Workspace,
        ctx: &WorkflowContext,
        audio_path: &Path,
    ) -> Result<PathBuf> {
        if audio_path.extension().and_then(|e| e.to_str()) == Some("wav") {
            return Ok(audio_path.to_path_buf());
        }

        let wav_path = workspace
            .file_under(ctx, Bucket::Input, "converted.wav", None)
            .await?;
        let args = vec![
            "-i".to_string(),
            audio_path.display().to_string(),
            "-ar".to_string(),
            TARGET_SAMPLE_RATE.to_string(),
            "-ac".to_string(),
            "1".to_string(),
            "-y".to_string(),
            wav_path.display().to_string(),
        ];

        let run = self
            .runner
            .run(&self.ffmpeg, &args, self.timeout)
            .await
            .map_err(|e| {
                tracing::warn!("ffmpeg invocation failed: {}", e);
                AvatarError::Transcription
            })?;
        if !run.success {
            tracing::warn!("ffmpeg exited with {:?}: {}", run.code, run.stderr);
            return Err(AvatarError::Transcription);
        }
        Ok(wav_path)
    }
}
