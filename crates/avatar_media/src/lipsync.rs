//! Lipsync cue extraction: ffmpeg container convert + rhubarb.
//!
//! Unlike STT and TTS, this stage never fails the request. Any error —
//! missing tool, bad audio, unparseable output — degrades to an empty
//! cue list, which the renderer shows as a neutral mouth. Intermediates
//! live in the caller's workflow context and are torn down with it.

use crate::exec::CommandRunner;
use crate::workspace::{Bucket, Workspace, WorkflowContext};
use avatar_core::config::PathsConfig;
use avatar_core::{LipsyncData, MouthCue};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct LipsyncExtractor {
    runner: Arc<dyn CommandRunner>,
    ffmpeg: PathBuf,
    rhubarb: PathBuf,
    timeout: Duration,
}

impl LipsyncExtractor {
    pub fn new(runner: Arc<dyn CommandRunner>, paths: &PathsConfig, timeout: Duration) -> Self {
        Self {
            runner,
            ffmpeg: paths.ffmpeg.clone(),
            rhubarb: paths.rhubarb.clone(),
            timeout,
        }
    }

    /// Extract mouth cues for `audio_path`. Infallible by contract:
    /// failures log a warning and yield empty cues.
    pub async fn generate(
        &self,
        workspace: &Workspace,
        ctx: &WorkflowContext,
        audio_path: &Path,
    ) -> LipsyncData {
        match self.try_generate(workspace, ctx, audio_path).await {
            Ok(data) => {
                tracing::debug!("Generated {} mouth cues", data.mouth_cues.len());
                data
            }
            Err(e) => {
                tracing::warn!("Lipsync generation failed, degrading to empty cues: {}", e);
                LipsyncData::default()
            }
        }
    }

    async fn try_generate(
        &self,
        workspace: &Workspace,
        ctx: &WorkflowContext,
        audio_path: &Path,
    ) -> anyhow::Result<LipsyncData> {
        // Rhubarb wants a WAV container.
        let wav_path = workspace
            .file_under(ctx, Bucket::Output, "audio.wav", None)
            .await?;
        let convert_args = vec![
            "-y".to_string(),
            "-i".to_string(),
            audio_path.display().to_string(),
            wav_path.display().to_string(),
        ];
        let run = self.runner.run(&self.ffmpeg, &convert_args, self.timeout).await?;
        anyhow::ensure!(run.success, "ffmpeg exited with {:?}: {}", run.code, run.stderr);

        let json_path = workspace
            .file_under(ctx, Bucket::Output, "lipsync.json", None)
            .await?;
        let rhubarb_args = vec![
            "-f".to_string(),
            "json".to_string(),
            "-o".to_string(),
            json_path.display().to_string(),
            wav_path.display().to_string(),
            "-r".to_string(),
            "phonetic".to_string(),
        ];
        let run = self.runner.run(&self.rhubarb, &rhubarb_args, self.timeout).await?;
        anyhow::ensure!(run.success, "rhubarb exited with {:?}: {}", run.code, run.stderr);

        let raw = tokio::fs::read_to_string(&json_path).await?;
        let mut data: LipsyncData = serde_json::from_str(&raw)?;
        data.mouth_cues = sanitize_cues(data.mouth_cues);
        Ok(data)
    }
}

/// Defensive repair of extractor output: drop cues with `start >= end`
/// and order the rest by ascending `start`. The extractor is expected
/// to produce well-formed output, but the published invariant must hold
/// even when it does not.
fn sanitize_cues(mut cues: Vec<MouthCue>) -> Vec<MouthCue> {
    cues.retain(|c| c.start < c.end);
    cues.sort_by(|a, b| a.start.total_cmp(&b.start));
    cues
}
