//! Offline pre-generation of quiz question assets.
//!
//! For every catalog entry without assets, synthesizes the question
//! prompt and extracts its lipsync cues under a throwaway workflow
//! context, then copies `<id>.mp3` and `<id>.json` into the assets
//! directory the quiz path serves from.

use anyhow::Context;
use avatar_core::{AvatarConfig, Question};
use avatar_media::{
    tts, ElevenLabsSynthesizer, LipsyncExtractor, SystemRunner, VoiceSynthesizer, Workspace,
    WorkflowContext,
};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Pre-generate quiz question audio and lipsync assets")]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "avatar.toml")]
    config: String,

    /// Regenerate assets even when they already exist
    #[arg(long)]
    force: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();
    let config = AvatarConfig::load_or_default(&args.config);

    anyhow::ensure!(
        !config.tts.api_key.is_empty(),
        "A TTS API key is required for asset pre-generation"
    );

    let raw = tokio::fs::read_to_string(&config.paths.questions)
        .await
        .with_context(|| format!("Failed to read {}", config.paths.questions.display()))?;
    let questions: Vec<Question> =
        serde_json::from_str(&raw).context("Failed to parse question catalog")?;

    tokio::fs::create_dir_all(&config.paths.question_assets).await?;
    tokio::fs::create_dir_all(&config.paths.temp_root).await?;

    let runner = Arc::new(SystemRunner);
    let workspace = Workspace::new(&config.paths.temp_root);
    let synthesizer = ElevenLabsSynthesizer::new(&config.tts)?;
    let lipsync = LipsyncExtractor::new(
        runner,
        &config.paths,
        Duration::from_secs(config.stt.timeout_secs),
    );

    let mut generated = 0usize;
    for question in &questions {
        let mp3_path = config
            .paths
            .question_assets
            .join(format!("{}.mp3", question.id));
        let json_path = config
            .paths
            .question_assets
            .join(format!("{}.json", question.id));
        if !args.force && mp3_path.exists() && json_path.exists() {
            info!("Skipping {} (assets exist)", question.id);
            continue;
        }

        info!("Generating assets for {}: {}", question.id, question.question);
        let ctx = WorkflowContext::new();
        let result = generate_one(
            &workspace,
            &ctx,
            &synthesizer,
            &lipsync,
            question,
            &mp3_path,
            &json_path,
        )
        .await;
        workspace.destroy(&ctx).await;
        result?;
        generated += 1;
    }

    info!(
        "Done: {} generated, {} skipped",
        generated,
        questions.len() - generated
    );
    Ok(())
}

async fn generate_one(
    workspace: &Workspace,
    ctx: &WorkflowContext,
    synthesizer: &ElevenLabsSynthesizer,
    lipsync: &LipsyncExtractor,
    question: &Question,
    mp3_path: &std::path::Path,
    json_path: &std::path::Path,
) -> anyhow::Result<()> {
    let audio = synthesizer
        .synthesize(&question.question)
        .await
        .with_context(|| format!("Synthesis failed for question {}", question.id))?;
    let staged = tts::save_to_file(workspace, ctx, &audio).await?;

    let cues = lipsync.generate(workspace, ctx, &staged).await;
    if cues.mouth_cues.is_empty() {
        warn!(
            "No mouth cues extracted for {}; the avatar will keep a neutral mouth",
            question.id
        );
    }

    tokio::fs::write(mp3_path, &audio).await?;
    tokio::fs::write(json_path, serde_json::to_string_pretty(&cues)?).await?;
    Ok(())
}
