use anyhow::Context;
use avatar_core::{AvatarConfig, ConversationHistory};
use avatar_gateway::{build_router, AppState};
use avatar_llm::build_model;
use avatar_media::{
    ElevenLabsSynthesizer, LipsyncExtractor, MockSynthesizer, SystemRunner, Transcriber,
    VoiceSynthesizer, Workspace,
};
use avatar_pipeline::{Pipeline, QuizService};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Voice-driven conversational avatar backend")]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "avatar.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let config = AvatarConfig::load_or_default(&args.config);
    tokio::fs::create_dir_all(&config.paths.temp_root)
        .await
        .with_context(|| {
            format!(
                "Failed to create temp root {}",
                config.paths.temp_root.display()
            )
        })?;

    let runner = Arc::new(SystemRunner);
    let workspace = Workspace::new(&config.paths.temp_root);
    let transcriber = Transcriber::new(runner.clone(), &config.stt, &config.paths);
    let lipsync = LipsyncExtractor::new(
        runner,
        &config.paths,
        Duration::from_secs(config.stt.timeout_secs),
    );

    let synthesizer: Arc<dyn VoiceSynthesizer> = if config.tts.api_key.is_empty() {
        tracing::warn!("No TTS API key configured, using the mock synthesizer");
        Arc::new(MockSynthesizer::default())
    } else {
        Arc::new(ElevenLabsSynthesizer::new(&config.tts)?)
    };

    let model = build_model(&config.llm)?;
    info!(
        "LLM provider: {} (model {})",
        config.llm.provider, config.llm.model
    );

    let pipeline = Arc::new(Pipeline::new(
        workspace.clone(),
        transcriber.clone(),
        synthesizer,
        lipsync,
        model.clone(),
        Arc::new(ConversationHistory::new()),
        config.llm.system_prompt.clone(),
    ));
    let quiz = Arc::new(QuizService::new(
        workspace.clone(),
        transcriber,
        model,
        &config.paths.questions,
        &config.paths.question_assets,
    ));

    let app = build_router(AppState {
        pipeline,
        quiz,
        workspace,
    });

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Avatar backend listening on {}", addr);
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
