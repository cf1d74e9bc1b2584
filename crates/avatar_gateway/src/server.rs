//! Routes, multipart handling, and error→status mapping.
//!
//! Each request mints its own workflow context before any pipeline
//! stage runs; the context is destroyed on every exit path — success,
//! client error, or pipeline failure — so no request leaks its
//! workspace directory.

use avatar_core::{AvatarError, ChatResponse, QuizStartResponse};
use avatar_media::{Bucket, Workspace, WorkflowContext};
use avatar_pipeline::{Pipeline, QuizService};
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Upload size cap: 10 MiB.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Questions served per quiz round.
const QUIZ_ROUND_SIZE: usize = 5;

/// Shared state for the HTTP surface.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub quiz: Arc<QuizService>,
    pub workspace: Workspace,
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/chat", post(voice_chat))
        .route("/chat/text", post(text_chat))
        .route("/chat/clear", post(clear_history))
        .route("/quiz/start", get(quiz_start))
        .route("/quiz/start/test", get(quiz_start_test))
        .route("/quiz/evaluate", post(quiz_evaluate))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Error mapping
// ============================================================================

/// Wrapper mapping the pipeline taxonomy onto HTTP statuses. Client
/// input errors are 400 with a short message; everything else is a 500
/// whose body carries only the stage's opaque message.
pub struct ApiError(pub AvatarError);

impl From<AvatarError> for ApiError {
    fn from(e: AvatarError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            tracing::error!("Request failed: {}", self.0);
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

// ============================================================================
// Multipart handling
// ============================================================================

struct AudioUpload {
    ext: &'static str,
    bytes: Vec<u8>,
}

/// File extension for an allowed audio MIME type.
fn ext_for_mime(mime: &str) -> Option<&'static str> {
    match mime {
        "audio/webm" => Some("webm"),
        "audio/wav" => Some("wav"),
        "audio/mp3" | "audio/mpeg" => Some("mp3"),
        "audio/ogg" => Some("ogg"),
        "audio/mp4" => Some("mp4"),
        _ => None,
    }
}

/// Drain a multipart body into the `audio` part (if any) plus the text
/// fields.
async fn read_multipart(
    multipart: &mut Multipart,
) -> Result<(Option<AudioUpload>, HashMap<String, String>), AvatarError> {
    let mut audio = None;
    let mut fields = HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AvatarError::InvalidInput(format!("Malformed upload: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "audio" {
            let mime = field.content_type().unwrap_or_default().to_string();
            let ext = ext_for_mime(&mime)
                .ok_or_else(|| AvatarError::InvalidInput(format!("Invalid file type: {}", mime)))?;
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AvatarError::InvalidInput(format!("Malformed upload: {}", e)))?;
            audio = Some(AudioUpload {
                ext,
                bytes: bytes.to_vec(),
            });
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AvatarError::InvalidInput(format!("Malformed upload: {}", e)))?;
            fields.insert(name, value);
        }
    }
    Ok((audio, fields))
}

/// Stage the uploaded audio as `input/original.<ext>` in a fresh
/// context.
async fn stage_upload(
    workspace: &Workspace,
    ctx: &WorkflowContext,
    upload: &AudioUpload,
) -> Result<std::path::PathBuf, AvatarError> {
    workspace
        .file_under(
            ctx,
            Bucket::Input,
            &format!("original.{}", upload.ext),
            Some(&upload.bytes),
        )
        .await
}

// ============================================================================
// Route handlers
// ============================================================================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// POST /chat — voice chat (multipart audio upload).
async fn voice_chat(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ChatResponse>, ApiError> {
    let (audio, _) = read_multipart(&mut multipart).await?;
    let upload = audio
        .ok_or_else(|| AvatarError::InvalidInput("No audio file provided".to_string()))?;

    tracing::info!("Processing voice chat request");
    let ctx = WorkflowContext::new();
    let result = async {
        let audio_path = stage_upload(&state.workspace, &ctx, &upload).await?;
        state.pipeline.voice_chat(&ctx, &audio_path).await
    }
    .await;
    state.workspace.destroy(&ctx).await;
    result.map(Json).map_err(ApiError)
}

/// POST /chat/text — text chat.
async fn text_chat(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = body
        .get("message")
        .and_then(|m| m.as_str())
        .ok_or_else(|| AvatarError::InvalidInput("Message is required".to_string()))?
        .to_string();

    let ctx = WorkflowContext::new();
    let result = state.pipeline.text_chat(&ctx, message).await;
    state.workspace.destroy(&ctx).await;
    result.map(Json).map_err(ApiError)
}

/// POST /chat/clear — reset the conversation history.
async fn clear_history(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.pipeline.history().clear();
    tracing::info!("Conversation history cleared");
    Json(serde_json::json!({ "success": true }))
}

/// GET /quiz/start — one random quiz round.
async fn quiz_start(State(state): State<AppState>) -> Result<Json<QuizStartResponse>, ApiError> {
    tracing::info!("Starting quiz round");
    let questions = state.quiz.random_questions(QUIZ_ROUND_SIZE).await?;
    Ok(Json(QuizStartResponse { questions }))
}

/// GET /quiz/start/test — deterministic round for client testing.
async fn quiz_start_test(
    State(state): State<AppState>,
) -> Result<Json<QuizStartResponse>, ApiError> {
    tracing::info!("Starting quiz round (test/deterministic)");
    let questions = state.quiz.first_questions(QUIZ_ROUND_SIZE).await?;
    Ok(Json(QuizStartResponse { questions }))
}

/// POST /quiz/evaluate — score one spoken answer.
async fn quiz_evaluate(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<avatar_core::QuizEvaluateResponse>, ApiError> {
    let (audio, fields) = read_multipart(&mut multipart).await?;
    let question_text = fields
        .get("questionText")
        .ok_or_else(|| AvatarError::InvalidInput("questionText is required".to_string()))?;
    let reference_answer = fields
        .get("correctAnswer")
        .ok_or_else(|| AvatarError::InvalidInput("correctAnswer is required".to_string()))?;
    let upload = audio
        .ok_or_else(|| AvatarError::InvalidInput("No audio file provided".to_string()))?;

    let ctx = WorkflowContext::new();
    let result = async {
        let audio_path = stage_upload(&state.workspace, &ctx, &upload).await?;
        state
            .quiz
            .evaluate(&ctx, &audio_path, question_text, reference_answer)
            .await
    }
    .await;
    state.workspace.destroy(&ctx).await;

    if let Ok(r) = &result {
        tracing::info!("Quiz eval: correct={}", r.correct);
    }
    result.map(Json).map_err(ApiError)
}
