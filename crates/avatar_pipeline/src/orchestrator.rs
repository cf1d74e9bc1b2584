//! The request-scoped chat pipeline.
//!
//! Voice path: transcribe → (abort on empty transcript) → history +
//! LLM reply → synthesize → lipsync (best-effort) → assemble response.
//! Text path is identical minus transcription. Stages run strictly in
//! order; every stage stages its artifacts inside the caller-supplied
//! workflow context, which the caller tears down on all exit paths.

use avatar_core::{
    detect_expression, AvatarError, ChatMessage, ChatResponse, ConversationHistory, Result,
};
use avatar_llm::ChatModel;
use avatar_media::{
    read_file_base64, tts, Bucket, LipsyncExtractor, Transcriber, VoiceSynthesizer, Workspace,
    WorkflowContext,
};
use std::path::Path;
use std::sync::Arc;

pub struct Pipeline {
    workspace: Workspace,
    transcriber: Transcriber,
    synthesizer: Arc<dyn VoiceSynthesizer>,
    lipsync: LipsyncExtractor,
    model: Arc<dyn ChatModel>,
    history: Arc<ConversationHistory>,
    system_prompt: String,
}

impl Pipeline {
    pub fn new(
        workspace: Workspace,
        transcriber: Transcriber,
        synthesizer: Arc<dyn VoiceSynthesizer>,
        lipsync: LipsyncExtractor,
        model: Arc<dyn ChatModel>,
        history: Arc<ConversationHistory>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            workspace,
            transcriber,
            synthesizer,
            lipsync,
            model,
            history,
            system_prompt: system_prompt.into(),
        }
    }

    /// Voice chat: uploaded audio in the context's `input/` bucket
    /// through the full stage sequence.
    pub async fn voice_chat(
        &self,
        ctx: &WorkflowContext,
        audio_path: &Path,
    ) -> Result<ChatResponse> {
        let transcript = self
            .transcriber
            .transcribe(&self.workspace, ctx, audio_path)
            .await?;
        if transcript.trim().is_empty() {
            return Err(AvatarError::EmptyTranscript);
        }
        tracing::info!("User said: {}", transcript);
        self.respond(ctx, transcript).await
    }

    /// Text chat: same pipeline without the transcription stage.
    pub async fn text_chat(&self, ctx: &WorkflowContext, message: String) -> Result<ChatResponse> {
        tracing::info!("Processing text chat: {}", message);
        self.respond(ctx, message).await
    }

    async fn respond(&self, ctx: &WorkflowContext, user_text: String) -> Result<ChatResponse> {
        self.history.append(ChatMessage::user(user_text));
        let context = self.history.snapshot();

        let reply = self.model.chat(&self.system_prompt, &context).await?;
        self.history.append(ChatMessage::assistant(reply.clone()));

        self.workspace
            .file_under(ctx, Bucket::Output, "response.txt", Some(reply.as_bytes()))
            .await?;

        let audio = self.synthesizer.synthesize(&reply).await?;
        let audio_path = tts::save_to_file(&self.workspace, ctx, &audio).await?;

        // Best-effort: an extraction failure yields empty cues, never an
        // error.
        let lipsync = self.lipsync.generate(&self.workspace, ctx, &audio_path).await;

        let audio_b64 = read_file_base64(&audio_path).await?;
        let facial_expression = detect_expression(&reply);

        Ok(ChatResponse {
            text: reply,
            audio: audio_b64,
            lipsync,
            facial_expression,
        })
    }

    pub fn history(&self) -> &Arc<ConversationHistory> {
        &self.history
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }
}
