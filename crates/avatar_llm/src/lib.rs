//! Language-model clients for the avatar pipeline.
//!
//! Two call shapes: free-text chat over an ordered turn list, and a
//! structured two-field verdict used by the quiz evaluator. Provider
//! failures collapse into the single opaque language-model error; raw
//! payloads go to the log only.

pub mod providers;

use avatar_core::{AvatarError, ChatMessage, Result};
use avatar_core::config::LlmConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use providers::mock::MockChat;
pub use providers::ollama::OllamaChat;
pub use providers::openai::OpenAiChat;

/// Structured verdict for one quiz answer. Exactly two fields; anything
/// else the model produces is rejected, not guessed at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnswerVerdict {
    pub correct: bool,
    pub explanation: String,
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Free-text reply for an ordered turn list under a system
    /// instruction.
    async fn chat(&self, system: &str, messages: &[ChatMessage]) -> Result<String>;

    /// Structured judgment call: single user turn, strict two-field
    /// result. Malformed output is a language-model error (callers may
    /// degrade it).
    async fn judge(&self, system: &str, user: &str) -> Result<AnswerVerdict> {
        let raw = self
            .chat(system, &[ChatMessage::user(user)])
            .await?;
        parse_verdict(&raw).ok_or_else(|| {
            tracing::warn!("Malformed structured LLM output: {}", raw);
            AvatarError::LanguageModel
        })
    }
}

/// Extract and strictly parse the verdict object from raw model output.
///
/// Models often wrap the JSON in prose or code fences; the outermost
/// `{...}` span is taken, then strict-deserialized. Free-form output
/// (no object, missing fields, extra fields) yields `None`.
pub fn parse_verdict(raw: &str) -> Option<AnswerVerdict> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&raw[start..=end]).ok()
}

/// Build the configured provider.
pub fn build_model(cfg: &LlmConfig) -> anyhow::Result<Arc<dyn ChatModel>> {
    match cfg.provider.as_str() {
        "ollama" => Ok(Arc::new(OllamaChat::new(cfg)?)),
        "openai" => Ok(Arc::new(OpenAiChat::new(cfg)?)),
        "mock" => Ok(Arc::new(MockChat::default())),
        other => anyhow::bail!("Unknown LLM provider: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_verdict_plain_json() {
        let v = parse_verdict(r#"{"correct": true, "explanation": "Helyes válasz."}"#).unwrap();
        assert!(v.correct);
        assert_eq!(v.explanation, "Helyes válasz.");
    }

    #[test]
    fn test_parse_verdict_wrapped_in_prose() {
        let raw = "Sure! Here is the result:\n```json\n{\"correct\": false, \"explanation\": \"Nem.\"}\n```";
        let v = parse_verdict(raw).unwrap();
        assert!(!v.correct);
    }

    #[test]
    fn test_parse_verdict_rejects_free_form() {
        assert!(parse_verdict("I think the answer is correct!").is_none());
    }

    #[test]
    fn test_parse_verdict_rejects_missing_field() {
        assert!(parse_verdict(r#"{"correct": true}"#).is_none());
    }

    #[test]
    fn test_parse_verdict_rejects_extra_fields() {
        assert!(parse_verdict(r#"{"correct": true, "explanation": "x", "score": 0.9}"#).is_none());
    }

    #[test]
    fn test_build_model_rejects_unknown_provider() {
        let cfg = LlmConfig {
            provider: "carrier-pigeon".to_string(),
            ..LlmConfig::default()
        };
        assert!(build_model(&cfg).is_err());
    }

    #[tokio::test]
    async fn test_default_judge_degrades_via_error() {
        let model = MockChat::with_reply("definitely correct, trust me");
        let err = model.judge("system", "user").await.unwrap_err();
        assert!(matches!(err, AvatarError::LanguageModel));
    }

    #[tokio::test]
    async fn test_default_judge_parses_structured_reply() {
        let model = MockChat::with_reply(r#"{"correct": true, "explanation": "Jó."}"#);
        let v = model.judge("system", "user").await.unwrap();
        assert!(v.correct);
    }
}
