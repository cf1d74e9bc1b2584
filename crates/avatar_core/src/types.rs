//! Wire types shared across the pipeline, gateway, and quiz path.
//!
//! Serde renames keep the JSON contract the 3D front-end already
//! consumes (camelCase fields, single-letter mouth-shape codes).

use serde::{Deserialize, Serialize};

/// Mouth-shape code produced by the viseme extractor.
///
/// Eight phonetic classes (`A`–`H`) plus `X` for silence, matching the
/// Rhubarb alphabet. Time not covered by any cue maps to `X`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouthShape {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    X,
}

impl MouthShape {
    /// The resting / silence shape.
    pub const SILENCE: MouthShape = MouthShape::X;
}

/// One timed mouth-shape cue: `[start, end)` in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MouthCue {
    pub start: f64,
    pub end: f64,
    pub value: MouthShape,
}

/// Ordered cue sequence driving mouth animation.
///
/// May be empty: lipsync extraction is best-effort and the renderer
/// degrades to a neutral mouth.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LipsyncData {
    #[serde(rename = "mouthCues", default)]
    pub mouth_cues: Vec<MouthCue>,
}

impl LipsyncData {
    /// Resolve the mouth shape at time `t` (seconds).
    ///
    /// Gaps between cues, and any `t` before the first or after the
    /// last cue, resolve to the silence shape.
    pub fn shape_at(&self, t: f64) -> MouthShape {
        self.mouth_cues
            .iter()
            .find(|c| t >= c.start && t < c.end)
            .map(|c| c.value)
            .unwrap_or(MouthShape::SILENCE)
    }

    /// Whether every cue has `start < end` and cues are ordered by
    /// ascending `start`.
    pub fn is_well_formed(&self) -> bool {
        self.mouth_cues.iter().all(|c| c.start < c.end)
            && self
                .mouth_cues
                .windows(2)
                .all(|w| w[0].start <= w[1].start)
    }
}

/// Expressive state driving non-mouth facial animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FacialExpression {
    Default,
    Smile,
    Sad,
    Angry,
    Surprised,
    FunnyFace,
    Crazy,
}

/// Speaker of one conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The bundle returned for one chat turn: reply text, synthesized
/// audio (base64), lipsync cues, and a facial expression tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub text: String,
    /// Base64-encoded audio bytes.
    pub audio: String,
    pub lipsync: LipsyncData,
    pub facial_expression: FacialExpression,
}

/// One static quiz catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub question: String,
    pub answer: String,
    #[serde(rename = "englishTranslation", default)]
    pub english_translation: String,
}

/// A quiz question as served to the client: catalog entry plus the
/// pre-baked prompt audio and lipsync, and a zero-based sequence index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub index: usize,
    pub text: String,
    pub answer: String,
    pub english_translation: String,
    /// Base64-encoded pre-generated prompt audio.
    pub audio: String,
    pub lipsync: LipsyncData,
    pub facial_expression: FacialExpression,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizStartResponse {
    pub questions: Vec<QuizQuestion>,
}

/// Verdict for one spoken quiz answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizEvaluateResponse {
    pub correct: bool,
    pub explanation: String,
    pub user_transcript: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cue(start: f64, end: f64, value: MouthShape) -> MouthCue {
        MouthCue { start, end, value }
    }

    #[test]
    fn test_mouth_cue_serde_single_letters() {
        let json = r#"{"start":0.0,"end":0.35,"value":"B"}"#;
        let c: MouthCue = serde_json::from_str(json).unwrap();
        assert_eq!(c.value, MouthShape::B);
        assert_eq!(serde_json::to_string(&c.value).unwrap(), "\"B\"");
    }

    #[test]
    fn test_lipsync_parses_rhubarb_output() {
        let json = r#"{"metadata":{"duration":1.2},"mouthCues":[
            {"start":0.0,"end":0.5,"value":"X"},
            {"start":0.5,"end":1.2,"value":"C"}]}"#;
        let data: LipsyncData = serde_json::from_str(json).unwrap();
        assert_eq!(data.mouth_cues.len(), 2);
        assert!(data.is_well_formed());
    }

    #[test]
    fn test_lipsync_missing_cues_defaults_empty() {
        let data: LipsyncData = serde_json::from_str("{}").unwrap();
        assert!(data.mouth_cues.is_empty());
    }

    #[test]
    fn test_shape_at_outside_cues_is_silence() {
        let data = LipsyncData {
            mouth_cues: vec![cue(0.5, 1.0, MouthShape::B), cue(1.2, 1.5, MouthShape::D)],
        };
        assert_eq!(data.shape_at(0.0), MouthShape::X);
        assert_eq!(data.shape_at(0.7), MouthShape::B);
        // Gap between cues resolves to silence.
        assert_eq!(data.shape_at(1.1), MouthShape::X);
        assert_eq!(data.shape_at(1.3), MouthShape::D);
        assert_eq!(data.shape_at(2.0), MouthShape::X);
    }

    #[test]
    fn test_shape_at_end_is_exclusive() {
        let data = LipsyncData {
            mouth_cues: vec![cue(0.0, 1.0, MouthShape::A)],
        };
        assert_eq!(data.shape_at(1.0), MouthShape::X);
    }

    #[test]
    fn test_well_formed_rejects_inverted_cue() {
        let data = LipsyncData {
            mouth_cues: vec![cue(1.0, 0.5, MouthShape::A)],
        };
        assert!(!data.is_well_formed());
    }

    #[test]
    fn test_facial_expression_camel_case() {
        assert_eq!(
            serde_json::to_string(&FacialExpression::FunnyFace).unwrap(),
            "\"funnyFace\""
        );
        assert_eq!(
            serde_json::to_string(&FacialExpression::Default).unwrap(),
            "\"default\""
        );
    }

    #[test]
    fn test_chat_response_json_shape() {
        let resp = ChatResponse {
            text: "Szia!".into(),
            audio: "aGVsbG8=".into(),
            lipsync: LipsyncData::default(),
            facial_expression: FacialExpression::Smile,
        };
        let v: serde_json::Value = serde_json::to_value(&resp).unwrap();
        assert_eq!(v["facialExpression"], "smile");
        assert!(v["lipsync"]["mouthCues"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_role_lowercase() {
        let msg = ChatMessage::user("hello");
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["role"], "user");
    }

    #[test]
    fn test_quiz_evaluate_response_camel_case() {
        let resp = QuizEvaluateResponse {
            correct: false,
            explanation: String::new(),
            user_transcript: "focizni".into(),
        };
        let v = serde_json::to_value(&resp).unwrap();
        assert_eq!(v["userTranscript"], "focizni");
    }
}
