//! Keyword/emoji mapping from reply text to a facial expression.
//!
//! First match wins, in fixed priority order (happy → sad → angry →
//! surprised → funny). Deliberately a pure function so it can be
//! swapped for a classifier without touching the orchestrator.

use crate::types::FacialExpression;

const HAPPY: &[&str] = &["😊", "örül", "boldog", "szeret"];
const SAD: &[&str] = &["😢", "szomor", "sajnál"];
const ANGRY: &[&str] = &["😠", "mérges", "dühös"];
const SURPRISED: &[&str] = &["😮", "meglepő", "wow"];
const FUNNY: &[&str] = &["😜", "vicces", "haha"];

/// Map free reply text to one expressive state. Defaults to a friendly
/// smile when nothing matches.
pub fn detect_expression(text: &str) -> FacialExpression {
    let lower = text.to_lowercase();
    let contains_any = |cues: &[&str]| cues.iter().any(|c| lower.contains(c));

    if contains_any(HAPPY) {
        FacialExpression::Smile
    } else if contains_any(SAD) {
        FacialExpression::Sad
    } else if contains_any(ANGRY) {
        FacialExpression::Angry
    } else if contains_any(SURPRISED) {
        FacialExpression::Surprised
    } else if contains_any(FUNNY) {
        FacialExpression::FunnyFace
    } else {
        FacialExpression::Smile
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_smile() {
        assert_eq!(detect_expression("Ma szép idő van."), FacialExpression::Smile);
        assert_eq!(detect_expression(""), FacialExpression::Smile);
    }

    #[test]
    fn test_keyword_matches() {
        assert_eq!(detect_expression("Nagyon szomorú vagyok."), FacialExpression::Sad);
        assert_eq!(detect_expression("Ettől dühös leszek!"), FacialExpression::Angry);
        assert_eq!(detect_expression("Ez meglepő fordulat."), FacialExpression::Surprised);
        assert_eq!(detect_expression("haha, de vicces"), FacialExpression::FunnyFace);
    }

    #[test]
    fn test_emoji_matches() {
        assert_eq!(detect_expression("Szia! 😢"), FacialExpression::Sad);
        assert_eq!(detect_expression("😜"), FacialExpression::FunnyFace);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(detect_expression("BOLDOG vagyok"), FacialExpression::Smile);
    }

    #[test]
    fn test_priority_happy_beats_sad() {
        // Both a happy and a sad cue present: happy wins by priority.
        assert_eq!(
            detect_expression("Boldog vagyok, de sajnálom."),
            FacialExpression::Smile
        );
    }

    #[test]
    fn test_priority_sad_beats_funny() {
        assert_eq!(
            detect_expression("haha... azért szomorú ez"),
            FacialExpression::Sad
        );
    }
}
