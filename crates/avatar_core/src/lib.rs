pub mod config;
pub mod error;
pub mod expression;
pub mod history;
pub mod types;

pub use config::AvatarConfig;
pub use error::{AvatarError, Result};
pub use expression::detect_expression;
pub use history::ConversationHistory;
pub use types::{
    ChatMessage, ChatResponse, FacialExpression, LipsyncData, MouthCue, MouthShape, Question,
    QuizEvaluateResponse, QuizQuestion, QuizStartResponse, Role,
};
