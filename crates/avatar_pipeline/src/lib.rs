//! Request orchestration: the voice/text chat pipeline and the quiz
//! evaluation variant.

pub mod orchestrator;
pub mod quiz;

pub use orchestrator::Pipeline;
pub use quiz::QuizService;
