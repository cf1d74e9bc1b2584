//! Media adapters for the avatar pipeline.
//!
//! Workflow-scoped filesystem workspaces, a narrow subprocess seam, and
//! the three engine adapters: speech-to-text (ffmpeg + whisper CLI),
//! text-to-speech (remote synthesis service), and lipsync extraction
//! (ffmpeg + rhubarb).

pub mod exec;
pub mod lipsync;
pub mod stt;
pub mod tts;
pub mod workspace;

pub use exec::{CommandRunner, RunOutput, ScriptedRunner, SystemRunner};
pub use lipsync::LipsyncExtractor;
pub use stt::Transcriber;
pub use tts::{ElevenLabsSynthesizer, MockSynthesizer, VoiceSynthesizer};
pub use workspace::{read_file_base64, write_base64_file, Bucket, Workspace, WorkflowContext};
