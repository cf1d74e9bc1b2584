//! Caller-safe error taxonomy for the pipeline.
//!
//! Every stage boundary collapses engine-specific failures (subprocess
//! exit codes, HTTP errors, parse failures) into one of these variants.
//! Raw stderr and provider payloads go to the log, never to the caller.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AvatarError {
    /// The request itself is malformed (missing file, missing field).
    #[error("{0}")]
    InvalidInput(String),

    /// Transcription succeeded but produced no usable text.
    #[error("Could not transcribe audio")]
    EmptyTranscript,

    /// The STT engine failed (bad exit, timeout, missing artifact).
    #[error("Failed to transcribe audio")]
    Transcription,

    /// The voice-synthesis service failed.
    #[error("Failed to synthesize speech")]
    Synthesis,

    /// The language model call failed or returned malformed structured
    /// output.
    #[error("Failed to get response from the language model")]
    LanguageModel,

    /// The quiz catalog or its pre-generated assets are inconsistent.
    #[error("Quiz catalog error: {0}")]
    Catalog(String),

    /// Filesystem failure inside the workflow workspace.
    #[error("Workspace I/O failure")]
    Workspace(#[from] std::io::Error),
}

impl AvatarError {
    /// Client input errors map to a 400-class response; everything else
    /// is a server-side failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AvatarError::InvalidInput(_) | AvatarError::EmptyTranscript
        )
    }
}

pub type Result<T> = std::result::Result<T, AvatarError>;
