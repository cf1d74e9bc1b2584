//! Narrow subprocess seam.
//!
//! The STT and lipsync adapters invoke external executables (ffmpeg,
//! whisper, rhubarb) through [`CommandRunner`] so the engine choice is
//! swappable and tests can fabricate tool behavior without spawning
//! anything.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

/// Outcome of one bounded subprocess run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl RunOutput {
    pub fn ok() -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub fn failed(stderr: &str) -> Self {
        Self {
            success: false,
            code: Some(1),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args`, bounded by `timeout`.
    ///
    /// A non-zero exit is reported in the returned [`RunOutput`];
    /// spawn failures and timeouts are `Err`.
    async fn run(&self, program: &Path, args: &[String], timeout: Duration) -> Result<RunOutput>;
}

/// Production runner: spawns the real executable via tokio.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, program: &Path, args: &[String], timeout: Duration) -> Result<RunOutput> {
        let child = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn {}", program.display()))?;

        // Dropping the future on timeout kills the child (kill_on_drop).
        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .with_context(|| format!("{} timed out after {:?}", program.display(), timeout))?
            .with_context(|| format!("Failed to wait for {}", program.display()))?;

        Ok(RunOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

type ScriptFn = dyn Fn(&Path, &[String]) -> Result<RunOutput> + Send + Sync;

/// Test double: a closure stands in for the external tool and may write
/// the artifact files the real tool would produce.
pub struct ScriptedRunner {
    script: Box<ScriptFn>,
}

impl ScriptedRunner {
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(&Path, &[String]) -> Result<RunOutput> + Send + Sync + 'static,
    {
        Self {
            script: Box::new(script),
        }
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, program: &Path, args: &[String], _timeout: Duration) -> Result<RunOutput> {
        (self.script)(program, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_scripted_runner_sees_program_and_args() {
        let runner = ScriptedRunner::new(|program, args| {
            assert!(program.ends_with("ffmpeg"));
            assert_eq!(args[0], "-i");
            Ok(RunOutput::ok())
        });
        let out = runner
            .run(
                &PathBuf::from("/usr/bin/ffmpeg"),
                &["-i".to_string(), "in.webm".to_string()],
                Duration::from_secs(1),
            )
            .await
            .unwrap();
        assert!(out.success);
    }

    #[tokio::test]
    async fn test_scripted_runner_propagates_failure() {
        let runner = ScriptedRunner::new(|_, _| Ok(RunOutput::failed("boom")));
        let out = runner
            .run(&PathBuf::from("tool"), &[], Duration::from_secs(1))
            .await
            .unwrap();
        assert!(!out.success);
        assert_eq!(out.stderr, "boom");
    }
}
