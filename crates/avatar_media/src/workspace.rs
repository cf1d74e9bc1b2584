//! Per-request isolated workflow workspaces.
//!
//! Every in-flight request gets `<temp_root>/<workflow_id>/{input,output}/`
//! for its intermediate artifacts. Contexts are identity-only until the
//! first `file_under` call; teardown is recursive, idempotent, and
//! best-effort on every exit path.

use avatar_core::{AvatarError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Identity of one request's workspace. Minting it does not touch the
/// filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowContext {
    workflow_id: Uuid,
}

impl WorkflowContext {
    pub fn new() -> Self {
        Self {
            workflow_id: Uuid::new_v4(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.workflow_id
    }
}

impl Default for WorkflowContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Artifact bucket inside a workflow directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Input,
    Output,
}

impl Bucket {
    fn dir_name(self) -> &'static str {
        match self {
            Bucket::Input => "input",
            Bucket::Output => "output",
        }
    }
}

/// Hands out paths under the shared temp root and guarantees teardown.
#[derive(Debug, Clone)]
pub struct Workspace {
    temp_root: PathBuf,
}

impl Workspace {
    pub fn new(temp_root: impl Into<PathBuf>) -> Self {
        Self {
            temp_root: temp_root.into(),
        }
    }

    /// Root directory of one workflow.
    pub fn context_dir(&self, ctx: &WorkflowContext) -> PathBuf {
        self.temp_root.join(ctx.workflow_id.to_string())
    }

    /// Path of `name` inside a bucket, creating the bucket directory if
    /// absent (idempotent) and optionally writing `content` to it.
    pub async fn file_under(
        &self,
        ctx: &WorkflowContext,
        bucket: Bucket,
        name: &str,
        content: Option<&[u8]>,
    ) -> Result<PathBuf> {
        let dir = self.context_dir(ctx).join(bucket.dir_name());
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(name);
        if let Some(bytes) = content {
            tokio::fs::write(&path, bytes).await?;
        }
        Ok(path)
    }

    /// Recursively remove the workflow directory.
    ///
    /// Safe to call multiple times, on partially-created trees, or on a
    /// context that never touched disk. Failures are logged, never
    /// propagated: teardown must not throw past the response boundary.
    pub async fn destroy(&self, ctx: &WorkflowContext) {
        let dir = self.context_dir(ctx);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!("Failed to tear down workflow {}: {}", ctx.workflow_id, e);
            }
        }
    }
}

/// Read a file and return its contents base64-encoded.
pub async fn read_file_base64(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path).await?;
    Ok(BASE64.encode(bytes))
}

/// Decode base64 and write the bytes to `path`.
pub async fn write_base64_file(encoded: &str, path: &Path) -> Result<()> {
    let bytes = BASE64
        .decode(encoded)
        .map_err(|_| AvatarError::InvalidInput("Invalid base64 payload".to_string()))?;
    tokio::fs::write(path, bytes).await?;
    Ok(())
}
