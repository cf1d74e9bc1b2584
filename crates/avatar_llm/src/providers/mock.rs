//! Mock provider — deterministic replies for tests and keyless runs.

use crate::ChatModel;
use avatar_core::{ChatMessage, Result};
use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct MockChat {
    reply: String,
}

impl MockChat {
    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

impl Default for MockChat {
    fn default() -> Self {
        Self {
            reply: "(Mock) Szia! Örülök, hogy beszélgetünk.".to_string(),
        }
    }
}

#[async_trait]
impl ChatModel for MockChat {
    async fn chat(&self, _system: &str, messages: &[ChatMessage]) -> Result<String> {
        tracing::debug!("Mock chat over {} messages", messages.len());
        tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
        Ok(self.reply.clone())
    }
}
