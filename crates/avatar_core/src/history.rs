//! Process-wide bounded conversation history.
//!
//! Single active session for the process lifetime. The cap is enforced
//! on every append: when the log exceeds [`HISTORY_CAP`] entries, the
//! oldest user+assistant *pair* is dropped so the head never starts
//! with a dangling assistant turn.

use crate::types::ChatMessage;
use std::sync::{Mutex, PoisonError};

/// Maximum number of stored turns.
pub const HISTORY_CAP: usize = 20;

#[derive(Debug, Default)]
pub struct ConversationHistory {
    turns: Mutex<Vec<ChatMessage>>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one turn, trimming the oldest pair if the cap is exceeded.
    pub fn append(&self, message: ChatMessage) {
        let mut turns = self.lock();
        turns.push(message);
        if turns.len() > HISTORY_CAP {
            turns.drain(..2);
        }
    }

    /// Ordered copy of the current history.
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.lock().clone()
    }

    /// Reset to empty. The only mutator besides `append`.
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ChatMessage>> {
        // A panic while holding the lock leaves plain Vec data intact.
        self.turns.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
