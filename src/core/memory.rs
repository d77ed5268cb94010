//! In-memory conversation history
//!
//! Holds the turns of the current session in order. It is not persisted on
//! its own: the chat log is the durable copy and is replayed at startup.

use crate::conversation::ConversationTurn;

use super::logger::LogEntry;

#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("Turn has neither user nor assistant text")]
    EmptyTurn,
}

/// Ordered, append-only record of turns
#[derive(Debug, Clone, Default)]
pub struct ConversationMemory {
    turns: Vec<ConversationTurn>,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn
    pub fn record_turn(&mut self, user: &str, assistant: &str) -> Result<(), MemoryError> {
        let turn = ConversationTurn::new(user, assistant);
        if turn.is_empty() {
            return Err(MemoryError::EmptyTurn);
        }
        self.turns.push(turn);
        Ok(())
    }

    /// Render every turn as `User:` / `Assistant:` lines, oldest first.
    /// Empty when nothing has been recorded.
    pub fn render_history(&self) -> String {
        self.turns
            .iter()
            .map(ConversationTurn::render)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Replay logged exchanges in order, returning how many were restored.
    /// Entries with neither prompt nor response are skipped.
    pub fn seed_from_log(&mut self, entries: impl IntoIterator<Item = LogEntry>) -> usize {
        let mut restored = 0;
        for entry in entries {
            match self.record_turn(&entry.prompt, &entry.response) {
                Ok(()) => restored += 1,
                Err(MemoryError::EmptyTurn) => {
                    tracing::trace!(timestamp = %entry.timestamp, "Skipping empty log entry");
                }
            }
        }
        restored
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
