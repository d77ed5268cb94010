//! Conversation types

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Speaker label used in prompts and rendered history
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "User:",
            Role::Assistant => "Assistant:",
        }
    }
}

/// One user/assistant exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub user: String,
    pub assistant: String,
}

impl ConversationTurn {
    pub fn new(user: impl Into<String>, assistant: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            assistant: assistant.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.user.is_empty() && self.assistant.is_empty()
    }

    /// Render as `User: …` / `Assistant: …` lines
    pub fn render(&self) -> String {
        format!(
            "{} {}\n{} {}",
            Role::User.label(),
            self.user,
            Role::Assistant.label(),
            self.assistant
        )
    }
}
