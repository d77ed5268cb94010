//! Prompt templating
//!
//! The conversation template is fixed:
//!
//! ```text
//! {preamble}
//! {history block}
//! User: {input}
//! Assistant:
//! ```
//!
//! The history block is only filled in when there is history, and then
//! starts with a header line. The preamble and header can be replaced from
//! the `[prompt]` section of the config file.

use serde::{Deserialize, Serialize};

use crate::conversation::Role;

/// Built-in prompt text
pub mod builtin {
    /// Default assistant persona
    pub const PREAMBLE: &str = "You are a kind and helpful assistant.";

    /// Line introducing earlier turns
    pub const HISTORY_HEADER: &str = "Previous conversation:";
}

/// Persona text surrounding the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    #[serde(default = "default_preamble")]
    pub preamble: String,

    #[serde(default = "default_history_header")]
    pub history_header: String,
}

fn default_preamble() -> String {
    builtin::PREAMBLE.to_string()
}

fn default_history_header() -> String {
    builtin::HISTORY_HEADER.to_string()
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            preamble: default_preamble(),
            history_header: default_history_header(),
        }
    }
}

impl PromptTemplate {
    /// Render the prompt for one exchange. Blank history is ignored.
    pub fn render(&self, user_input: &str, history: Option<&str>) -> String {
        let history = history.map(str::trim).unwrap_or_default();
        let history_block = if history.is_empty() {
            String::new()
        } else {
            format!("{}\n{}", self.history_header, history)
        };

        format!(
            "{}\n{}\n{} {}\n{}",
            self.preamble,
            history_block,
            Role::User.label(),
            user_input,
            Role::Assistant.label()
        )
    }
}

/// Render with the built-in template
pub fn render_conversation_prompt(user_input: &str, history: Option<&str>) -> String {
    PromptTemplate::default().render(user_input, history)
}
