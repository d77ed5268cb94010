//! Core chat components
//!
//! This module contains the exchange orchestration, the in-memory history
//! and the durable chat log.

mod chat;
mod logger;
mod memory;

pub use chat::{ChatEngine, ChatError, ChatResponse};
pub use logger::{ChatLogger, LogEntry};
pub use memory::ConversationMemory;
