//! ollama-chat - interactive terminal chat with a local Ollama server
//!
//! Streams replies from `/api/generate`, keeps the conversation in memory
//! and appends every exchange to a JSONL log that is replayed on startup.

pub mod cli;
pub mod config;
pub mod conversation;
pub mod core;
pub mod providers;

#[cfg(test)]
mod testing;
