//! Model endpoint integration for stembot
//!
//! This crate provides the chat-completion endpoint abstraction and the
//! Ollama HTTP client.

pub mod base;
pub mod ollama;

pub use base::{ChatEndpoint, ChatReply, Message, ProviderError, ProviderResult};
pub use ollama::OllamaClient;
