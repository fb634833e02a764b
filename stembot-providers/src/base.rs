//! Base trait for chat-completion endpoints

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for endpoint operations.
///
/// Variants are split the way callers need to classify them: transport
/// failures, HTTP error statuses, bodies that are not JSON, and JSON bodies
/// missing the expected fields.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (HTTP {status}): {detail}")]
    Api { status: u16, detail: String },

    #[error("Malformed response body: {0}")]
    MalformedBody(String),

    #[error("Unexpected response structure: {0}")]
    UnexpectedStructure(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// A message in the chat conversation, as sent over the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }
}

/// A raw, unprocessed reply from the endpoint
#[derive(Debug, Clone)]
pub struct ChatReply {
    /// The assistant's raw content, reasoning markers included
    pub content: String,
}

/// Trait for chat-completion endpoints
#[async_trait]
pub trait ChatEndpoint: Send + Sync {
    /// Send a chat completion request
    async fn chat(&self, messages: Vec<Message>, model: Option<String>)
        -> ProviderResult<ChatReply>;

    /// List the models installed on the endpoint.
    ///
    /// Failure degrades to an empty list; callers never see an error.
    async fn list_models(&self) -> Vec<String>;

    /// Get the default model for this endpoint
    fn default_model(&self) -> String;
}
