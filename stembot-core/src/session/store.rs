//! Chat message types

use serde::{Deserialize, Serialize};

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Wire-format name ("user" / "assistant")
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Capitalized name for transcripts
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

/// A single chat message
///
/// The optional field names (`thinking_process`, `time_taken`) are kept from
/// the original session-file format so existing files still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message role
    pub role: Role,
    /// User-facing message content
    pub content: String,
    /// Reasoning segment split out of an assistant reply, if any
    #[serde(
        rename = "thinking_process",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub reasoning: Option<String>,
    /// Wall-clock seconds the exchange took (assistant messages only)
    #[serde(rename = "time_taken", default, skip_serializing_if = "Option::is_none")]
    pub elapsed_seconds: Option<f64>,
}

impl Message {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            reasoning: None,
            elapsed_seconds: None,
        }
    }

    /// Create an assistant message
    pub fn assistant(
        content: impl Into<String>,
        reasoning: Option<String>,
        elapsed_seconds: Option<f64>,
    ) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            reasoning,
            elapsed_seconds,
        }
    }

    /// Reasoning text, if present and non-empty
    pub fn reasoning_text(&self) -> Option<&str> {
        self.reasoning
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
