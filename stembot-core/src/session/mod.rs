//! Session management for conversation history
//!
//! Each session is one JSON file of messages under a per-user directory;
//! identifiers embed their creation timestamp.

pub mod files;
pub mod store;

pub use files::{DeleteReport, SessionInfo, SessionStore};
pub use store::{Message, Role};
