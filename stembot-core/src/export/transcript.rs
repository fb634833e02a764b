//! Transcript rendering and the document-encoder boundary

use std::path::Path;
use std::str::FromStr;

use crate::session::{Message, Role};
use crate::utils::write_atomic;

/// Which roles an export includes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoleFilter {
    /// Everything
    #[default]
    Both,
    /// Only the user's messages
    UserOnly,
    /// Only the assistant's messages
    AssistantOnly,
}

impl RoleFilter {
    /// Whether a role passes this filter
    pub fn includes(&self, role: Role) -> bool {
        match self {
            RoleFilter::Both => true,
            RoleFilter::UserOnly => role == Role::User,
            RoleFilter::AssistantOnly => role == Role::Assistant,
        }
    }
}

/// One structured transcript entry for spreadsheet/slide encoders.
///
/// Preserves role, content, and the separated reasoning text, which every
/// document encoder must carry through.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptRow {
    /// Capitalized role name
    pub role: String,
    /// Message content
    pub content: String,
    /// Separated reasoning text, when the message has one
    pub reasoning: Option<String>,
}

/// Build the structured row form of a conversation
pub fn transcript_rows(messages: &[Message], filter: RoleFilter) -> Vec<TranscriptRow> {
    messages
        .iter()
        .filter(|msg| filter.includes(msg.role))
        .map(|msg| TranscriptRow {
            role: msg.role.display_name().to_string(),
            content: msg.content.trim().to_string(),
            reasoning: msg.reasoning_text().map(str::to_string),
        })
        .collect()
}

/// Render the plain-text transcript.
///
/// `Role: content` paragraphs separated by blank lines; an assistant
/// message's reasoning follows as its own delineated block.
pub fn render_transcript(messages: &[Message], filter: RoleFilter) -> String {
    let mut blocks = Vec::new();
    for msg in messages {
        if !filter.includes(msg.role) {
            continue;
        }
        match msg.role {
            Role::User => {
                blocks.push(format!("User: {}", msg.content.trim()));
            }
            Role::Assistant => {
                let content = msg.content.trim();
                if content.is_empty() {
                    blocks.push("Assistant: (no answer content)".to_string());
                } else {
                    blocks.push(format!("Assistant: {}", content));
                }
                if let Some(reasoning) = msg.reasoning_text() {
                    blocks.push(format!(
                        "  Reasoning:\n  ---------------------\n{}\n  ---------------------",
                        reasoning
                    ));
                }
            }
        }
    }
    blocks.join("\n\n")
}

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Text,
    Word,
    Pdf,
    Excel,
    PowerPoint,
}

impl ExportFormat {
    /// File extension, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Word => "docx",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Excel => "xlsx",
            ExportFormat::PowerPoint => "pptx",
        }
    }

    /// Human-readable name
    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::Text => "Text",
            ExportFormat::Word => "Word",
            ExportFormat::Pdf => "PDF",
            ExportFormat::Excel => "Excel",
            ExportFormat::PowerPoint => "PowerPoint",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(ExportFormat::Text),
            "word" | "docx" => Ok(ExportFormat::Word),
            "pdf" => Ok(ExportFormat::Pdf),
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            "powerpoint" | "pptx" => Ok(ExportFormat::PowerPoint),
            other => Err(crate::Error::Export(format!(
                "unknown export format '{}'",
                other
            ))),
        }
    }
}

/// Encodes a conversation into one document format.
///
/// The Word/PDF/Excel/PowerPoint encoders are external collaborators that
/// plug in here; they receive the same filtered messages and must preserve
/// role, content, and reasoning.
pub trait DocumentEncoder {
    /// Format this encoder produces
    fn format(&self) -> ExportFormat;

    /// Encode the filtered conversation into document bytes
    fn encode(&self, messages: &[Message], filter: RoleFilter) -> crate::Result<Vec<u8>>;
}

/// Plain-text document encoder
pub struct TextEncoder;

impl DocumentEncoder for TextEncoder {
    fn format(&self) -> ExportFormat {
        ExportFormat::Text
    }

    fn encode(&self, messages: &[Message], filter: RoleFilter) -> crate::Result<Vec<u8>> {
        Ok(render_transcript(messages, filter).into_bytes())
    }
}

/// Encode a conversation and write it to `path` atomically
pub fn export_to_file<P: AsRef<Path>>(
    path: P,
    encoder: &dyn DocumentEncoder,
    messages: &[Message],
    filter: RoleFilter,
) -> crate::Result<()> {
    if !messages.iter().any(|msg| filter.includes(msg.role)) {
        return Err(crate::Error::Export(
            "no messages match the selected content filter".to_string(),
        ));
    }
    let bytes = encoder.encode(messages, filter)?;
    write_atomic(path.as_ref(), &bytes)?;
    Ok(())
}
