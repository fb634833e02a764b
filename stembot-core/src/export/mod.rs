//! Conversation export and transcript presentation
//!
//! Renders a message sequence to the plain-text transcript and the
//! structured rows that document encoders consume, and paginates growing
//! transcripts for display.

pub mod page;
pub mod transcript;

pub use page::{clamp_page, page_count, page_slice};
pub use transcript::{
    export_to_file, render_transcript, transcript_rows, DocumentEncoder, ExportFormat, RoleFilter,
    TextEncoder, TranscriptRow,
};
