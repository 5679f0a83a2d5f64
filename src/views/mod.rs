//! Conversation and transcript views: interaction state plus HTML rendering.

pub mod conversation;
pub mod html;
pub mod transcript;

pub use conversation::{ConversationSource, ConversationView, EMPTY_PLACEHOLDER};
pub use transcript::TranscriptForm;

/// One-line success message shown after an action completes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notice(&'static str);

impl Notice {
    pub const SPEAKER_UPDATED: Notice = Notice("Speaker updated successfully");
    pub const RECORDS_DELETED: Notice = Notice("Records deleted successfully");
    pub const CONVERSATION_DELETED: Notice = Notice("Conversation deleted successfully");
    pub const CONVERSATION_COPIED: Notice = Notice("Conversation copied to clipboard");
    pub const TRANSCRIPT_UPDATED: Notice = Notice("Transcript updated successfully");

    pub fn message(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}
