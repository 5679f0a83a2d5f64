// Database models - Transcript
use serde::{Deserialize, Serialize};

/// A transcript segment (one speaker-attributed utterance)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptSegment {
    pub id: i64,
    pub session_id: String,
    pub conversation: i64,
    pub speaker: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub duration: String,
    pub content: String,
}

impl TranscriptSegment {
    /// The grouping key this segment belongs to
    pub fn key(&self) -> ConversationKey {
        ConversationKey {
            session_id: self.session_id.clone(),
            conversation: self.conversation,
        }
    }
}

/// A segment that has not been stored yet (no id assigned)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTranscriptSegment {
    pub session_id: String,
    pub conversation: i64,
    pub speaker: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub duration: String,
    pub content: String,
}

/// The (session, conversation) pair that defines a conversation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationKey {
    pub session_id: String,
    pub conversation: i64,
}

/// A conversation with its position and a few display details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    /// 1-based position in conversation ordering
    pub index: i64,
    #[serde(flatten)]
    pub key: ConversationKey,
    pub segment_count: i64,
    pub date: String,
}
