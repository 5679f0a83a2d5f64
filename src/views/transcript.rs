//! Edit form for a single transcript segment.

use super::Notice;
use crate::database::TranscriptSegment;
use crate::service::{ServiceError, ServiceResult, TranscriptService, Validate};

/// Form state for one segment. Every editable field has its own setter;
/// the session id is shown but cannot be changed from here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptForm {
    id: i64,
    session_id: String,
    conversation: String,
    speaker: String,
    date: String,
    start_time: String,
    end_time: String,
    duration: String,
    content: String,
}

impl TranscriptForm {
    pub fn new(segment: &TranscriptSegment) -> Self {
        Self {
            id: segment.id,
            session_id: segment.session_id.clone(),
            conversation: segment.conversation.to_string(),
            speaker: segment.speaker.clone(),
            date: segment.date.clone(),
            start_time: segment.start_time.clone(),
            end_time: segment.end_time.clone(),
            duration: segment.duration.clone(),
            content: segment.content.clone(),
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn conversation(&self) -> &str {
        &self.conversation
    }

    pub fn speaker(&self) -> &str {
        &self.speaker
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn start_time(&self) -> &str {
        &self.start_time
    }

    pub fn end_time(&self) -> &str {
        &self.end_time
    }

    pub fn duration(&self) -> &str {
        &self.duration
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn set_conversation(&mut self, value: impl Into<String>) {
        self.conversation = value.into();
    }

    pub fn set_speaker(&mut self, value: impl Into<String>) {
        self.speaker = value.into();
    }

    pub fn set_date(&mut self, value: impl Into<String>) {
        self.date = value.into();
    }

    pub fn set_start_time(&mut self, value: impl Into<String>) {
        self.start_time = value.into();
    }

    pub fn set_end_time(&mut self, value: impl Into<String>) {
        self.end_time = value.into();
    }

    pub fn set_duration(&mut self, value: impl Into<String>) {
        self.duration = value.into();
    }

    pub fn set_content(&mut self, value: impl Into<String>) {
        self.content = value.into();
    }

    /// Build the full update payload, checked against the procedure schema
    pub fn to_segment(&self) -> ServiceResult<TranscriptSegment> {
        let conversation = self.conversation.trim().parse::<i64>().map_err(|_| {
            ServiceError::validation(format!("conversation must be an integer, got {:?}", self.conversation))
        })?;

        let segment = TranscriptSegment {
            id: self.id,
            session_id: self.session_id.clone(),
            conversation,
            speaker: self.speaker.clone(),
            date: self.date.clone(),
            start_time: self.start_time.clone(),
            end_time: self.end_time.clone(),
            duration: self.duration.clone(),
            content: self.content.clone(),
        };
        segment.validate()?;
        Ok(segment)
    }

    /// Send the whole record to `update` and reseed from what was stored
    pub fn submit(&mut self, service: &TranscriptService) -> ServiceResult<Notice> {
        let updated = service.update(self.to_segment()?)?;
        *self = Self::new(&updated);
        Ok(Notice::TRANSCRIPT_UPDATED)
    }
}
