//! Procedure inputs and the checks they must pass before reaching the store.

use serde::{Deserialize, Serialize};

use super::error::{ServiceError, ServiceResult};
use crate::database::{ConversationKey, NewTranscriptSegment, TranscriptSegment};

/// Longest speaker label the store accepts (in characters)
pub const MAX_SPEAKER_LEN: usize = 255;

/// Shape check applied at the procedure boundary
pub trait Validate {
    fn validate(&self) -> ServiceResult<()>;
}

fn check_positive(field: &str, value: i64) -> ServiceResult<()> {
    if value < 1 {
        return Err(ServiceError::validation(format!("{} must be at least 1, got {}", field, value)));
    }
    Ok(())
}

fn check_uuid(field: &str, value: &str) -> ServiceResult<()> {
    uuid::Uuid::parse_str(value)
        .map(|_| ())
        .map_err(|_| ServiceError::validation(format!("{} must be a UUID, got {:?}", field, value)))
}

fn check_speaker(field: &str, value: &str) -> ServiceResult<()> {
    let len = value.chars().count();
    if len > MAX_SPEAKER_LEN {
        return Err(ServiceError::validation(format!(
            "{} must be at most {} characters, got {}",
            field, MAX_SPEAKER_LEN, len
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ByIdInput {
    pub id: i64,
}

impl Validate for ByIdInput {
    fn validate(&self) -> ServiceResult<()> {
        check_positive("id", self.id)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ByIndexInput {
    pub index: i64,
}

impl Validate for ByIndexInput {
    fn validate(&self) -> ServiceResult<()> {
        check_positive("index", self.index)
    }
}

impl Validate for TranscriptSegment {
    fn validate(&self) -> ServiceResult<()> {
        check_positive("id", self.id)?;
        check_uuid("sessionId", &self.session_id)?;
        check_speaker("speaker", &self.speaker)
    }
}

impl Validate for NewTranscriptSegment {
    fn validate(&self) -> ServiceResult<()> {
        check_uuid("sessionId", &self.session_id)?;
        check_speaker("speaker", &self.speaker)
    }
}

impl Validate for ConversationKey {
    fn validate(&self) -> ServiceResult<()> {
        check_uuid("sessionId", &self.session_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameSpeakerByMatchInput {
    pub session_id: String,
    pub conversation: i64,
    pub current_speaker_name: String,
    pub new_speaker_name: String,
}

impl RenameSpeakerByMatchInput {
    pub fn key(&self) -> ConversationKey {
        ConversationKey {
            session_id: self.session_id.clone(),
            conversation: self.conversation,
        }
    }
}

impl Validate for RenameSpeakerByMatchInput {
    fn validate(&self) -> ServiceResult<()> {
        check_uuid("sessionId", &self.session_id)?;
        check_speaker("currentSpeakerName", &self.current_speaker_name)?;
        check_speaker("newSpeakerName", &self.new_speaker_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameSpeakerByIdsInput {
    pub new_speaker_name: String,
    pub ids: Vec<i64>,
}

impl Validate for RenameSpeakerByIdsInput {
    fn validate(&self) -> ServiceResult<()> {
        check_speaker("newSpeakerName", &self.new_speaker_name)?;
        self.ids.iter().try_for_each(|id| check_positive("ids[]", *id))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteByIdsInput {
    pub ids: Vec<i64>,
}

impl Validate for DeleteByIdsInput {
    fn validate(&self) -> ServiceResult<()> {
        self.ids.iter().try_for_each(|id| check_positive("ids[]", *id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteConversationResult {
    pub deleted: usize,
}
