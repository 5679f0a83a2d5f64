//! Query/mutation procedures over the transcripts store.
//!
//! Every procedure validates its input before the store is touched. Absent
//! reads come back as `None`; only `update` treats a missing id as an error.

pub mod error;
pub mod inputs;

use std::sync::Arc;
use std::time::Instant;

use crate::database::{
    ConversationKey, ConversationSummary, DatabaseManager, NewTranscriptSegment, TranscriptSegment,
};
use crate::perf_debug;

pub use error::{ServiceError, ServiceResult};
pub use inputs::{
    ByIdInput, ByIndexInput, DeleteByIdsInput, DeleteConversationResult, RenameSpeakerByIdsInput,
    RenameSpeakerByMatchInput, Validate, MAX_SPEAKER_LEN,
};

/// The procedure layer. Cheap to clone; all clones share one store handle.
#[derive(Clone)]
pub struct TranscriptService {
    db: Arc<DatabaseManager>,
}

impl TranscriptService {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DatabaseManager {
        &self.db
    }

    /// Segments of the conversation holding the newest segment
    pub fn get_latest(&self) -> ServiceResult<Option<Vec<TranscriptSegment>>> {
        let started = Instant::now();
        let latest = self.db.get_latest_conversation()?;
        perf_debug!("getLatest took {:?}", started.elapsed());
        Ok(latest)
    }

    pub fn get_all_conversations(&self) -> ServiceResult<Vec<ConversationKey>> {
        Ok(self.db.get_conversation_keys()?)
    }

    pub fn list_conversations(&self) -> ServiceResult<Vec<ConversationSummary>> {
        Ok(self.db.get_conversation_summaries()?)
    }

    pub fn get_by_id(&self, input: ByIdInput) -> ServiceResult<Option<TranscriptSegment>> {
        input.validate()?;
        Ok(self.db.get_transcript_segment(input.id)?)
    }

    /// Segments of the conversation at a 1-based position, ordered by start time
    pub fn get_by_index(&self, input: ByIndexInput) -> ServiceResult<Option<Vec<TranscriptSegment>>> {
        input.validate()?;
        let started = Instant::now();
        let segments = self.db.get_conversation_at(input.index)?;
        perf_debug!("getByIndex({}) took {:?}", input.index, started.elapsed());
        Ok(segments)
    }

    pub fn update(&self, input: TranscriptSegment) -> ServiceResult<TranscriptSegment> {
        input.validate()?;
        match self.db.update_transcript_segment(&input)? {
            Some(updated) => {
                log::info!("Updated transcript {}", updated.id);
                Ok(updated)
            }
            None => Err(ServiceError::NotFound(format!("transcript {}", input.id))),
        }
    }

    pub fn rename_speaker_by_match(&self, input: RenameSpeakerByMatchInput) -> ServiceResult<Vec<TranscriptSegment>> {
        input.validate()?;
        let renamed = self.db.rename_speaker_in_conversation(
            &input.key(),
            &input.current_speaker_name,
            &input.new_speaker_name,
        )?;
        log::info!(
            "Renamed speaker {:?} -> {:?} in {}#{} ({} segments)",
            input.current_speaker_name,
            input.new_speaker_name,
            input.session_id,
            input.conversation,
            renamed.len()
        );
        Ok(renamed)
    }

    pub fn rename_speaker_by_ids(&self, input: RenameSpeakerByIdsInput) -> ServiceResult<Vec<TranscriptSegment>> {
        input.validate()?;
        let renamed = self.db.rename_speaker_for_ids(&input.new_speaker_name, &input.ids)?;
        log::info!(
            "Set speaker {:?} on {} of {} requested segments",
            input.new_speaker_name,
            renamed.len(),
            input.ids.len()
        );
        Ok(renamed)
    }

    pub fn delete_by_ids(&self, input: DeleteByIdsInput) -> ServiceResult<Vec<TranscriptSegment>> {
        input.validate()?;
        let deleted = self.db.delete_transcript_segments(&input.ids)?;
        log::info!("Deleted {} transcript segments", deleted.len());
        Ok(deleted)
    }

    pub fn delete_conversation(&self, input: ConversationKey) -> ServiceResult<DeleteConversationResult> {
        input.validate()?;
        let deleted = self.db.delete_conversation(&input)?;
        log::info!(
            "Deleted conversation {}#{} ({} segments)",
            input.session_id,
            input.conversation,
            deleted
        );
        Ok(DeleteConversationResult { deleted })
    }

    /// Store freshly ingested segments in one transaction
    pub fn import_segments(&self, segments: Vec<NewTranscriptSegment>) -> ServiceResult<Vec<TranscriptSegment>> {
        segments.iter().try_for_each(|s| s.validate())?;
        let inserted = self.db.insert_transcript_segments(&segments)?;
        log::info!("Imported {} transcript segments", inserted.len());
        Ok(inserted)
    }
}
