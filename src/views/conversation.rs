//! State and actions behind the conversation page.
//!
//! The view owns the segments it displays plus the local interaction state
//! (selection, range anchor, rename form). Every mutation goes through the
//! [`TranscriptService`] and is followed by a full reload.

use std::collections::BTreeSet;

use super::Notice;
use crate::clipboard::ClipboardSink;
use crate::database::{ConversationKey, TranscriptSegment};
use crate::service::{
    ByIndexInput, DeleteByIdsInput, RenameSpeakerByIdsInput, RenameSpeakerByMatchInput, ServiceError,
    ServiceResult, TranscriptService,
};

pub const EMPTY_PLACEHOLDER: &str = "No transcripts found";

/// Where the displayed conversation comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationSource {
    /// 1-based position in conversation ordering
    Index(i64),
    Latest,
}

impl ConversationSource {
    /// Page path this source is mounted at
    pub fn path(&self) -> String {
        match self {
            ConversationSource::Index(index) => format!("/conversation/{}", index),
            ConversationSource::Latest => "/conversation/latest".to_string(),
        }
    }

    fn fetch(&self, service: &TranscriptService) -> ServiceResult<Vec<TranscriptSegment>> {
        let segments = match self {
            ConversationSource::Index(index) => service.get_by_index(ByIndexInput { index: *index })?,
            ConversationSource::Latest => service.get_latest()?,
        };
        Ok(segments.unwrap_or_default())
    }
}

#[derive(Debug, Clone)]
pub struct ConversationView {
    source: ConversationSource,
    segments: Vec<TranscriptSegment>,
    /// Grouping key of the first segment seen when the form was seeded
    key: Option<ConversationKey>,
    selected: BTreeSet<i64>,
    last_selected: Option<i64>,
    current_speaker: String,
    new_speaker: String,
}

impl ConversationView {
    /// Fetch the conversation for `source` and seed the form from it
    pub fn load(service: &TranscriptService, source: ConversationSource) -> ServiceResult<Self> {
        let segments = source.fetch(service)?;
        Ok(Self::from_segments(source, segments))
    }

    pub fn from_segments(source: ConversationSource, segments: Vec<TranscriptSegment>) -> Self {
        let mut view = Self {
            source,
            segments: Vec::new(),
            key: None,
            selected: BTreeSet::new(),
            last_selected: None,
            current_speaker: String::new(),
            new_speaker: String::new(),
        };
        view.replace_segments(segments);
        view
    }

    pub fn source(&self) -> ConversationSource {
        self.source
    }

    pub fn segments(&self) -> &[TranscriptSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn key(&self) -> Option<&ConversationKey> {
        self.key.as_ref()
    }

    /// Selected ids in ascending order
    pub fn selected(&self) -> Vec<i64> {
        self.selected.iter().copied().collect()
    }

    pub fn is_selected(&self, id: i64) -> bool {
        self.selected.contains(&id)
    }

    pub fn last_selected(&self) -> Option<i64> {
        self.last_selected
    }

    pub fn current_speaker(&self) -> &str {
        &self.current_speaker
    }

    pub fn new_speaker(&self) -> &str {
        &self.new_speaker
    }

    pub fn set_new_speaker(&mut self, name: impl Into<String>) {
        self.new_speaker = name.into();
    }

    /// Re-fetch from the service. A different conversation showing up at the
    /// same source (e.g. after deleting the current one) reseeds the form.
    pub fn reload(&mut self, service: &TranscriptService) -> ServiceResult<()> {
        let segments = self.source.fetch(service)?;
        self.replace_segments(segments);
        Ok(())
    }

    fn replace_segments(&mut self, segments: Vec<TranscriptSegment>) {
        let first_key = segments.first().map(TranscriptSegment::key);
        if first_key.is_some() && first_key != self.key {
            self.current_speaker = segments[0].speaker.clone();
            self.key = first_key;
            self.selected.clear();
            self.last_selected = None;
        }
        self.segments = segments;
    }

    fn position(&self, id: i64) -> Option<usize> {
        self.segments.iter().position(|s| s.id == id)
    }

    /// Click on a row's avatar. A plain click toggles the row and makes it the
    /// range anchor; a shift click adds every displayed row between the anchor
    /// and the clicked row. Returns false if the id is not displayed.
    pub fn click_row(&mut self, id: i64, shift: bool) -> bool {
        let Some(target) = self.position(id) else {
            return false;
        };

        if shift {
            let Some(anchor) = self.last_selected.and_then(|anchor| self.position(anchor)) else {
                return true;
            };
            let range = if target < anchor {
                target..=anchor
            } else if target > anchor {
                anchor..=target
            } else {
                // same row: nothing to add, the anchor just stays put
                return true;
            };
            self.selected.extend(self.segments[range].iter().map(|s| s.id));
        } else if !self.selected.remove(&id) {
            self.selected.insert(id);
        }

        self.last_selected = Some(id);
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Copy a row's speaker into the "current speaker" field. Selection is untouched.
    pub fn pick_current_speaker(&mut self, id: i64) -> bool {
        match self.position(id) {
            Some(pos) => {
                self.current_speaker = self.segments[pos].speaker.clone();
                true
            }
            None => false,
        }
    }

    /// Rename every `current speaker` row of this conversation to `new speaker`
    pub fn submit_rename(&mut self, service: &TranscriptService) -> ServiceResult<Notice> {
        let key = self
            .key
            .clone()
            .ok_or_else(|| ServiceError::validation("no conversation loaded"))?;

        service.rename_speaker_by_match(RenameSpeakerByMatchInput {
            session_id: key.session_id,
            conversation: key.conversation,
            current_speaker_name: self.current_speaker.clone(),
            new_speaker_name: self.new_speaker.clone(),
        })?;

        self.reload(service)?;
        Ok(Notice::SPEAKER_UPDATED)
    }

    /// Set `new speaker` on every selected row. Nothing happens without a selection.
    pub fn rename_selected(&mut self, service: &TranscriptService) -> ServiceResult<Option<Notice>> {
        if self.selected.is_empty() {
            return Ok(None);
        }

        service.rename_speaker_by_ids(RenameSpeakerByIdsInput {
            new_speaker_name: self.new_speaker.clone(),
            ids: self.selected(),
        })?;

        self.reload(service)?;
        Ok(Some(Notice::SPEAKER_UPDATED))
    }

    pub fn delete_selected(&mut self, service: &TranscriptService) -> ServiceResult<Option<Notice>> {
        if self.selected.is_empty() {
            return Ok(None);
        }

        service.delete_by_ids(DeleteByIdsInput { ids: self.selected() })?;

        self.selected.clear();
        self.reload(service)?;
        Ok(Some(Notice::RECORDS_DELETED))
    }

    /// Delete every segment sharing the displayed grouping key
    pub fn delete_conversation(&mut self, service: &TranscriptService) -> ServiceResult<Option<Notice>> {
        let Some(key) = self.segments.first().map(TranscriptSegment::key) else {
            return Ok(None);
        };

        service.delete_conversation(key)?;

        self.selected.clear();
        self.last_selected = None;
        self.reload(service)?;
        Ok(Some(Notice::CONVERSATION_DELETED))
    }

    /// The displayed conversation as `speaker: content` lines
    pub fn copy_text(&self) -> String {
        self.segments
            .iter()
            .map(|s| format!("{}: {}", s.speaker, s.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Write the conversation to the clipboard. Failures are logged only.
    pub fn copy_to_clipboard(&self, clipboard: &dyn ClipboardSink) -> Option<Notice> {
        match clipboard.write_text(&self.copy_text()) {
            Ok(()) => Some(Notice::CONVERSATION_COPIED),
            Err(e) => {
                log::error!("Failed to copy conversation: {:#}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::testing::{BrokenClipboard, RecordingClipboard};
    use crate::service::test_support::*;
    use crate::service::ByIdInput;

    fn segment(id: i64, speaker: &str, content: &str) -> TranscriptSegment {
        TranscriptSegment {
            id,
            session_id: SESSION_1.to_string(),
            conversation: 1,
            speaker: speaker.to_string(),
            date: "2024-05-01".to_string(),
            start_time: format!("00:00:{:02}.000", id),
            end_time: format!("00:00:{:02}.500", id),
            duration: "00:00:00.500".to_string(),
            content: content.to_string(),
        }
    }

    fn offline_view(ids: &[i64]) -> ConversationView {
        let segments = ids.iter().map(|id| segment(*id, "Alice", "text")).collect();
        ConversationView::from_segments(ConversationSource::Index(1), segments)
    }

    #[test]
    fn seeds_form_from_first_segment() {
        let view = ConversationView::from_segments(
            ConversationSource::Latest,
            vec![segment(1, "Bob", "a"), segment(2, "Alice", "b")],
        );
        assert_eq!(view.current_speaker(), "Bob");
        assert_eq!(view.new_speaker(), "");
        assert_eq!(view.key().unwrap().session_id, SESSION_1);
    }

    #[test]
    fn click_toggles_and_sets_anchor() {
        let mut view = offline_view(&[1, 2, 3]);

        assert!(view.click_row(2, false));
        assert_eq!(view.selected(), vec![2]);
        assert_eq!(view.last_selected(), Some(2));

        assert!(view.click_row(2, false));
        assert!(view.selected().is_empty());
        assert_eq!(view.last_selected(), Some(2));

        assert!(!view.click_row(99, false));
    }

    #[test]
    fn shift_click_without_anchor_does_nothing() {
        let mut view = offline_view(&[1, 2, 3]);
        view.click_row(3, true);
        assert!(view.selected().is_empty());
        assert_eq!(view.last_selected(), None);
    }

    #[test]
    fn shift_click_selects_range_in_both_directions() {
        let mut view = offline_view(&[1, 2, 3, 4, 5]);
        view.click_row(2, false);
        view.click_row(4, true);
        assert_eq!(view.selected(), vec![2, 3, 4]);
        assert_eq!(view.last_selected(), Some(4));

        let mut view = offline_view(&[1, 2, 3, 4, 5]);
        view.click_row(5, false);
        view.click_row(3, true);
        assert_eq!(view.selected(), vec![3, 4, 5]);
    }

    #[test]
    fn shift_click_unions_with_existing_selection() {
        let mut view = offline_view(&[1, 2, 3, 4, 5, 6]);
        view.click_row(1, false);
        view.click_row(5, false);
        view.click_row(6, true);
        assert_eq!(view.selected(), vec![1, 5, 6]);
    }

    #[test]
    fn shift_click_follows_displayed_rows_not_id_arithmetic() {
        // ids 11 and 12 were deleted, and 30 sorts between 10 and 13
        let mut view = offline_view(&[10, 30, 13, 14]);
        view.click_row(10, false);
        view.click_row(13, true);
        assert_eq!(view.selected(), vec![10, 13, 30]);
    }

    #[test]
    fn picking_current_speaker_leaves_selection() {
        let mut view = ConversationView::from_segments(
            ConversationSource::Index(1),
            vec![segment(1, "Alice", "a"), segment(2, "Bob", "b")],
        );
        view.click_row(1, false);

        assert!(view.pick_current_speaker(2));
        assert_eq!(view.current_speaker(), "Bob");
        assert_eq!(view.selected(), vec![1]);
    }

    #[test]
    fn copy_text_joins_lines() {
        let view = ConversationView::from_segments(
            ConversationSource::Index(1),
            vec![segment(1, "Alice", "hi"), segment(2, "Bob", "yo")],
        );
        assert_eq!(view.copy_text(), "Alice: hi\nBob: yo");

        let clipboard = RecordingClipboard::default();
        assert_eq!(view.copy_to_clipboard(&clipboard), Some(Notice::CONVERSATION_COPIED));
        assert_eq!(clipboard.last().as_deref(), Some("Alice: hi\nBob: yo"));
    }

    #[test]
    fn copy_failure_gives_no_notice() {
        let view = offline_view(&[1]);
        assert_eq!(view.copy_to_clipboard(&BrokenClipboard), None);
    }

    #[test]
    fn empty_store_renders_placeholder_state() {
        let (_dir, service) = service();
        let view = ConversationView::load(&service, ConversationSource::Latest).unwrap();
        assert!(view.is_empty());
        assert!(view.key().is_none());
        assert_eq!(view.copy_text(), "");
    }

    #[test]
    fn rename_form_renames_and_keeps_selection() {
        let (_dir, service) = service();
        let seeded = seed(&service, SESSION_1, 1, &[("Alice", "a"), ("Bob", "b"), ("Alice", "c")]);

        let mut view = ConversationView::load(&service, ConversationSource::Index(1)).unwrap();
        view.click_row(seeded[1].id, false);
        view.set_new_speaker("Zed");

        assert_eq!(view.submit_rename(&service).unwrap(), Notice::SPEAKER_UPDATED);

        let speakers: Vec<&str> = view.segments().iter().map(|s| s.speaker.as_str()).collect();
        assert_eq!(speakers, vec!["Zed", "Bob", "Zed"]);
        assert_eq!(view.selected(), vec![seeded[1].id]);
    }

    #[test]
    fn rename_selected_uses_new_speaker_field() {
        let (_dir, service) = service();
        let seeded = seed(&service, SESSION_1, 1, &[("Alice", "a"), ("Bob", "b"), ("Dan", "c")]);

        let mut view = ConversationView::load(&service, ConversationSource::Index(1)).unwrap();
        assert_eq!(view.rename_selected(&service).unwrap(), None);

        view.click_row(seeded[0].id, false);
        view.click_row(seeded[2].id, false);
        view.set_new_speaker("Carol");
        assert_eq!(view.rename_selected(&service).unwrap(), Some(Notice::SPEAKER_UPDATED));

        let speakers: Vec<&str> = view.segments().iter().map(|s| s.speaker.as_str()).collect();
        assert_eq!(speakers, vec!["Carol", "Bob", "Carol"]);
    }

    #[test]
    fn delete_selected_clears_selection_and_reloads() {
        let (_dir, service) = service();
        let seeded = seed(&service, SESSION_1, 1, &[("Alice", "a"), ("Bob", "b"), ("Dan", "c")]);

        let mut view = ConversationView::load(&service, ConversationSource::Index(1)).unwrap();
        view.click_row(seeded[0].id, false);
        view.click_row(seeded[1].id, true);

        assert_eq!(view.delete_selected(&service).unwrap(), Some(Notice::RECORDS_DELETED));
        assert!(view.selected().is_empty());
        assert_eq!(view.segments().len(), 1);
        assert_eq!(service.get_by_id(ByIdInput { id: seeded[0].id }).unwrap(), None);
    }

    #[test]
    fn deleting_conversation_moves_on_to_the_next_one() {
        let (_dir, service) = service();
        seed(&service, SESSION_1, 1, &[("Alice", "a")]);
        seed(&service, SESSION_2, 1, &[("Bob", "b")]);

        let mut view = ConversationView::load(&service, ConversationSource::Index(1)).unwrap();
        assert_eq!(view.current_speaker(), "Alice");

        assert_eq!(view.delete_conversation(&service).unwrap(), Some(Notice::CONVERSATION_DELETED));
        assert_eq!(view.key().unwrap().session_id, SESSION_2);
        assert_eq!(view.current_speaker(), "Bob");

        view.delete_conversation(&service).unwrap();
        assert!(view.is_empty());
    }
}
