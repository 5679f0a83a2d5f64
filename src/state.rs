// State management for Transcript Editor

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::clipboard::{ClipboardSink, SystemClipboard};
use crate::database::DatabaseManager;
use crate::service::TranscriptService;
use crate::views::{ConversationView, Notice};

/// The conversation page currently mounted, plus the message to show on its next render
pub struct MountedConversation {
    pub view: ConversationView,
    pub notice: Option<Notice>,
    pub error: Option<String>,
}

impl MountedConversation {
    pub fn new(view: ConversationView) -> Self {
        Self {
            view,
            notice: None,
            error: None,
        }
    }
}

/// Shared state handed to every request handler
#[derive(Clone)]
pub struct AppState {
    service: TranscriptService,
    clipboard: Arc<dyn ClipboardSink>,
    /// Single-user app: one mounted conversation page at a time
    conversation: Arc<RwLock<Option<MountedConversation>>>,
}

impl AppState {
    pub fn new(db: DatabaseManager) -> Self {
        Self::with_clipboard(Arc::new(db), Arc::new(SystemClipboard))
    }

    pub fn with_clipboard(db: Arc<DatabaseManager>, clipboard: Arc<dyn ClipboardSink>) -> Self {
        Self {
            service: TranscriptService::new(db),
            clipboard,
            conversation: Arc::new(RwLock::new(None)),
        }
    }

    pub fn service(&self) -> &TranscriptService {
        &self.service
    }

    pub fn clipboard(&self) -> &dyn ClipboardSink {
        self.clipboard.as_ref()
    }

    pub fn conversation(&self) -> &RwLock<Option<MountedConversation>> {
        &self.conversation
    }
}
