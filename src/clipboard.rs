//! Clipboard access for the copy action.

use anyhow::{Context, Result};
use arboard::Clipboard;

/// Something that can receive copied text
pub trait ClipboardSink: Send + Sync {
    fn write_text(&self, text: &str) -> Result<()>;
}

/// The desktop clipboard of the machine running the server
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn write_text(&self, text: &str) -> Result<()> {
        let mut clipboard = Clipboard::new().context("Failed to open system clipboard")?;
        clipboard
            .set_text(text)
            .context("Failed to write to system clipboard")?;
        log::debug!("Copied {} bytes to clipboard", text.len());
        Ok(())
    }
}
