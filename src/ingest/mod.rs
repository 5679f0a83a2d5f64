// Ingestion - turn a WebVTT transcript into stored segments
//
// Speaker labels come from a `[Name]:` prefix on each cue. A silence longer
// than NEW_CONVERSATION_GAP_MS between cues starts a new conversation.

pub mod vtt;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::Path;

use crate::database::NewTranscriptSegment;
use crate::service::TranscriptService;
use vtt::Cue;

pub const NEW_CONVERSATION_GAP_MS: u64 = 45_000;
pub const UNKNOWN_SPEAKER: &str = "Unknown";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Overrides for an import; unset fields get today's date and a fresh session
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub date: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub session_id: String,
    pub segments: usize,
    pub conversations: i64,
}

/// Format milliseconds as `HH:MM:SS.mmm`
pub fn format_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms / 60_000) % 60;
    let seconds = (ms / 1000) % 60;
    let millis = ms % 1000;

    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
}

/// Split a cue into (speaker, content)
fn split_speaker(cue: &Cue) -> (String, String) {
    let text = cue.text();
    let Some((label, _)) = cue.raw_text.split_once(':') else {
        return (UNKNOWN_SPEAKER.to_string(), text);
    };

    let speaker = label.trim_matches(|c| c == '[' || c == ']').to_string();
    if speaker.is_empty() {
        return (speaker, text);
    }
    let content = text.replace(&format!("[{}]:", speaker), "").trim().to_string();
    (speaker, content)
}

fn resolve_date(date: Option<String>) -> Result<String> {
    match date {
        Some(date) => {
            NaiveDate::parse_from_str(&date, DATE_FORMAT)
                .with_context(|| format!("Invalid date {:?}, expected YYYY-MM-DD", date))?;
            Ok(date)
        }
        None => Ok(chrono::Local::now().date_naive().format(DATE_FORMAT).to_string()),
    }
}

fn resolve_session_id(session_id: Option<String>) -> Result<String> {
    match session_id {
        Some(id) => {
            let parsed = uuid::Uuid::parse_str(&id)
                .with_context(|| format!("Invalid session id {:?}, expected a UUID", id))?;
            Ok(parsed.to_string())
        }
        None => Ok(uuid::Uuid::new_v4().to_string()),
    }
}

/// Assign conversations and build insertable segments, in cue order
pub fn segments_from_cues(cues: &[Cue], session_id: &str, date: &str) -> Vec<NewTranscriptSegment> {
    let mut conversation = 1;
    let mut previous_end: Option<u64> = None;

    cues.iter()
        .map(|cue| {
            if previous_end.is_some_and(|end| cue.start_ms > end.saturating_add(NEW_CONVERSATION_GAP_MS)) {
                conversation += 1;
            }
            previous_end = Some(cue.end_ms);

            let (speaker, content) = split_speaker(cue);
            NewTranscriptSegment {
                session_id: session_id.to_string(),
                conversation,
                speaker,
                date: date.to_string(),
                start_time: format_timestamp(cue.start_ms),
                end_time: format_timestamp(cue.end_ms),
                duration: format_timestamp(cue.end_ms - cue.start_ms),
                content,
            }
        })
        .collect()
}

/// Import one `.vtt` file as a new session, all segments in one transaction
pub fn import_vtt_file(service: &TranscriptService, path: &Path, options: ImportOptions) -> Result<ImportReport> {
    let date = resolve_date(options.date)?;
    let session_id = resolve_session_id(options.session_id)?;

    let input = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let cues = vtt::parse_cues(&input)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let segments = segments_from_cues(&cues, &session_id, &date);
    let conversations = segments.last().map_or(0, |s| s.conversation);
    let inserted = service
        .import_segments(segments)
        .context("Failed to store imported segments")?;

    log::info!(
        "Processed VTT file {}: {} segments in {} conversations, session {}",
        path.display(),
        inserted.len(),
        conversations,
        session_id
    );

    Ok(ImportReport {
        session_id,
        segments: inserted.len(),
        conversations,
    })
}
