// WebVTT cue parsing

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static TIMING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^((?:\d+:)?\d{2}:\d{2}\.\d{3})\s+-->\s+((?:\d+:)?\d{2}:\d{2}\.\d{3})(?:\s|$)")
        .expect("Invalid regex")
});

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("Invalid regex"));

/// One timed cue. Times are milliseconds from the start of the recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    pub start_ms: u64,
    pub end_ms: u64,
    /// Payload lines exactly as written, joined with `\n`
    pub raw_text: String,
}

impl Cue {
    /// Payload with markup tags removed and outer whitespace trimmed
    pub fn text(&self) -> String {
        TAG_RE.replace_all(&self.raw_text, "").trim().to_string()
    }
}

/// Parse `HH:MM:SS.mmm` or `MM:SS.mmm` into milliseconds
pub fn parse_timestamp(value: &str) -> Result<u64> {
    let (clock, millis) = value
        .split_once('.')
        .ok_or_else(|| anyhow!("Missing milliseconds in timestamp {:?}", value))?;

    let parts = clock
        .split(':')
        .map(|p| p.parse::<u64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("Invalid timestamp {:?}", value))?;

    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m, s] => (*h, *m, *s),
        [m, s] => (0, *m, *s),
        _ => return Err(anyhow!("Invalid timestamp {:?}", value)),
    };
    if minutes > 59 || seconds > 59 {
        return Err(anyhow!("Invalid timestamp {:?}", value));
    }

    let millis: u64 = millis
        .parse()
        .with_context(|| format!("Invalid milliseconds in timestamp {:?}", value))?;
    if millis > 999 {
        return Err(anyhow!("Invalid timestamp {:?}", value));
    }

    hours
        .checked_mul(3_600_000)
        .and_then(|ms| ms.checked_add(minutes * 60_000 + seconds * 1000 + millis))
        .ok_or_else(|| anyhow!("Invalid timestamp {:?}: hours out of range", value))
}

/// Parse a WebVTT document into its cues, in file order.
/// NOTE, STYLE and REGION blocks are skipped.
pub fn parse_cues(input: &str) -> Result<Vec<Cue>> {
    let input = input.trim_start_matches('\u{feff}');
    let lines: Vec<&str> = input.lines().map(|l| l.trim_end_matches('\r')).collect();

    let header = lines.first().copied().unwrap_or_default();
    if !header.starts_with("WEBVTT") {
        return Err(anyhow!("Not a WebVTT file: missing WEBVTT header"));
    }

    let mut cues = Vec::new();
    for block in lines[1..].split(|line| line.trim().is_empty()) {
        if block.is_empty() {
            continue;
        }

        // an optional cue identifier may precede the timing line
        let Some(timing_at) = block.iter().take(2).position(|line| TIMING_RE.is_match(line)) else {
            continue;
        };

        let caps = TIMING_RE
            .captures(block[timing_at])
            .ok_or_else(|| anyhow!("Invalid cue timing {:?}", block[timing_at]))?;
        let start_ms = parse_timestamp(&caps[1])?;
        let end_ms = parse_timestamp(&caps[2])?;
        if end_ms < start_ms {
            return Err(anyhow!("Cue ends before it starts: {:?}", block[timing_at]));
        }

        cues.push(Cue {
            start_ms,
            end_ms,
            raw_text: block[timing_at + 1..].join("\n"),
        });
    }

    Ok(cues)
}
