// Command-line arguments

use anyhow::{anyhow, Result};
use std::path::PathBuf;

use crate::ingest::ImportOptions;

pub const USAGE: &str = "\
Transcript Editor

Usage:
  transcript-editor [serve]                 Serve the editor (TRANSCRIPT_EDITOR_ADDR, default 127.0.0.1:3000)
  transcript-editor import <file.vtt>       Import a WebVTT transcript as a new session
      --date YYYY-MM-DD                     Date for the records (default: today)
      --session-id UUID                     Session id for the records (default: random)
  transcript-editor help                    Show this message";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Serve,
    Import { path: PathBuf, date: Option<String>, session_id: Option<String> },
    Help,
}

impl Command {
    /// Parse arguments after the program name
    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        match args.next().as_deref() {
            None | Some("serve") => Ok(Command::Serve),
            Some("help") | Some("--help") | Some("-h") => Ok(Command::Help),
            Some("import") => {
                let mut path = None;
                let mut date = None;
                let mut session_id = None;

                while let Some(arg) = args.next() {
                    match arg.as_str() {
                        "--date" | "-d" => {
                            date = Some(args.next().ok_or_else(|| anyhow!("--date needs a value"))?);
                        }
                        "--session-id" | "--session_id" | "-s" => {
                            session_id = Some(args.next().ok_or_else(|| anyhow!("--session-id needs a value"))?);
                        }
                        flag if flag.starts_with('-') => return Err(anyhow!("Unknown option {}", flag)),
                        _ if path.is_some() => return Err(anyhow!("Only one file can be imported at a time")),
                        _ => path = Some(PathBuf::from(arg)),
                    }
                }

                let path = path.ok_or_else(|| anyhow!("import needs a .vtt file"))?;
                Ok(Command::Import { path, date, session_id })
            }
            Some(other) => Err(anyhow!("Unknown command {}", other)),
        }
    }

    pub fn import_options(&self) -> ImportOptions {
        match self {
            Command::Import { date, session_id, .. } => ImportOptions {
                date: date.clone(),
                session_id: session_id.clone(),
            },
            _ => ImportOptions::default(),
        }
    }
}
