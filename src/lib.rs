// Transcript Editor - browse and edit speaker-attributed transcripts
//
// A small local web app:
// - JSON procedures over the transcript store (`/api/transcripts.*`)
// - Server-rendered conversation and transcript pages
// - WebVTT import from the command line

use anyhow::{Context, Result};
use axum::Router;
use std::sync::Arc;

// Performance logging macros - exported for use by other modules
#[macro_use]
pub mod macros;

pub mod cli;
pub mod clipboard;
pub mod config;
pub mod database;
pub mod ingest;
pub mod pages;
pub mod rpc;
pub mod service;
pub mod state;
pub mod views;

use cli::Command;
use config::AppConfig;
use database::DatabaseManager;
use service::TranscriptService;
use state::AppState;

/// Every route the app serves
pub fn app(state: AppState) -> Router {
    rpc::router()
        .merge(pages::router())
        .with_state(state)
}

async fn serve(config: AppConfig, db: DatabaseManager) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

    log::info!("Transcript Editor listening on http://{}", config.bind_addr);
    axum::serve(listener, app(AppState::new(db)))
        .await
        .context("Server stopped unexpectedly")
}

pub fn run() -> Result<()> {
    // A missing .env is fine; everything has a default
    let _ = dotenvy::dotenv();

    // Initialize env_logger to output to stderr (reads RUST_LOG env var)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let command = Command::parse(std::env::args().skip(1))?;
    if command == Command::Help {
        println!("{}", cli::USAGE);
        return Ok(());
    }

    let config = AppConfig::from_env()?;
    let db = DatabaseManager::new(config.db_path.clone())
        .context("Database initialization failed")?;

    match command {
        Command::Import { ref path, .. } => {
            let service = TranscriptService::new(Arc::new(db));
            let report = ingest::import_vtt_file(&service, path, command.import_options())?;
            println!("Processed VTT file: {}", path.display());
            println!("Session ID: {}", report.session_id);
            Ok(())
        }
        Command::Serve | Command::Help => {
            let runtime = tokio::runtime::Runtime::new()
                .context("Failed to start async runtime")?;
            runtime.block_on(serve(config, db))
        }
    }
}
