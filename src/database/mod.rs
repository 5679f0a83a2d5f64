// Database module for Transcript Editor
// SQLite persistence for transcript segments

pub mod manager;
pub mod migrations;
pub mod models;
pub mod transcripts_repo;

pub use manager::DatabaseManager;
pub use models::*;
