// Database models for Transcript Editor

pub mod transcript;

pub use transcript::*;
