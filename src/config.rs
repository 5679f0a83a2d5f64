// Runtime configuration, read from the environment (and `.env` when present)

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::database::DatabaseManager;

pub const DB_PATH_VAR: &str = "TRANSCRIPT_EDITOR_DB";
pub const BIND_ADDR_VAR: &str = "TRANSCRIPT_EDITOR_ADDR";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub bind_addr: SocketAddr,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let db_path = get(DB_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(DatabaseManager::default_path);

        let addr = get(BIND_ADDR_VAR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = addr
            .parse::<SocketAddr>()
            .with_context(|| format!("Invalid {} value {:?}", BIND_ADDR_VAR, addr))?;

        Ok(Self { db_path, bind_addr })
    }
}
