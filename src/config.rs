//! Runtime configuration read from the environment.

use crate::error::AppError;
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "COURSEBOOK_DB_PATH";
pub const ENV_SHARD_ID: &str = "COURSEBOOK_SHARD_ID";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    /// Id generator shard; random when unset.
    pub shard_id: Option<u16>,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let db_path = lookup(ENV_DB_PATH)
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| app_data_dir().join("app.db"));

        let shard_id = match lookup(ENV_SHARD_ID).filter(|s| !s.trim().is_empty()) {
            Some(raw) => Some(raw.trim().parse::<u16>().map_err(|e| {
                AppError::Config(format!("{} must be a 16-bit integer: {}", ENV_SHARD_ID, e))
            })?),
            None => None,
        };

        Ok(Self { db_path, shard_id })
    }
}

fn app_data_dir() -> PathBuf {
    let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("coursebook")
}
