pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod infra;

use app::CourseService;
use config::Config;
use domain::{IdGenerator, ShardedIdGenerator};
use error::AppError;
use infra::{init_db, Logger};
use std::sync::Arc;

pub const LOG_TARGET: &str = "coursebook";

/// Open (and migrate) the configured database and wire a course service on it.
pub fn open(config: &Config) -> Result<CourseService, AppError> {
    log::info!("DB path: {:?}", config.db_path);
    let pool = init_db(&config.db_path).map_err(|e| {
        log::error!("DB init failed: {}", e);
        e
    })?;

    let ids: Arc<dyn IdGenerator> = Arc::new(match config.shard_id {
        Some(shard) => ShardedIdGenerator::new(shard),
        None => ShardedIdGenerator::random(),
    });

    Ok(CourseService::new(
        Arc::new(pool),
        ids,
        Logger::global(LOG_TARGET),
    ))
}
