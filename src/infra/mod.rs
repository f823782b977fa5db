//! Infrastructure: SQLite connection, migrations, repositories.

pub mod bulk;
pub mod course_repo;
pub mod db;
pub mod logger;
mod sql_types;
pub mod timing_repo;

pub use course_repo::{CourseListQuery, CourseRepository, SqliteCourseRepository};
pub use db::{get_connection, init_db, DbPool};
pub use logger::Logger;
pub use timing_repo::{SqliteTimingRepository, TimingRepository};
