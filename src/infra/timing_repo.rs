//! Course timing persistence.

use crate::domain::{CourseTiming, Id};
use crate::error::AppError;
use rusqlite::{params, Connection, OptionalExtension, Row};

pub trait TimingRepository {
    fn create(&self, conn: &Connection, timing: &CourseTiming) -> Result<Id, AppError>;
    fn get(&self, conn: &Connection, id: Id) -> Result<CourseTiming, AppError>;
    fn update(&self, conn: &Connection, timing: &CourseTiming) -> Result<(), AppError>;
    fn delete(&self, conn: &Connection, id: Id) -> Result<(), AppError>;
    /// All timings of one course, oldest insert first.
    fn get_by_course(&self, conn: &Connection, course_id: Id)
        -> Result<Vec<CourseTiming>, AppError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteTimingRepository;

const TIMING_COLUMNS: &str =
    "id, course_id, ext_id, course_date, start_time, end_time, created_at, updated_at";

fn timing_from_row(r: &Row<'_>) -> rusqlite::Result<CourseTiming> {
    Ok(CourseTiming {
        id: r.get(0)?,
        course_id: r.get(1)?,
        ext_id: r.get(2)?,
        course_date: r.get(3)?,
        start_time: r.get(4)?,
        end_time: r.get(5)?,
        created_at: r.get(6)?,
        updated_at: r.get(7)?,
    })
}

impl TimingRepository for SqliteTimingRepository {
    fn create(&self, conn: &Connection, timing: &CourseTiming) -> Result<Id, AppError> {
        if !timing.id.is_valid() || !timing.course_id.is_valid() {
            return Err(AppError::InvalidEntity(format!(
                "timing {} needs allocated id and course id (course {})",
                timing.id, timing.course_id
            )));
        }
        conn.execute(
            "INSERT INTO course_timing (id, course_id, ext_id, course_date, start_time, end_time, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                timing.id,
                timing.course_id,
                timing.ext_id,
                timing.course_date,
                timing.start_time,
                timing.end_time,
                timing.created_at,
                timing.updated_at
            ],
        )?;
        Ok(timing.id)
    }

    fn get(&self, conn: &Connection, id: Id) -> Result<CourseTiming, AppError> {
        conn.query_row(
            &format!("SELECT {} FROM course_timing WHERE id = ?1", TIMING_COLUMNS),
            [id],
            timing_from_row,
        )
        .optional()?
        .ok_or_else(|| AppError::NotFound(format!("course timing {}", id)))
    }

    fn update(&self, conn: &Connection, timing: &CourseTiming) -> Result<(), AppError> {
        let changed = conn.execute(
            "UPDATE course_timing SET ext_id = ?2, course_date = ?3, start_time = ?4, end_time = ?5, updated_at = ?6 WHERE id = ?1",
            params![
                timing.id,
                timing.ext_id,
                timing.course_date,
                timing.start_time,
                timing.end_time,
                timing.updated_at
            ],
        )?;
        if changed == 0 {
            return Err(AppError::NotFound(format!("course timing {}", timing.id)));
        }
        Ok(())
    }

    fn delete(&self, conn: &Connection, id: Id) -> Result<(), AppError> {
        let changed = conn.execute("DELETE FROM course_timing WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(AppError::NotFound(format!("course timing {}", id)));
        }
        Ok(())
    }

    fn get_by_course(
        &self,
        conn: &Connection,
        course_id: Id,
    ) -> Result<Vec<CourseTiming>, AppError> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM course_timing WHERE course_id = ?1 ORDER BY rowid",
            TIMING_COLUMNS
        ))?;
        let rows = stmt.query_map([course_id], timing_from_row)?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }
}
