//! Course persistence: scalar rows, association link tables, timings.

use super::bulk::{
    bulk_delete, bulk_insert, max_delete_rows_per_statement, max_rows_per_statement, Placeholder,
};
use super::timing_repo::{SqliteTimingRepository, TimingRepository};
use crate::domain::{
    reconcile_members, AssociationKind, Course, CourseStatus, Id, Member, MemberDiff,
};
use crate::error::AppError;
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Persistence gateway for the course aggregate.
///
/// Every method runs on the caller's connection, so the caller decides the
/// transaction boundary.
pub trait CourseRepository {
    type Timings: TimingRepository;

    fn timings(&self) -> &Self::Timings;

    fn create(&self, conn: &Connection, course: &Course) -> Result<Id, AppError>;
    fn get(&self, conn: &Connection, id: Id) -> Result<Course, AppError>;
    fn update(&self, conn: &Connection, course: &Course) -> Result<(), AppError>;
    fn delete(&self, conn: &Connection, id: Id) -> Result<(), AppError>;
    fn list(&self, conn: &Connection, query: &CourseListQuery) -> Result<Vec<Course>, AppError>;

    /// Bulk insert; never called with an empty slice.
    fn insert_association(
        &self,
        conn: &Connection,
        kind: AssociationKind,
        course_id: Id,
        members: &[Member],
    ) -> Result<(), AppError>;

    /// Bulk delete; never called with an empty slice.
    fn delete_association(
        &self,
        conn: &Connection,
        kind: AssociationKind,
        course_id: Id,
        members: &[Member],
    ) -> Result<(), AppError>;

    /// Rewrites `is_primary` on existing teacher links.
    fn update_primary(
        &self,
        conn: &Connection,
        course_id: Id,
        members: &[Member],
    ) -> Result<(), AppError>;

    fn get_association(
        &self,
        conn: &Connection,
        kind: AssociationKind,
        course_id: Id,
    ) -> Result<Vec<Member>, AppError>;

    /// Read current membership, diff it against `desired`, write only the difference.
    fn reconcile_association(
        &self,
        conn: &Connection,
        kind: AssociationKind,
        course_id: Id,
        desired: &[Member],
    ) -> Result<MemberDiff, AppError> {
        let current = self.get_association(conn, kind, course_id)?;
        let mut diff = reconcile_members(&current, desired);
        if !kind.tracks_primary() {
            diff.to_update.clear();
        }

        if !diff.to_add.is_empty() {
            self.insert_association(conn, kind, course_id, &diff.to_add)?;
        }
        if !diff.to_remove.is_empty() {
            self.delete_association(conn, kind, course_id, &diff.to_remove)?;
        }
        if !diff.to_update.is_empty() {
            self.update_primary(conn, course_id, &diff.to_update)?;
        }
        Ok(diff)
    }
}

/// Filter for `CourseRepository::list`. `statuses: Some(vec![])` is an
/// empty allow-list and matches nothing.
#[derive(Debug, Clone, Default)]
pub struct CourseListQuery {
    pub tenant_id: Id,
    pub center_id: Option<Id>,
    pub statuses: Option<Vec<CourseStatus>>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

impl CourseListQuery {
    pub fn for_tenant(tenant_id: Id) -> Self {
        Self {
            tenant_id,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SqliteCourseRepository {
    placeholder: Placeholder,
    timings: SqliteTimingRepository,
}

impl SqliteCourseRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

const COURSE_COLUMNS: &str = "id, tenant_id, ext_id, center_id, product_id, name, notes, timezone, address, status, mode, max_attendees, num_attendees, created_at, updated_at";

fn course_from_row(r: &Row<'_>) -> rusqlite::Result<Course> {
    Ok(Course {
        id: r.get(0)?,
        tenant_id: r.get(1)?,
        ext_id: r.get(2)?,
        center_id: r.get(3)?,
        product_id: r.get(4)?,
        name: r.get(5)?,
        notes: r.get(6)?,
        timezone: r.get(7)?,
        address: r.get(8)?,
        status: r.get(9)?,
        mode: r.get(10)?,
        max_attendees: r.get(11)?,
        num_attendees: r.get(12)?,
        created_at: r.get(13)?,
        updated_at: r.get(14)?,
    })
}

/// Same text layout rusqlite uses for `DateTime<Utc>` columns.
fn timestamp(at: DateTime<Utc>) -> Value {
    Value::Text(at.format("%F %T%.f%:z").to_string())
}

impl CourseRepository for SqliteCourseRepository {
    type Timings = SqliteTimingRepository;

    fn timings(&self) -> &Self::Timings {
        &self.timings
    }

    fn create(&self, conn: &Connection, course: &Course) -> Result<Id, AppError> {
        if !course.id.is_valid() {
            return Err(AppError::InvalidEntity(
                "course id must be allocated before insert".into(),
            ));
        }
        conn.execute(
            &format!(
                "INSERT INTO course ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                COURSE_COLUMNS
            ),
            params![
                course.id,
                course.tenant_id,
                course.ext_id,
                course.center_id,
                course.product_id,
                course.name.trim(),
                course.notes,
                course.timezone,
                course.address,
                course.status,
                course.mode,
                course.max_attendees,
                course.num_attendees,
                course.created_at,
                course.updated_at
            ],
        )?;
        Ok(course.id)
    }

    fn get(&self, conn: &Connection, id: Id) -> Result<Course, AppError> {
        conn.query_row(
            &format!("SELECT {} FROM course WHERE id = ?1", COURSE_COLUMNS),
            [id],
            course_from_row,
        )
        .optional()?
        .ok_or_else(|| AppError::NotFound(format!("course {}", id)))
    }

    fn update(&self, conn: &Connection, course: &Course) -> Result<(), AppError> {
        let changed = conn.execute(
            "UPDATE course SET tenant_id = ?2, ext_id = ?3, center_id = ?4, product_id = ?5, name = ?6, notes = ?7, timezone = ?8, address = ?9, status = ?10, mode = ?11, max_attendees = ?12, num_attendees = ?13, updated_at = ?14 WHERE id = ?1",
            params![
                course.id,
                course.tenant_id,
                course.ext_id,
                course.center_id,
                course.product_id,
                course.name.trim(),
                course.notes,
                course.timezone,
                course.address,
                course.status,
                course.mode,
                course.max_attendees,
                course.num_attendees,
                course.updated_at
            ],
        )?;
        if changed == 0 {
            return Err(AppError::NotFound(format!("course {}", course.id)));
        }
        Ok(())
    }

    fn delete(&self, conn: &Connection, id: Id) -> Result<(), AppError> {
        let changed = conn.execute("DELETE FROM course WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(AppError::NotFound(format!("course {}", id)));
        }
        Ok(())
    }

    fn list(&self, conn: &Connection, query: &CourseListQuery) -> Result<Vec<Course>, AppError> {
        if query.statuses.as_ref().is_some_and(|s| s.is_empty()) {
            return Ok(Vec::new());
        }
        let limit = query.limit.unwrap_or(50).clamp(1, 200);
        let offset = query.offset.unwrap_or(0).max(0);

        let mut conditions = vec!["tenant_id = ?".to_string()];
        let mut bind_values = vec![Value::from(query.tenant_id)];

        if let Some(center_id) = query.center_id {
            conditions.push("center_id = ?".to_string());
            bind_values.push(center_id.into());
        }

        if let Some(ref statuses) = query.statuses {
            let ph: Vec<&str> = statuses.iter().map(|_| "?").collect();
            conditions.push(format!("status IN ({})", ph.join(",")));
            for s in statuses {
                bind_values.push(Value::Text(s.as_str().to_string()));
            }
        }

        bind_values.push(Value::Integer(limit as i64));
        bind_values.push(Value::Integer(offset as i64));

        let sql = format!(
            "SELECT {} FROM course WHERE {} ORDER BY updated_at DESC, id DESC LIMIT ? OFFSET ?",
            COURSE_COLUMNS,
            conditions.join(" AND ")
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(bind_values.iter()), course_from_row)?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    fn insert_association(
        &self,
        conn: &Connection,
        kind: AssociationKind,
        course_id: Id,
        members: &[Member],
    ) -> Result<(), AppError> {
        let now = timestamp(Utc::now());
        let table = kind.table();
        let column = kind.member_column();

        if kind.tracks_primary() {
            for chunk in members.chunks(max_rows_per_statement(4)) {
                bulk_insert(
                    self.placeholder,
                    table,
                    ["course_id", column, "is_primary", "updated_at"],
                    chunk,
                    |m| {
                        [
                            course_id.into(),
                            m.account_id.into(),
                            Value::Integer(i64::from(m.is_primary)),
                            now.clone(),
                        ]
                    },
                )
                .execute(conn)?;
            }
        } else {
            for chunk in members.chunks(max_rows_per_statement(3)) {
                bulk_insert(
                    self.placeholder,
                    table,
                    ["course_id", column, "updated_at"],
                    chunk,
                    |m| [course_id.into(), m.account_id.into(), now.clone()],
                )
                .execute(conn)?;
            }
        }
        Ok(())
    }

    fn delete_association(
        &self,
        conn: &Connection,
        kind: AssociationKind,
        course_id: Id,
        members: &[Member],
    ) -> Result<(), AppError> {
        for chunk in members.chunks(max_delete_rows_per_statement(2)) {
            bulk_delete(
                self.placeholder,
                kind.table(),
                ["course_id", kind.member_column()],
                chunk,
                |m| [course_id.into(), m.account_id.into()],
            )
            .execute(conn)?;
        }
        Ok(())
    }

    fn update_primary(
        &self,
        conn: &Connection,
        course_id: Id,
        members: &[Member],
    ) -> Result<(), AppError> {
        let now = Utc::now();
        let mut stmt = conn.prepare_cached(
            "UPDATE course_teacher SET is_primary = ?1, updated_at = ?2 WHERE course_id = ?3 AND teacher_id = ?4",
        )?;
        for m in members {
            stmt.execute(params![m.is_primary, now, course_id, m.account_id])?;
        }
        Ok(())
    }

    fn get_association(
        &self,
        conn: &Connection,
        kind: AssociationKind,
        course_id: Id,
    ) -> Result<Vec<Member>, AppError> {
        let primary = if kind.tracks_primary() { "is_primary" } else { "0" };
        let mut stmt = conn.prepare(&format!(
            "SELECT {}, {} FROM {} WHERE course_id = ?1 ORDER BY rowid",
            kind.member_column(),
            primary,
            kind.table()
        ))?;
        let rows = stmt.query_map([course_id], |r| {
            Ok(Member {
                account_id: r.get(0)?,
                is_primary: r.get(1)?,
            })
        })?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }
}
