//! Course aggregate use cases: create, update, get, list, delete.

use crate::domain::{
    reconcile, reconcile_members, AssociationKind, Course, CourseMembers, CourseTiming, Id,
    IdGenerator, Member,
};
use crate::error::AppError;
use crate::infra::{
    get_connection, CourseListQuery, CourseRepository, DbPool, Logger, SqliteCourseRepository,
    TimingRepository,
};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseCreated {
    pub course_id: Id,
    /// One id per input timing, in input order.
    pub timing_ids: Vec<Id>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetail {
    pub course: Course,
    pub organizers: Vec<Id>,
    pub teachers: Vec<Member>,
    pub contacts: Vec<Id>,
    pub notify_list: Vec<Id>,
    pub timings: Vec<CourseTiming>,
}

pub struct CourseService<R: CourseRepository = SqliteCourseRepository> {
    pool: Arc<DbPool>,
    repo: R,
    ids: Arc<dyn IdGenerator>,
    logger: Logger,
}

impl CourseService<SqliteCourseRepository> {
    pub fn new(pool: Arc<DbPool>, ids: Arc<dyn IdGenerator>, logger: Logger) -> Self {
        Self::with_repository(pool, SqliteCourseRepository::new(), ids, logger)
    }
}

impl<R: CourseRepository> CourseService<R> {
    pub fn with_repository(
        pool: Arc<DbPool>,
        repo: R,
        ids: Arc<dyn IdGenerator>,
        logger: Logger,
    ) -> Self {
        Self {
            pool,
            repo,
            ids,
            logger,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Persists a new course with its members and timings as one unit.
    ///
    /// Nothing is written when validation fails, and nothing stays written
    /// when any later step fails.
    pub fn create_course(
        &self,
        mut course: Course,
        members: &CourseMembers,
        timings: Vec<CourseTiming>,
    ) -> Result<CourseCreated, AppError> {
        validate_aggregate(&course, &timings).inspect_err(|e| self.log_failure("create", e))?;

        let now = Utc::now();
        if !course.id.is_valid() {
            course.id = self.ids.next_id();
        }
        course.created_at = now;
        course.updated_at = now;

        let created = self
            .in_transaction(|tx| self.write_new_course(tx, &course, members, timings, now))
            .inspect_err(|e| self.log_failure("create", e))?;

        self.logger.info(format_args!(
            "created course {} (tenant {}) with {} timings",
            created.course_id,
            course.tenant_id,
            created.timing_ids.len()
        ));
        Ok(created)
    }

    /// Rewrites scalar fields, reconciles all four member kinds and the
    /// timing set. Returns timing ids in input order.
    pub fn update_course(
        &self,
        mut course: Course,
        members: &CourseMembers,
        timings: Vec<CourseTiming>,
    ) -> Result<Vec<Id>, AppError> {
        validate_aggregate(&course, &timings)
            .and_then(|()| reject_repeated_timings(&timings))
            .inspect_err(|e| self.log_failure("update", e))?;
        if !course.id.is_valid() {
            return Err(AppError::NotFound(format!("course {}", course.id)));
        }

        let now = Utc::now();
        course.updated_at = now;

        let timing_ids = self
            .in_transaction(|tx| {
                self.repo.update(tx, &course)?;
                for &kind in AssociationKind::all() {
                    let diff =
                        self.repo
                            .reconcile_association(tx, kind, course.id, &members.of_kind(kind))?;
                    if !diff.is_empty() {
                        self.logger.debug(format_args!(
                            "course {} {}: +{} -{} ~{}",
                            course.id,
                            kind.as_str(),
                            diff.to_add.len(),
                            diff.to_remove.len(),
                            diff.to_update.len()
                        ));
                    }
                }
                self.sync_timings(tx, course.id, timings, now)
            })
            .inspect_err(|e| self.log_failure("update", e))?;

        self.logger.info(format_args!("updated course {}", course.id));
        Ok(timing_ids)
    }

    pub fn get_course(&self, id: Id) -> Result<CourseDetail, AppError> {
        let conn = get_connection(&self.pool)?;
        let course = self.repo.get(&conn, id)?;
        let ids_of = |kind: AssociationKind| -> Result<Vec<Id>, AppError> {
            Ok(self
                .repo
                .get_association(&conn, kind, id)?
                .into_iter()
                .map(|m| m.account_id)
                .collect())
        };

        Ok(CourseDetail {
            organizers: ids_of(AssociationKind::Organizer)?,
            teachers: self.repo.get_association(&conn, AssociationKind::Teacher, id)?,
            contacts: ids_of(AssociationKind::Contact)?,
            notify_list: ids_of(AssociationKind::Notify)?,
            timings: self.repo.timings().get_by_course(&conn, id)?,
            course,
        })
    }

    pub fn list_courses(&self, query: &CourseListQuery) -> Result<Vec<Course>, AppError> {
        let conn = get_connection(&self.pool)?;
        self.repo.list(&conn, query)
    }

    pub fn get_members(
        &self,
        kind: AssociationKind,
        course_id: Id,
    ) -> Result<Vec<Member>, AppError> {
        let conn = get_connection(&self.pool)?;
        self.repo.get_association(&conn, kind, course_id)
    }

    pub fn get_timings(&self, course_id: Id) -> Result<Vec<CourseTiming>, AppError> {
        let conn = get_connection(&self.pool)?;
        self.repo.timings().get_by_course(&conn, course_id)
    }

    /// Removes the course; its links and timings go with it.
    pub fn delete_course(&self, id: Id) -> Result<(), AppError> {
        let conn = get_connection(&self.pool)?;
        self.repo
            .delete(&conn, id)
            .inspect_err(|e| self.log_failure("delete", e))?;
        self.logger.info(format_args!("deleted course {}", id));
        Ok(())
    }

    fn in_transaction<T>(
        &self,
        work: impl FnOnce(&Transaction<'_>) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let conn = get_connection(&self.pool)?;
        // IMMEDIATE takes the write lock up front, so read-diff-write cannot interleave.
        let tx = Transaction::new_unchecked(&conn, TransactionBehavior::Immediate)?;
        let out = work(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    fn write_new_course(
        &self,
        conn: &Connection,
        course: &Course,
        members: &CourseMembers,
        timings: Vec<CourseTiming>,
        now: DateTime<Utc>,
    ) -> Result<CourseCreated, AppError> {
        let course_id = self.repo.create(conn, course)?;

        for &kind in AssociationKind::all() {
            // Diffing against nothing collapses duplicate ids.
            let initial = reconcile_members(&[], &members.of_kind(kind)).to_add;
            if !initial.is_empty() {
                self.repo.insert_association(conn, kind, course_id, &initial)?;
            }
        }

        let mut timing_ids = Vec::with_capacity(timings.len());
        for mut timing in timings {
            timing.id = self.ids.next_id();
            timing.course_id = course_id;
            timing.created_at = now;
            timing.updated_at = now;
            timing_ids.push(self.repo.timings().create(conn, &timing)?);
        }

        Ok(CourseCreated {
            course_id,
            timing_ids,
        })
    }

    /// Timings with an id are updated, timings without one are created,
    /// persisted timings missing from `timings` are deleted.
    fn sync_timings(
        &self,
        conn: &Connection,
        course_id: Id,
        timings: Vec<CourseTiming>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Id>, AppError> {
        let repo = self.repo.timings();
        let current: Vec<Id> = repo
            .get_by_course(conn, course_id)?
            .iter()
            .map(|t| t.id)
            .collect();
        let kept: Vec<Id> = timings.iter().map(|t| t.id).filter(|id| id.is_valid()).collect();

        let diff = reconcile(&current, &kept);
        if let Some(foreign) = diff.to_add.first() {
            return Err(AppError::NotFound(format!(
                "course timing {} of course {}",
                foreign, course_id
            )));
        }
        for id in &diff.to_remove {
            repo.delete(conn, *id)?;
        }

        let mut ids = Vec::with_capacity(timings.len());
        for mut timing in timings {
            timing.course_id = course_id;
            timing.updated_at = now;
            if timing.id.is_valid() {
                repo.update(conn, &timing)?;
            } else {
                timing.id = self.ids.next_id();
                timing.created_at = now;
                repo.create(conn, &timing)?;
            }
            ids.push(timing.id);
        }
        Ok(ids)
    }

    fn log_failure(&self, op: &str, err: &AppError) {
        match err {
            AppError::InvalidEntity(_) | AppError::NotFound(_) => {
                self.logger.warn(format_args!("{} course rejected: {}", op, err))
            }
            _ => self.logger.error(format_args!("{} course failed: {}", op, err)),
        }
    }
}

/// A persisted timing may appear once per update.
fn reject_repeated_timings(timings: &[CourseTiming]) -> Result<(), AppError> {
    let mut seen = HashSet::new();
    for id in timings.iter().map(|t| t.id).filter(|id| id.is_valid()) {
        if !seen.insert(id) {
            return Err(AppError::InvalidEntity(format!(
                "course timing {} listed more than once",
                id
            )));
        }
    }
    Ok(())
}

fn validate_aggregate(course: &Course, timings: &[CourseTiming]) -> Result<(), AppError> {
    course.validate()?;
    for timing in timings {
        timing.validate()?;
    }
    Ok(())
}
