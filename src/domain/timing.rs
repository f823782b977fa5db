//! Scheduled occurrences owned by a course.

use super::Id;
use crate::error::AppError;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseTiming {
    /// `Id::INVALID` for a timing that has not been persisted yet.
    #[serde(default)]
    pub id: Id,
    #[serde(default)]
    pub course_id: Id,
    pub ext_id: Option<String>,
    pub course_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl CourseTiming {
    pub fn new(course_date: NaiveDate, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        let now = Utc::now();
        Self {
            id: Id::INVALID,
            course_id: Id::INVALID,
            ext_id: None,
            course_date,
            start_time,
            end_time,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.end_time < self.start_time {
            return Err(AppError::InvalidEntity(format!(
                "timing on {} ends ({}) before it starts ({})",
                self.course_date, self.end_time, self.start_time
            )));
        }
        Ok(())
    }
}
