//! Course entity, its address value object and lifecycle enums.

use super::Id;
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CourseStatus {
    #[default]
    Draft,
    Open,
    Active,
    Full,
    Closed,
    Canceled,
    Archived,
}

impl CourseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Open => "OPEN",
            Self::Active => "ACTIVE",
            Self::Full => "FULL",
            Self::Closed => "CLOSED",
            Self::Canceled => "CANCELED",
            Self::Archived => "ARCHIVED",
        }
    }

    pub fn all() -> &'static [Self] {
        &[
            Self::Draft,
            Self::Open,
            Self::Active,
            Self::Full,
            Self::Closed,
            Self::Canceled,
            Self::Archived,
        ]
    }
}

impl FromStr for CourseStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| AppError::InvalidEntity(format!("unknown course status: {}", s)))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CourseMode {
    #[default]
    InPerson,
    Online,
}

impl CourseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InPerson => "IN_PERSON",
            Self::Online => "ONLINE",
        }
    }
}

impl FromStr for CourseMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IN_PERSON" => Ok(Self::InPerson),
            "ONLINE" => Ok(Self::Online),
            _ => Err(AppError::InvalidEntity(format!("unknown course mode: {}", s))),
        }
    }
}

/// Postal address, persisted as a JSON document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub street1: String,
    #[serde(default)]
    pub street2: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(default)]
    pub id: Id,
    pub tenant_id: Id,
    pub center_id: Id,
    pub product_id: Id,
    pub ext_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub timezone: String,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub status: CourseStatus,
    #[serde(default)]
    pub mode: CourseMode,
    #[serde(default)]
    pub max_attendees: i32,
    #[serde(default)]
    pub num_attendees: i32,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Course {
    /// A draft, in-person course with empty optional fields.
    pub fn new(tenant_id: Id, center_id: Id, product_id: Id, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Id::INVALID,
            tenant_id,
            center_id,
            product_id,
            ext_id: None,
            name: name.into(),
            notes: String::new(),
            timezone: String::new(),
            address: Address::default(),
            status: CourseStatus::default(),
            mode: CourseMode::default(),
            max_attendees: 0,
            num_attendees: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::InvalidEntity("course name is required".into()));
        }
        if !self.tenant_id.is_valid() {
            return Err(AppError::InvalidEntity(format!(
                "invalid tenant id: {}",
                self.tenant_id
            )));
        }
        Ok(())
    }
}
