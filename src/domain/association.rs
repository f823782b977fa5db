//! Course ↔ account association kinds.

use super::Id;
use serde::{Deserialize, Serialize};

/// The four many-to-many links between a course and accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssociationKind {
    Organizer,
    Teacher,
    Contact,
    Notify,
}

impl AssociationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Organizer => "organizer",
            Self::Teacher => "teacher",
            Self::Contact => "contact",
            Self::Notify => "notify",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            Self::Organizer => "course_organizer",
            Self::Teacher => "course_teacher",
            Self::Contact => "course_contact",
            Self::Notify => "course_notify",
        }
    }

    /// Column holding the account id in this kind's link table.
    pub fn member_column(&self) -> &'static str {
        match self {
            Self::Organizer => "organizer_id",
            Self::Teacher => "teacher_id",
            Self::Contact => "contact_id",
            Self::Notify => "notify_id",
        }
    }

    /// Only teachers carry the `is_primary` attribute.
    pub fn tracks_primary(&self) -> bool {
        matches!(self, Self::Teacher)
    }

    pub fn all() -> &'static [Self] {
        &[Self::Organizer, Self::Teacher, Self::Contact, Self::Notify]
    }
}

/// One account linked to a course. Identity is the account id alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub account_id: Id,
    #[serde(default)]
    pub is_primary: bool,
}

impl Member {
    pub fn new(account_id: Id) -> Self {
        Self {
            account_id,
            is_primary: false,
        }
    }

    pub fn primary(account_id: Id) -> Self {
        Self {
            account_id,
            is_primary: true,
        }
    }
}

/// Desired membership for all four kinds, as handed over by callers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseMembers {
    #[serde(default)]
    pub organizers: Vec<Id>,
    #[serde(default)]
    pub teachers: Vec<Member>,
    #[serde(default)]
    pub contacts: Vec<Id>,
    #[serde(default)]
    pub notify_list: Vec<Id>,
}

impl CourseMembers {
    pub fn of_kind(&self, kind: AssociationKind) -> Vec<Member> {
        let plain =
            |ids: &[Id]| -> Vec<Member> { ids.iter().copied().map(Member::new).collect() };
        match kind {
            AssociationKind::Organizer => plain(&self.organizers),
            AssociationKind::Teacher => self.teachers.clone(),
            AssociationKind::Contact => plain(&self.contacts),
            AssociationKind::Notify => plain(&self.notify_list),
        }
    }
}
