//! Domain: course aggregate types, ids and membership reconciliation.

pub mod association;
pub mod course;
pub mod id;
pub mod reconcile;
pub mod timing;

pub use association::{AssociationKind, CourseMembers, Member};
pub use course::{Address, Course, CourseMode, CourseStatus};
pub use id::{Id, IdGenerator, ShardedIdGenerator};
pub use reconcile::{reconcile, reconcile_members, MemberDiff, Reconciliation};
pub use timing::CourseTiming;
