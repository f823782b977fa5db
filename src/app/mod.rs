//! Application use cases and transactions.

mod course;

pub use course::{CourseCreated, CourseDetail, CourseService};
