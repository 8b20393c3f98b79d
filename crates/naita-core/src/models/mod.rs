//! Data models for NAITA MIS entities.
//!
//! These mirror the JSON returned by the REST API:
//!
//! - `Student`, `Qualification`: trainee records with O/L and A/L results
//! - `Course`, `InstructorDetails`: courses offered at training centers
//! - `Center`: training centers, used as a lookup/filter dimension
//! - `ApprovalRequest`: requests awaiting head office or district approval
//! - `AttendanceRecord`: per student, per course, per day attendance
//! - `Role`: user roles that select a dashboard

pub mod approval;
pub mod attendance;
pub mod center;
pub mod course;
pub mod student;
pub mod user;

pub use approval::{ApprovalRequest, ApprovalSortColumn, ApprovalStatus, Priority, Requester};
pub use attendance::{AttendanceRecord, AttendanceStatus};
pub use center::Center;
pub use course::{Course, CourseSortColumn, CourseStatus, InstructorDetails};
pub use student::{
    EnrollmentStatus, Gender, NewStudent, Qualification, Student, StudentSortColumn,
    TrainingNature,
};
pub use user::{CurrentUser, Role};

use serde::{Deserialize, Deserializer};

/// Decode a list field that the API may send as `null`.
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
