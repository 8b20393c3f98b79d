use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::approval::Priority;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CourseStatus {
    Pending,
    Approved,
    Active,
    Inactive,
    Rejected,
    Completed,
}

impl CourseStatus {
    pub const ALL: [CourseStatus; 6] = [
        CourseStatus::Pending,
        CourseStatus::Approved,
        CourseStatus::Active,
        CourseStatus::Inactive,
        CourseStatus::Rejected,
        CourseStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CourseStatus::Pending => "Pending",
            CourseStatus::Approved => "Approved",
            CourseStatus::Active => "Active",
            CourseStatus::Inactive => "Inactive",
            CourseStatus::Rejected => "Rejected",
            CourseStatus::Completed => "Completed",
        }
    }
}

impl std::fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Denormalized instructor fields sent alongside a course
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstructorDetails {
    pub id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl InstructorDetails {
    pub fn full_name(&self) -> Option<String> {
        let first = self.first_name.as_deref().unwrap_or("").trim();
        let last = self.last_name.as_deref().unwrap_or("").trim();
        let name = format!("{} {}", first, last).trim().to_string();
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub code: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub duration: Option<String>,
    pub schedule: Option<String>,
    /// Enrolled student count. The backend does not constrain it.
    #[serde(default)]
    pub students: i64,
    /// Percentage complete, nominally 0-100 but not enforced server side
    #[serde(default)]
    pub progress: i64,
    pub next_session: Option<String>,
    pub instructor: Option<i64>,
    pub instructor_details: Option<InstructorDetails>,
    pub district: Option<String>,
    pub center: Option<i64>,
    pub center_name: Option<String>,
    pub status: CourseStatus,
    pub priority: Option<Priority>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Course {
    pub fn instructor_name(&self) -> Option<String> {
        self.instructor_details.as_ref().and_then(|i| i.full_name())
    }

    pub fn instructor_display(&self) -> String {
        self.instructor_name()
            .unwrap_or_else(|| "Unassigned".to_string())
    }

    /// Progress clamped to the 0-100 range the UI expects
    pub fn progress_percent(&self) -> u8 {
        self.progress.clamp(0, 100) as u8
    }

    /// Enrolled students, with negative counts treated as none
    pub fn student_count(&self) -> u64 {
        self.students.max(0) as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseSortColumn {
    Name,
    Code,
    Status,
    Students,
    Progress,
}
