//! Field tables wiring each entity type into the filter engine.

use std::borrow::Cow;

use super::{FilterField, Filterable};
use crate::models::{ApprovalRequest, AttendanceRecord, Center, Course, Student};

fn opt(value: &Option<String>) -> Option<Cow<'_, str>> {
    value.as_deref().map(Cow::Borrowed)
}

fn text(value: &str) -> Option<Cow<'_, str>> {
    Some(Cow::Borrowed(value))
}

// ============================================================================
// Students
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudentField {
    FullName,
    NameWithInitials,
    Nic,
    RegistrationNo,
    Email,
    Mobile,
    District,
    CenterName,
    CourseName,
    EnrollmentStatus,
    TrainingReceived,
    Gender,
    Batch,
}

impl FilterField for StudentField {
    fn sentinel(&self) -> &'static str {
        match self {
            StudentField::District => "All Districts",
            StudentField::EnrollmentStatus => "All Status",
            StudentField::CenterName => "All Centers",
            StudentField::CourseName => "All Courses",
            StudentField::Batch => "All Batches",
            _ => "All",
        }
    }
}

impl Filterable for Student {
    type Field = StudentField;

    const SEARCH_FIELDS: &'static [StudentField] = &[
        StudentField::FullName,
        StudentField::NameWithInitials,
        StudentField::Nic,
        StudentField::RegistrationNo,
        StudentField::Email,
        StudentField::Mobile,
        StudentField::District,
        StudentField::CenterName,
        StudentField::CourseName,
    ];

    fn field_value(&self, field: StudentField) -> Option<Cow<'_, str>> {
        match field {
            StudentField::FullName => text(&self.full_name_english),
            StudentField::NameWithInitials => text(&self.name_with_initials),
            StudentField::Nic => text(&self.nic_id),
            StudentField::RegistrationNo => text(&self.registration_no),
            StudentField::Email => opt(&self.email),
            StudentField::Mobile => opt(&self.mobile_no),
            StudentField::District => opt(&self.district),
            StudentField::CenterName => opt(&self.center_name),
            StudentField::CourseName => opt(&self.course_name),
            StudentField::EnrollmentStatus => {
                self.enrollment_status.map(|s| Cow::Borrowed(s.as_str()))
            }
            StudentField::TrainingReceived => Some(Cow::Borrowed(self.training_label())),
            StudentField::Gender => self.gender.map(|g| Cow::Owned(g.to_string())),
            StudentField::Batch => opt(&self.batch_display),
        }
    }
}

// ============================================================================
// Courses
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseField {
    Name,
    Code,
    Category,
    District,
    Status,
    Instructor,
    CenterName,
}

impl FilterField for CourseField {
    fn sentinel(&self) -> &'static str {
        match self {
            CourseField::Category => "All Categories",
            CourseField::District => "All Districts",
            CourseField::Status => "All Status",
            CourseField::CenterName => "All Centers",
            _ => "All",
        }
    }
}

impl Filterable for Course {
    type Field = CourseField;

    const SEARCH_FIELDS: &'static [CourseField] = &[
        CourseField::Name,
        CourseField::Code,
        CourseField::Category,
        CourseField::District,
        CourseField::Instructor,
        CourseField::CenterName,
    ];

    fn field_value(&self, field: CourseField) -> Option<Cow<'_, str>> {
        match field {
            CourseField::Name => text(&self.name),
            CourseField::Code => text(&self.code),
            CourseField::Category => opt(&self.category),
            CourseField::District => opt(&self.district),
            CourseField::Status => Some(Cow::Borrowed(self.status.as_str())),
            CourseField::Instructor => self.instructor_name().map(Cow::Owned),
            CourseField::CenterName => opt(&self.center_name),
        }
    }
}

// ============================================================================
// Centers
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CenterField {
    Name,
    Location,
    District,
    Manager,
    Status,
}

impl FilterField for CenterField {
    fn sentinel(&self) -> &'static str {
        match self {
            CenterField::District => "All Districts",
            CenterField::Status => "All Status",
            _ => "All",
        }
    }
}

impl Filterable for Center {
    type Field = CenterField;

    const SEARCH_FIELDS: &'static [CenterField] = &[
        CenterField::Name,
        CenterField::Location,
        CenterField::District,
        CenterField::Manager,
    ];

    fn field_value(&self, field: CenterField) -> Option<Cow<'_, str>> {
        match field {
            CenterField::Name => text(&self.name),
            CenterField::Location => opt(&self.location),
            CenterField::District => opt(&self.district),
            CenterField::Manager => opt(&self.manager),
            CenterField::Status => text(&self.status),
        }
    }
}

// ============================================================================
// Approvals
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalField {
    Type,
    Center,
    Description,
    Requester,
    Status,
    Priority,
}

impl FilterField for ApprovalField {
    fn sentinel(&self) -> &'static str {
        match self {
            ApprovalField::Status => "All Status",
            ApprovalField::Priority => "All Priorities",
            ApprovalField::Center => "All Centers",
            _ => "All",
        }
    }
}

impl Filterable for ApprovalRequest {
    type Field = ApprovalField;

    const SEARCH_FIELDS: &'static [ApprovalField] = &[
        ApprovalField::Type,
        ApprovalField::Center,
        ApprovalField::Description,
        ApprovalField::Requester,
    ];

    fn field_value(&self, field: ApprovalField) -> Option<Cow<'_, str>> {
        match field {
            ApprovalField::Type => text(&self.request_type),
            ApprovalField::Center => opt(&self.center),
            ApprovalField::Description => text(&self.description),
            ApprovalField::Requester => Some(Cow::Owned(self.requested_by.full_name())),
            ApprovalField::Status => Some(Cow::Borrowed(self.status.as_str())),
            ApprovalField::Priority => Some(Cow::Borrowed(self.priority.as_str())),
        }
    }
}

// ============================================================================
// Attendance
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceField {
    StudentName,
    StudentNic,
    Course,
    Status,
}

impl FilterField for AttendanceField {
    fn sentinel(&self) -> &'static str {
        match self {
            AttendanceField::Course => "All Courses",
            AttendanceField::Status => "All Status",
            _ => "All",
        }
    }
}

impl Filterable for AttendanceRecord {
    type Field = AttendanceField;

    const SEARCH_FIELDS: &'static [AttendanceField] = &[
        AttendanceField::StudentName,
        AttendanceField::StudentNic,
        AttendanceField::Course,
    ];

    fn field_value(&self, field: AttendanceField) -> Option<Cow<'_, str>> {
        match field {
            AttendanceField::StudentName => text(&self.student_name),
            AttendanceField::StudentNic => text(&self.student_nic),
            AttendanceField::Course => text(&self.course_name),
            AttendanceField::Status => Some(Cow::Borrowed(self.status.as_str())),
        }
    }
}
