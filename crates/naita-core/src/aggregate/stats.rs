//! Stat-card summaries for each record type.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{average, count, group_by, percentage, recent, top_n, RECENT_WINDOW_DAYS, TOP_GROUPS};
use crate::models::{
    ApprovalRequest, ApprovalStatus, AttendanceRecord, AttendanceStatus, Course, CourseStatus,
    EnrollmentStatus, Priority, Student,
};

/// Any of the summaries below, as carried by a report payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Summary {
    Students(StudentStats),
    Courses(CourseStats),
    Approvals(ApprovalStats),
    Attendance(AttendanceStats),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentStats {
    pub total: usize,
    pub trained: usize,
    pub not_trained: usize,
    pub with_ol: usize,
    pub with_al: usize,
    /// Created within the last seven days
    pub recent: usize,
    pub avg_ol_subjects: f64,
    pub avg_al_subjects: f64,
    pub by_status: BTreeMap<String, usize>,
    pub top_districts: Vec<(String, usize)>,
}

impl StudentStats {
    pub fn compute<'a, I>(students: I, now: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = &'a Student>,
    {
        let students: Vec<&Student> = students.into_iter().collect();
        let total = students.len();
        let trained = count(students.iter().copied(), |s| s.training_received);
        let ol_sum: usize = students.iter().map(|s| s.ol_results.len()).sum();
        let al_sum: usize = students.iter().map(|s| s.al_results.len()).sum();

        let mut by_status: BTreeMap<String, usize> = EnrollmentStatus::ALL
            .iter()
            .map(|s| (s.as_str().to_string(), 0))
            .collect();
        for student in &students {
            if let Some(status) = student.enrollment_status {
                *by_status.entry(status.as_str().to_string()).or_insert(0) += 1;
            }
        }

        let districts = group_by(students.iter().copied(), |s| s.district.clone());

        Self {
            total,
            trained,
            not_trained: total - trained,
            with_ol: count(students.iter().copied(), |s| s.has_ol_results()),
            with_al: count(students.iter().copied(), |s| s.has_al_results()),
            recent: recent(
                students.iter().copied(),
                |s| s.created_at,
                Duration::days(RECENT_WINDOW_DAYS),
                now,
            )
            .len(),
            avg_ol_subjects: average(ol_sum as f64, total),
            avg_al_subjects: average(al_sum as f64, total),
            by_status,
            top_districts: top_n(&districts, TOP_GROUPS),
        }
    }

    pub fn trained_percent(&self) -> f64 {
        percentage(self.trained, self.total)
    }

    pub fn not_trained_percent(&self) -> f64 {
        percentage(self.not_trained, self.total)
    }

    pub fn status_count(&self, status: EnrollmentStatus) -> usize {
        self.by_status.get(status.as_str()).copied().unwrap_or(0)
    }
}

/// Most recently created students, newest first
pub fn latest_students<'a, I>(students: I, limit: usize) -> Vec<&'a Student>
where
    I: IntoIterator<Item = &'a Student>,
{
    let mut sorted: Vec<&Student> = students.into_iter().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sorted.truncate(limit);
    sorted
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseStats {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    pub total_students: u64,
    pub avg_progress: f64,
}

impl CourseStats {
    pub fn compute<'a, I>(courses: I) -> Self
    where
        I: IntoIterator<Item = &'a Course>,
    {
        let courses: Vec<&Course> = courses.into_iter().collect();
        let total = courses.len();

        let mut by_status: BTreeMap<String, usize> = CourseStatus::ALL
            .iter()
            .map(|s| (s.as_str().to_string(), 0))
            .collect();
        for course in &courses {
            *by_status.entry(course.status.as_str().to_string()).or_insert(0) += 1;
        }

        let progress_sum: f64 = courses.iter().map(|c| c.progress_percent() as f64).sum();

        Self {
            total,
            by_status,
            total_students: courses.iter().map(|c| c.student_count()).sum(),
            avg_progress: average(progress_sum, total),
        }
    }

    pub fn status_count(&self, status: CourseStatus) -> usize {
        self.by_status.get(status.as_str()).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApprovalStats {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub under_review: usize,
    /// High priority requests still awaiting a decision
    pub urgent: usize,
}

impl ApprovalStats {
    pub fn compute<'a, I>(approvals: I) -> Self
    where
        I: IntoIterator<Item = &'a ApprovalRequest>,
    {
        let approvals: Vec<&ApprovalRequest> = approvals.into_iter().collect();
        let with_status = |status: ApprovalStatus| {
            count(approvals.iter().copied(), |a| a.status == status)
        };

        Self {
            total: approvals.len(),
            pending: with_status(ApprovalStatus::Pending),
            approved: with_status(ApprovalStatus::Approved),
            rejected: with_status(ApprovalStatus::Rejected),
            under_review: with_status(ApprovalStatus::UnderReview),
            urgent: count(approvals.iter().copied(), |a| {
                a.priority == Priority::High && a.status.is_open()
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendanceStats {
    pub total: usize,
    pub present: usize,
    pub absent: usize,
    pub late: usize,
    /// Late arrivals count as half attendance
    pub attendance_rate: f64,
}

impl AttendanceStats {
    pub fn compute<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a AttendanceRecord>,
    {
        let records: Vec<&AttendanceRecord> = records.into_iter().collect();
        let with_status = |status: AttendanceStatus| {
            count(records.iter().copied(), |r| r.status == status)
        };
        let total = records.len();
        let present = with_status(AttendanceStatus::Present);
        let late = with_status(AttendanceStatus::Late);

        let attendance_rate = if total == 0 {
            0.0
        } else {
            (present as f64 + late as f64 * 0.5) / total as f64 * 100.0
        };

        Self {
            total,
            present,
            absent: with_status(AttendanceStatus::Absent),
            late,
            attendance_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{apply, Criteria, StudentField};

    fn scenario() -> Vec<Student> {
        serde_json::from_value(serde_json::json!([
            {"full_name_english": "Kamal Perera", "district": "Colombo", "enrollment_status": "Enrolled"},
            {"full_name_english": "Nimali Silva", "district": "Colombo", "enrollment_status": "Pending"},
            {"full_name_english": "Saman Kumara", "district": "Galle", "enrollment_status": "Enrolled"}
        ]))
        .expect("student fixtures")
    }

    #[test]
    fn test_trained_count_over_filtered_district() {
        let students = scenario();
        let colombo = apply(&students, &Criteria::new().select(StudentField::District, "Colombo"));
        assert_eq!(colombo.len(), 2);

        let stats = StudentStats::compute(colombo, Utc::now());
        assert_eq!(stats.total, 2);
        assert_eq!(stats.trained, 0);
        assert_eq!(stats.trained_percent(), 0.0);
        assert_eq!(stats.not_trained, 2);
    }

    #[test]
    fn test_student_stats_breakdowns() {
        let now = Utc::now();
        let mut students = scenario();
        students[0].training_received = true;
        students[0].created_at = Some(now - Duration::days(2));
        students[1].created_at = Some(now - Duration::days(10));
        students[0].ol_results = serde_json::from_value(serde_json::json!([
            {"subject": "Mathematics", "grade": "A", "year": 2019},
            {"subject": "Science", "grade": "B", "year": 2019}
        ]))
        .expect("qualifications");

        let stats = StudentStats::compute(&students, now);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.trained, 1);
        assert_eq!(stats.recent, 1);
        assert_eq!(stats.with_ol, 1);
        assert_eq!(stats.with_al, 0);
        assert!((stats.avg_ol_subjects - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.status_count(EnrollmentStatus::Enrolled), 2);
        assert_eq!(stats.status_count(EnrollmentStatus::Dropped), 0);
        assert_eq!(stats.top_districts[0], ("Colombo".to_string(), 2));
    }

    #[test]
    fn test_student_stats_empty() {
        let empty: Vec<Student> = Vec::new();
        let stats = StudentStats::compute(&empty, Utc::now());
        assert_eq!(stats.total, 0);
        assert_eq!(stats.trained_percent(), 0.0);
        assert_eq!(stats.avg_al_subjects, 0.0);
        assert!(stats.top_districts.is_empty());
    }

    #[test]
    fn test_latest_students() {
        let now = Utc::now();
        let mut students = scenario();
        students[0].created_at = Some(now - Duration::days(3));
        students[1].created_at = Some(now - Duration::days(1));
        let latest = latest_students(&students, 2);
        assert_eq!(latest[0].full_name_english, "Nimali Silva");
        assert_eq!(latest[1].full_name_english, "Kamal Perera");
    }

    #[test]
    fn test_course_stats() {
        let courses: Vec<Course> = serde_json::from_value(serde_json::json!([
            {"name": "Web Development", "status": "Active", "students": 24, "progress": 60},
            {"name": "Welding", "status": "Active", "students": 16, "progress": 30},
            {"name": "Plumbing", "status": "Pending"}
        ]))
        .expect("course fixtures");

        let stats = CourseStats::compute(&courses);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.status_count(CourseStatus::Active), 2);
        assert_eq!(stats.status_count(CourseStatus::Completed), 0);
        assert_eq!(stats.total_students, 40);
        assert!((stats.avg_progress - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_approval_stats() {
        let approvals: Vec<ApprovalRequest> = serde_json::from_value(serde_json::json!([
            {"id": 1, "type": "A", "priority": "High", "status": "Pending"},
            {"id": 2, "type": "B", "priority": "High", "status": "Approved"},
            {"id": 3, "type": "C", "priority": "Low", "status": "Under Review"},
            {"id": 4, "type": "D", "priority": "High", "status": "Under Review"},
            {"id": 5, "type": "E", "priority": "Medium", "status": "Rejected"}
        ]))
        .expect("approval fixtures");

        let stats = ApprovalStats::compute(&approvals);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.approved, 1);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.under_review, 2);
        assert_eq!(stats.urgent, 2);
    }

    #[test]
    fn test_attendance_rate_counts_late_as_half() {
        let records: Vec<AttendanceRecord> = serde_json::from_value(serde_json::json!([
            {"student_name": "A", "date": "2024-03-15", "status": "present"},
            {"student_name": "B", "date": "2024-03-15", "status": "absent"},
            {"student_name": "C", "date": "2024-03-15", "status": "late"},
            {"student_name": "D", "date": "2024-03-15", "status": "present"}
        ]))
        .expect("attendance fixtures");

        let stats = AttendanceStats::compute(&records);
        assert_eq!(stats.present, 2);
        assert_eq!(stats.absent, 1);
        assert_eq!(stats.late, 1);
        assert!((stats.attendance_rate - 62.5).abs() < 1e-9);

        let empty: Vec<AttendanceRecord> = Vec::new();
        assert_eq!(AttendanceStats::compute(&empty).attendance_rate, 0.0);
    }

    #[test]
    fn test_summary_is_tagged() {
        let summary = Summary::Approvals(ApprovalStats::default());
        let json = serde_json::to_value(&summary).expect("serialize");
        assert_eq!(json["kind"], "approvals");
        assert_eq!(json["pending"], 0);
    }
}
