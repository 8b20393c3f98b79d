//! District manager report: enrollment, training, trends and center performance.

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{count, percentage, round_one_decimal, within_window, RECENT_WINDOW_DAYS};
use crate::filter::{apply, CenterField, Criteria, CourseField, StudentField};
use crate::models::{
    ApprovalRequest, ApprovalStatus, Center, Course, CourseStatus, EnrollmentStatus, Student,
};

/// Months shown in the enrollment trend
const TREND_MONTHS: i64 = 6;

/// Width of one trend bucket
const TREND_BUCKET_DAYS: i64 = 30;

/// Active courses listed in the completion chart
const COMPLETION_COURSES: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    Weekly,
    #[default]
    Monthly,
    Quarterly,
    Yearly,
}

impl ReportPeriod {
    pub fn days(&self) -> i64 {
        match self {
            ReportPeriod::Weekly => 7,
            ReportPeriod::Monthly => 30,
            ReportPeriod::Quarterly => 90,
            ReportPeriod::Yearly => 365,
        }
    }

    /// Parse a period name. Anything unrecognised is treated as yearly.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "weekly" => ReportPeriod::Weekly,
            "monthly" => ReportPeriod::Monthly,
            "quarterly" => ReportPeriod::Quarterly,
            _ => ReportPeriod::Yearly,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportPeriod::Weekly => "weekly",
            ReportPeriod::Monthly => "monthly",
            ReportPeriod::Quarterly => "quarterly",
            ReportPeriod::Yearly => "yearly",
        }
    }
}

impl std::fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PerformanceTier {
    Excellent,
    Good,
    Average,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
}

impl PerformanceTier {
    pub const ALL: [PerformanceTier; 4] = [
        PerformanceTier::Excellent,
        PerformanceTier::Good,
        PerformanceTier::Average,
        PerformanceTier::NeedsImprovement,
    ];

    /// Tier for a completion rate in percent
    pub fn from_rate(rate: f64) -> Self {
        if rate >= 80.0 {
            PerformanceTier::Excellent
        } else if rate >= 60.0 {
            PerformanceTier::Good
        } else if rate >= 40.0 {
            PerformanceTier::Average
        } else {
            PerformanceTier::NeedsImprovement
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceTier::Excellent => "Excellent",
            PerformanceTier::Good => "Good",
            PerformanceTier::Average => "Average",
            PerformanceTier::NeedsImprovement => "Needs Improvement",
        }
    }
}

impl std::fmt::Display for PerformanceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentBreakdown {
    pub enrolled: usize,
    pub completed: usize,
    pub pending: usize,
    pub dropped: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecentActivity {
    pub new_students: usize,
    pub new_courses: usize,
    /// Students marked completed within the window
    pub completed_students: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyEnrollment {
    pub month: String,
    pub students: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CenterPerformance {
    pub center: String,
    pub students: usize,
    pub completion_rate: f64,
    pub tier: PerformanceTier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseCompletion {
    pub course: String,
    pub completion: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictReport {
    pub district: Option<String>,
    pub center: Option<String>,
    pub period: ReportPeriod,
    pub generated_at: DateTime<Utc>,
    pub total_students: usize,
    pub total_centers: usize,
    pub total_courses: usize,
    pub active_courses: usize,
    /// Students created within the report period
    pub students_in_period: usize,
    pub pending_approvals: usize,
    pub enrollment: EnrollmentBreakdown,
    pub trained: usize,
    pub not_trained: usize,
    pub recent_activity: RecentActivity,
    pub enrollment_trend: Vec<MonthlyEnrollment>,
    pub center_performance: Vec<CenterPerformance>,
    pub course_completion: Vec<CourseCompletion>,
    /// completed / (enrolled + completed), one decimal
    pub completion_rate: f64,
}

/// Scope of a district report: optional district and center name
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportScope<'a> {
    pub district: Option<&'a str>,
    pub center: Option<&'a str>,
    pub period: ReportPeriod,
}

impl DistrictReport {
    pub fn build(
        students: &[Student],
        courses: &[Course],
        centers: &[Center],
        approvals: &[ApprovalRequest],
        scope: ReportScope<'_>,
        now: DateTime<Utc>,
    ) -> Self {
        let students = apply(
            students,
            &Criteria::new()
                .select_opt(StudentField::District, scope.district)
                .select_opt(StudentField::CenterName, scope.center),
        );
        let courses = apply(
            courses,
            &Criteria::new()
                .select_opt(CourseField::District, scope.district)
                .select_opt(CourseField::CenterName, scope.center),
        );
        let centers = apply(
            centers,
            &Criteria::new()
                .select_opt(CenterField::District, scope.district)
                .select_opt(CenterField::Name, scope.center),
        );

        let week = Duration::days(RECENT_WINDOW_DAYS);
        let with_status = |status: EnrollmentStatus| {
            count(students.iter().copied(), |s| s.enrollment_status == Some(status))
        };

        let enrollment = EnrollmentBreakdown {
            enrolled: with_status(EnrollmentStatus::Enrolled),
            completed: with_status(EnrollmentStatus::Completed),
            pending: with_status(EnrollmentStatus::Pending),
            dropped: with_status(EnrollmentStatus::Dropped),
        };
        let trained = count(students.iter().copied(), |s| s.training_received);

        let recent_activity = RecentActivity {
            new_students: count(students.iter().copied(), |s| {
                within_window(s.created_at.as_ref(), week, now)
            }),
            new_courses: count(courses.iter().copied(), |c| {
                within_window(c.created_at.as_ref(), week, now)
            }),
            completed_students: count(students.iter().copied(), |s| {
                s.enrollment_status == Some(EnrollmentStatus::Completed)
                    && within_window(s.updated_at.as_ref(), week, now)
            }),
        };

        let center_names: Vec<&str> = centers.iter().map(|c| c.name.as_str()).collect();
        let pending_approvals = count(approvals, |a| {
            a.status == ApprovalStatus::Pending
                && a.center
                    .as_deref()
                    .map(|c| center_names.contains(&c))
                    .unwrap_or(false)
        });

        let center_performance = centers
            .iter()
            .map(|center| {
                let members: Vec<&Student> = students
                    .iter()
                    .copied()
                    .filter(|s| belongs_to_center(s, center))
                    .collect();
                let rate = completion_share(&members);
                CenterPerformance {
                    center: center.name.clone(),
                    students: members.len(),
                    completion_rate: round_one_decimal(rate),
                    tier: PerformanceTier::from_rate(rate),
                }
            })
            .collect();

        let course_completion = courses
            .iter()
            .filter(|c| c.status == CourseStatus::Active)
            .take(COMPLETION_COURSES)
            .map(|course| {
                let members: Vec<&Student> = students
                    .iter()
                    .copied()
                    .filter(|s| belongs_to_course(s, course))
                    .collect();
                CourseCompletion {
                    course: course.name.clone(),
                    completion: round_one_decimal(completion_share(&members)),
                }
            })
            .collect();

        Self {
            district: scope.district.map(str::to_string),
            center: scope.center.map(str::to_string),
            period: scope.period,
            generated_at: now,
            total_students: students.len(),
            total_centers: centers.len(),
            total_courses: courses.len(),
            active_courses: count(courses.iter().copied(), |c| c.status == CourseStatus::Active),
            students_in_period: count(students.iter().copied(), |s| {
                within_window(s.created_at.as_ref(), Duration::days(scope.period.days()), now)
            }),
            pending_approvals,
            trained,
            not_trained: students.len() - trained,
            recent_activity,
            enrollment_trend: enrollment_trend(students.iter().copied(), now),
            center_performance,
            course_completion,
            completion_rate: round_one_decimal(percentage(
                enrollment.completed,
                enrollment.enrolled + enrollment.completed,
            )),
            enrollment,
        }
    }

    /// Number of centers per tier, counting only centers with students
    pub fn performance_distribution(&self) -> Vec<(PerformanceTier, usize)> {
        PerformanceTier::ALL
            .iter()
            .map(|tier| {
                let n = self
                    .center_performance
                    .iter()
                    .filter(|c| c.students > 0 && c.tier == *tier)
                    .count();
                (*tier, n)
            })
            .collect()
    }
}

fn belongs_to_center(student: &Student, center: &Center) -> bool {
    match (student.center, center.id) {
        (Some(a), Some(b)) => a == b,
        _ => student.center_name.as_deref() == Some(center.name.as_str()),
    }
}

fn belongs_to_course(student: &Student, course: &Course) -> bool {
    match (student.course, course.id) {
        (Some(a), Some(b)) => a == b,
        _ => student.course_name.as_deref() == Some(course.name.as_str()),
    }
}

fn completion_share(students: &[&Student]) -> f64 {
    let completed = count(students.iter().copied(), |s| {
        s.enrollment_status == Some(EnrollmentStatus::Completed)
    });
    percentage(completed, students.len())
}

/// Six 30-day buckets starting on the first of the current month and
/// stepping back, returned oldest first and labelled by month abbreviation.
pub fn enrollment_trend<'a, I>(students: I, now: DateTime<Utc>) -> Vec<MonthlyEnrollment>
where
    I: IntoIterator<Item = &'a Student>,
{
    let created: Vec<DateTime<Utc>> = students.into_iter().filter_map(|s| s.created_at).collect();
    let anchor = now.with_day(1).unwrap_or(now);

    let mut trend: Vec<MonthlyEnrollment> = (0..TREND_MONTHS)
        .map(|i| {
            let start = anchor - Duration::days(TREND_BUCKET_DAYS * i);
            let end = start + Duration::days(TREND_BUCKET_DAYS);
            MonthlyEnrollment {
                month: start.format("%b").to_string(),
                students: created.iter().filter(|t| **t >= start && **t < end).count(),
            }
        })
        .collect();
    trend.reverse();
    trend
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn students(now: DateTime<Utc>) -> Vec<Student> {
        let mut list: Vec<Student> = serde_json::from_value(serde_json::json!([
            {"full_name_english": "Kamal Perera", "district": "Colombo", "center": 1,
             "center_name": "Colombo Center", "course": 10, "course_name": "Web Development",
             "enrollment_status": "Completed", "training_received": true},
            {"full_name_english": "Nimali Silva", "district": "Colombo", "center": 1,
             "center_name": "Colombo Center", "course": 10, "course_name": "Web Development",
             "enrollment_status": "Enrolled"},
            {"full_name_english": "Saman Kumara", "district": "Galle", "center": 2,
             "center_name": "Galle Center", "enrollment_status": "Completed"},
            {"full_name_english": "Ruwan Dias", "district": "Colombo", "center": 3,
             "center_name": "Moratuwa Center", "enrollment_status": "Pending"}
        ]))
        .expect("student fixtures");
        list[0].created_at = Some(now - Duration::days(2));
        list[0].updated_at = Some(now - Duration::days(1));
        list[1].created_at = Some(now - Duration::days(40));
        list
    }

    fn courses() -> Vec<Course> {
        serde_json::from_value(serde_json::json!([
            {"id": 10, "name": "Web Development", "district": "Colombo", "center_name": "Colombo Center", "status": "Active"},
            {"id": 11, "name": "Welding", "district": "Colombo", "center_name": "Moratuwa Center", "status": "Pending"},
            {"id": 12, "name": "Plumbing", "district": "Galle", "center_name": "Galle Center", "status": "Active"}
        ]))
        .expect("course fixtures")
    }

    fn centers() -> Vec<Center> {
        serde_json::from_value(serde_json::json!([
            {"id": 1, "name": "Colombo Center", "district": "Colombo"},
            {"id": 2, "name": "Galle Center", "district": "Galle"},
            {"id": 3, "name": "Moratuwa Center", "district": "Colombo"}
        ]))
        .expect("center fixtures")
    }

    fn approvals() -> Vec<ApprovalRequest> {
        serde_json::from_value(serde_json::json!([
            {"id": 1, "type": "Course Approval", "center": "Colombo Center", "priority": "High", "status": "Pending"},
            {"id": 2, "type": "Budget", "center": "Galle Center", "priority": "Low", "status": "Pending"},
            {"id": 3, "type": "Budget", "center": "Moratuwa Center", "priority": "Low", "status": "Approved"}
        ]))
        .expect("approval fixtures")
    }

    fn colombo_scope() -> ReportScope<'static> {
        ReportScope {
            district: Some("Colombo"),
            center: None,
            period: ReportPeriod::Monthly,
        }
    }

    #[test]
    fn test_period_parsing() {
        assert_eq!(ReportPeriod::parse("weekly").days(), 7);
        assert_eq!(ReportPeriod::parse("Monthly").days(), 30);
        assert_eq!(ReportPeriod::parse("quarterly").days(), 90);
        assert_eq!(ReportPeriod::parse("yearly").days(), 365);
        assert_eq!(ReportPeriod::parse("fortnightly"), ReportPeriod::Yearly);
    }

    #[test]
    fn test_performance_tiers() {
        assert_eq!(PerformanceTier::from_rate(100.0), PerformanceTier::Excellent);
        assert_eq!(PerformanceTier::from_rate(80.0), PerformanceTier::Excellent);
        assert_eq!(PerformanceTier::from_rate(79.9), PerformanceTier::Good);
        assert_eq!(PerformanceTier::from_rate(60.0), PerformanceTier::Good);
        assert_eq!(PerformanceTier::from_rate(40.0), PerformanceTier::Average);
        assert_eq!(PerformanceTier::from_rate(39.9), PerformanceTier::NeedsImprovement);
        assert_eq!(PerformanceTier::from_rate(0.0), PerformanceTier::NeedsImprovement);
    }

    #[test]
    fn test_district_report_totals() {
        let now = Utc::now();
        let report = DistrictReport::build(
            &students(now),
            &courses(),
            &centers(),
            &approvals(),
            colombo_scope(),
            now,
        );

        assert_eq!(report.total_students, 3);
        assert_eq!(report.total_centers, 2);
        assert_eq!(report.total_courses, 2);
        assert_eq!(report.active_courses, 1);
        assert_eq!(report.pending_approvals, 1);
        assert_eq!(report.enrollment.completed, 1);
        assert_eq!(report.enrollment.enrolled, 1);
        assert_eq!(report.enrollment.pending, 1);
        assert_eq!(report.trained, 1);
        assert_eq!(report.not_trained, 2);
        assert_eq!(report.students_in_period, 1);
        assert_eq!(report.recent_activity.new_students, 1);
        assert_eq!(report.recent_activity.completed_students, 1);
        assert_eq!(report.completion_rate, 50.0);
    }

    #[test]
    fn test_center_performance_and_course_completion() {
        let now = Utc::now();
        let report = DistrictReport::build(
            &students(now),
            &courses(),
            &centers(),
            &approvals(),
            colombo_scope(),
            now,
        );

        let colombo = &report.center_performance[0];
        assert_eq!(colombo.center, "Colombo Center");
        assert_eq!(colombo.completion_rate, 50.0);
        assert_eq!(colombo.tier, PerformanceTier::Average);

        let moratuwa = &report.center_performance[1];
        assert_eq!(moratuwa.tier, PerformanceTier::NeedsImprovement);

        assert_eq!(report.course_completion.len(), 1);
        assert_eq!(report.course_completion[0].course, "Web Development");
        assert_eq!(report.course_completion[0].completion, 50.0);

        let distribution = report.performance_distribution();
        assert_eq!(distribution[2], (PerformanceTier::Average, 1));
        assert_eq!(distribution[3], (PerformanceTier::NeedsImprovement, 1));
    }

    #[test]
    fn test_center_scope() {
        let now = Utc::now();
        let scope = ReportScope {
            district: Some("Colombo"),
            center: Some("Moratuwa Center"),
            period: ReportPeriod::Weekly,
        };
        let report = DistrictReport::build(&students(now), &courses(), &centers(), &approvals(), scope, now);
        assert_eq!(report.total_students, 1);
        assert_eq!(report.total_centers, 1);
        assert_eq!(report.pending_approvals, 0);
        assert_eq!(report.completion_rate, 0.0);
    }

    #[test]
    fn test_enrollment_trend_oldest_first() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let mut list: Vec<Student> = serde_json::from_value(serde_json::json!([
            {"full_name_english": "A"}, {"full_name_english": "B"}, {"full_name_english": "C"}
        ]))
        .expect("student fixtures");
        list[0].created_at = Some(Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 0).unwrap());
        list[1].created_at = Some(Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap());
        list[2].created_at = Some(Utc.with_ymd_and_hms(2024, 5, 10, 0, 0, 0).unwrap());

        let trend = enrollment_trend(&list, now);
        assert_eq!(trend.len(), 6);
        assert_eq!(trend[5].month, "Jun");
        assert_eq!(trend[5].students, 2);
        assert_eq!(trend[4].month, "May");
        assert_eq!(trend[4].students, 1);
        assert_eq!(trend.iter().map(|m| m.students).sum::<usize>(), 3);
    }
}
