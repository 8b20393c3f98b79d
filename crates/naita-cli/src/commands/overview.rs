//! Role dashboards.
//!
//! Head office and admin users see every district. District managers get the
//! district report, data entry officers their district's registrations,
//! instructors their courses and attendance, and center managers the courses
//! and students of their district's centers.

use anyhow::Result;
use chrono::Utc;

use naita_core::aggregate::{
    format_percent_one_decimal, latest_students, ApprovalStats, CourseStats, DistrictReport,
    ReportScope, StudentStats,
};
use naita_core::dashboard::Dataset;
use naita_core::filter::{CourseField, Criteria, StudentField};
use naita_core::models::{CourseStatus, EnrollmentStatus, Role};

use super::{load, report};
use crate::app::App;
use crate::output;

/// Registrations shown on the data entry dashboard
const LATEST_STUDENTS: usize = 5;

pub async fn overview(app: &mut App, role: Option<Role>) -> Result<()> {
    let role = role.unwrap_or_else(|| app.role());
    let district = app.district();
    let now = Utc::now();

    match role {
        Role::DistrictManager => {
            let dashboard = load(
                app,
                &[Dataset::Students, Dataset::Courses, Dataset::Centers, Dataset::Approvals],
            )
            .await?;
            let scope = ReportScope {
                district: district.as_deref(),
                ..ReportScope::default()
            };
            let report = DistrictReport::build(
                dashboard.students.records(),
                dashboard.courses.records(),
                dashboard.centers.records(),
                dashboard.approvals.records(),
                scope,
                now,
            );
            report::print(&report);
        }
        Role::DataEntry => {
            let mut dashboard = load(app, &[Dataset::Students]).await?;
            dashboard.student_criteria =
                Criteria::new().select_opt(StudentField::District, district.as_deref());

            output::heading(&format!("Data Entry - {}", district.as_deref().unwrap_or("All Districts")));
            print_students(&dashboard.student_stats(now));

            output::section("Latest Registrations");
            let latest = latest_students(dashboard.filtered_students(), LATEST_STUDENTS);
            output::records(&latest, "students");
        }
        Role::Instructor => {
            let mut dashboard = load(app, &[Dataset::Courses, Dataset::Attendance]).await?;
            output::heading("Instructor Dashboard");
            print_courses(&dashboard.course_stats());

            let attendance = dashboard.attendance_stats();
            output::section("Attendance");
            output::stat("Records", attendance.total);
            output::stat("Present", attendance.present);
            output::stat("Absent", attendance.absent);
            output::stat("Late", attendance.late);
            output::stat("Attendance Rate", format_percent_one_decimal(attendance.attendance_rate));

            dashboard.course_criteria = Criteria::new().select(CourseField::Status, CourseStatus::Active.as_str());
            output::section("Active Courses");
            output::records(&dashboard.filtered_courses(), "active courses");
        }
        Role::CenterManager => {
            let mut dashboard = load(
                app,
                &[Dataset::Students, Dataset::Courses, Dataset::Centers],
            )
            .await?;
            dashboard.student_criteria =
                Criteria::new().select_opt(StudentField::District, district.as_deref());
            dashboard.course_criteria =
                Criteria::new().select_opt(CourseField::District, district.as_deref());

            output::heading(&format!("Center Manager - {}", district.as_deref().unwrap_or("All Districts")));
            print_students(&dashboard.student_stats(now));
            print_courses(&dashboard.course_stats());
            output::section("Courses");
            output::records(&dashboard.filtered_courses(), "courses");
        }
        _ => {
            let dashboard = load(
                app,
                &[Dataset::Students, Dataset::Courses, Dataset::Centers, Dataset::Approvals],
            )
            .await?;
            output::heading(&format!("{} Overview", role));
            output::stat("Training Centers", dashboard.centers.len());
            print_students(&dashboard.student_stats(now));
            print_courses(&dashboard.course_stats());
            print_approvals(&dashboard.approval_stats());
            println!();
            output::stat("Last Updated", dashboard.students.age_display());
        }
    }
    Ok(())
}

fn print_students(stats: &StudentStats) {
    output::section("Students");
    output::stat("Total Students", stats.total);
    output::stat_share("Trained", stats.trained, stats.trained_percent());
    output::stat_share("Not Trained", stats.not_trained, stats.not_trained_percent());
    output::stat("With O/L Results", stats.with_ol);
    output::stat("With A/L Results", stats.with_al);
    output::stat("Registered This Week", stats.recent);
    output::stat_average("Avg O/L Subjects", stats.avg_ol_subjects);
    output::stat_average("Avg A/L Subjects", stats.avg_al_subjects);

    output::section("Enrollment Status");
    let by_status: Vec<(String, usize)> = EnrollmentStatus::ALL
        .iter()
        .map(|s| (s.to_string(), stats.status_count(*s)))
        .collect();
    output::bars(&by_status);

    output::section("Top Districts");
    if stats.top_districts.is_empty() {
        output::empty_state("districts");
    } else {
        output::bars(&stats.top_districts);
    }
}

fn print_courses(stats: &CourseStats) {
    output::section("Courses");
    output::stat("Total Courses", stats.total);
    for status in CourseStatus::ALL {
        output::stat(status.as_str(), stats.status_count(status));
    }
    output::stat("Enrolled Students", stats.total_students);
    output::stat("Average Progress", format_percent_one_decimal(stats.avg_progress));
}

fn print_approvals(stats: &ApprovalStats) {
    output::section("Approvals");
    output::stat("Pending", stats.pending);
    output::stat("Under Review", stats.under_review);
    output::stat("Approved", stats.approved);
    output::stat("Rejected", stats.rejected);
    output::stat("Urgent (High Priority)", stats.urgent);
}
