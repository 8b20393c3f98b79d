//! Table views and record mutations.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Args, Subcommand};
use tracing::info;

use naita_core::aggregate::format_percent_one_decimal;
use naita_core::dashboard::{Dataset, SortState};
use naita_core::filter::{
    dropdown_options, ApprovalField, AttendanceField, CenterField, CourseField, Criteria,
    StudentField,
};
use naita_core::models::{ApprovalStatus, CourseStatus, NewStudent, Student};

use super::{load, load_center_courses, ApprovalSort, CourseSort, StudentSort};
use crate::app::App;
use crate::output;

#[derive(Debug, Args)]
pub struct StudentsArgs {
    /// Free-text search over names, NIC, registration number and contact details
    #[arg(long, short)]
    pub search: Option<String>,
    #[arg(long)]
    pub district: Option<String>,
    /// Enrollment status (Pending, Enrolled, Completed, Dropped)
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub center: Option<String>,
    #[arg(long)]
    pub course: Option<String>,
    #[arg(long)]
    pub batch: Option<String>,
    /// "Trained" or "Not Trained"
    #[arg(long)]
    pub training: Option<String>,
    #[arg(long, value_enum, default_value = "name")]
    pub sort: StudentSort,
    #[arg(long)]
    pub desc: bool,
    /// Show at most this many rows
    #[arg(long)]
    pub limit: Option<usize>,
    /// List the values each filter accepts instead of the table
    #[arg(long)]
    pub options: bool,
}

/// Dropdown filters of the students table, by flag
const STUDENT_FILTERS: [(&str, StudentField); 6] = [
    ("--district", StudentField::District),
    ("--status", StudentField::EnrollmentStatus),
    ("--center", StudentField::CenterName),
    ("--course", StudentField::CourseName),
    ("--batch", StudentField::Batch),
    ("--training", StudentField::TrainingReceived),
];

fn student_filter_options(records: &[Student]) -> Vec<(&'static str, Vec<String>)> {
    STUDENT_FILTERS
        .iter()
        .map(|(flag, field)| (*flag, dropdown_options(records, *field)))
        .collect()
}

impl StudentsArgs {
    pub fn criteria(&self) -> Criteria<StudentField> {
        Criteria::new()
            .search(self.search.as_deref().unwrap_or(""))
            .select_opt(StudentField::District, self.district.as_deref())
            .select_opt(StudentField::EnrollmentStatus, self.status.as_deref())
            .select_opt(StudentField::CenterName, self.center.as_deref())
            .select_opt(StudentField::CourseName, self.course.as_deref())
            .select_opt(StudentField::Batch, self.batch.as_deref())
            .select_opt(StudentField::TrainingReceived, self.training.as_deref())
    }
}

pub async fn students(app: &mut App, args: StudentsArgs) -> Result<()> {
    let mut dashboard = load(app, &[Dataset::Students]).await?;
    if args.options {
        output::heading("Student Filters");
        for (flag, options) in student_filter_options(dashboard.students.records()) {
            output::stat(flag, options.join(" | "));
        }
        return Ok(());
    }
    dashboard.student_criteria = args.criteria();
    dashboard.student_sort = SortState {
        column: args.sort.into(),
        ascending: !args.desc,
    };

    let mut view = dashboard.filtered_students();
    let stats = dashboard.student_stats(Utc::now());

    output::heading("Students");
    output::stat("Matching", format!("{} of {}", view.len(), dashboard.students.len()));
    output::stat_share("Trained", stats.trained, stats.trained_percent());
    output::stat_share("Not Trained", stats.not_trained, stats.not_trained_percent());
    println!();

    if let Some(limit) = args.limit {
        view.truncate(limit);
    }
    output::records(&view, "students");
    Ok(())
}

#[derive(Debug, Args)]
pub struct CoursesArgs {
    #[arg(long, short)]
    pub search: Option<String>,
    /// Only courses run by this center (by name)
    #[arg(long)]
    pub center: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub district: Option<String>,
    #[arg(long, value_enum, default_value = "name")]
    pub sort: CourseSort,
    #[arg(long)]
    pub desc: bool,
}

pub async fn courses(app: &mut App, args: CoursesArgs) -> Result<()> {
    let mut dashboard = load_center_courses(app, args.center.as_deref(), &[]).await?;
    dashboard.course_criteria = Criteria::new()
        .search(args.search.as_deref().unwrap_or(""))
        .select_opt(CourseField::Status, args.status.as_deref())
        .select_opt(CourseField::Category, args.category.as_deref())
        .select_opt(CourseField::District, args.district.as_deref());
    dashboard.course_sort = SortState {
        column: args.sort.into(),
        ascending: !args.desc,
    };

    let view = dashboard.filtered_courses();
    let stats = dashboard.course_stats();

    output::heading("Courses");
    output::stat("Total Courses", stats.total);
    output::stat("Active", stats.status_count(CourseStatus::Active));
    output::stat("Pending Approval", stats.status_count(CourseStatus::Pending));
    output::stat("Enrolled Students", stats.total_students);
    output::stat("Average Progress", format_percent_one_decimal(stats.avg_progress));
    println!();
    output::records(&view, "courses");
    Ok(())
}

#[derive(Debug, Args)]
pub struct CentersArgs {
    #[arg(long, short)]
    pub search: Option<String>,
    #[arg(long)]
    pub district: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
}

pub async fn centers(app: &mut App, args: CentersArgs) -> Result<()> {
    let mut dashboard = load(app, &[Dataset::Centers]).await?;
    dashboard.center_criteria = Criteria::new()
        .search(args.search.as_deref().unwrap_or(""))
        .select_opt(CenterField::District, args.district.as_deref())
        .select_opt(CenterField::Status, args.status.as_deref());

    let view = dashboard.filtered_centers();

    output::heading("Training Centers");
    if view.is_empty() {
        output::empty_state("centers");
        return Ok(());
    }
    let count = |n: Option<u32>| n.map(|n| n.to_string()).unwrap_or_default();
    let rows: Vec<Vec<String>> = view
        .iter()
        .map(|c| {
            vec![
                c.name.clone(),
                c.district.clone().unwrap_or_default(),
                c.location.clone().unwrap_or_default(),
                c.manager.clone().unwrap_or_default(),
                count(c.students),
                count(c.instructors),
                c.status.clone(),
            ]
        })
        .collect();
    output::table(
        &["Name", "District", "Location", "Manager", "Students", "Instructors", "Status"],
        &rows,
    );
    Ok(())
}

#[derive(Debug, Subcommand)]
pub enum ApprovalsCommand {
    /// List approval requests
    List(ApprovalListArgs),
    /// Approve a request
    Approve { id: i64 },
    /// Reject a request
    Reject { id: i64 },
    /// Mark a request as under review
    Review { id: i64 },
}

#[derive(Debug, Args, Default)]
pub struct ApprovalListArgs {
    #[arg(long, short)]
    pub search: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub priority: Option<String>,
    #[arg(long)]
    pub center: Option<String>,
    #[arg(long, value_enum)]
    pub sort: Option<ApprovalSort>,
    #[arg(long)]
    pub desc: bool,
}

pub async fn approvals(app: &mut App, command: Option<ApprovalsCommand>) -> Result<()> {
    let (id, status) = match command.unwrap_or(ApprovalsCommand::List(ApprovalListArgs::default())) {
        ApprovalsCommand::List(args) => return list_approvals(app, args).await,
        ApprovalsCommand::Approve { id } => (id, ApprovalStatus::Approved),
        ApprovalsCommand::Reject { id } => (id, ApprovalStatus::Rejected),
        ApprovalsCommand::Review { id } => (id, ApprovalStatus::UnderReview),
    };

    let updated = app
        .api()?
        .update_approval_status(id, status)
        .await
        .with_context(|| format!("Failed to update approval {}", id))?;
    info!(id = id, status = %updated.status, "Approval updated");
    println!("Request {} ({}) is now {}.", updated.id, updated.request_type, updated.status);
    Ok(())
}

async fn list_approvals(app: &mut App, args: ApprovalListArgs) -> Result<()> {
    let mut dashboard = load(app, &[Dataset::Approvals]).await?;
    dashboard.approval_criteria = Criteria::new()
        .search(args.search.as_deref().unwrap_or(""))
        .select_opt(ApprovalField::Status, args.status.as_deref())
        .select_opt(ApprovalField::Priority, args.priority.as_deref())
        .select_opt(ApprovalField::Center, args.center.as_deref());
    if let Some(sort) = args.sort {
        dashboard.approval_sort = SortState {
            column: sort.into(),
            ascending: !args.desc,
        };
    } else if args.desc {
        dashboard.approval_sort.ascending = false;
    }

    let view = dashboard.filtered_approvals();
    let stats = dashboard.approval_stats();

    output::heading("Approval Requests");
    output::stat("Pending", stats.pending);
    output::stat("Under Review", stats.under_review);
    output::stat("Approved", stats.approved);
    output::stat("Rejected", stats.rejected);
    output::stat("Urgent", stats.urgent);
    println!();
    output::records(&view, "approval requests");
    Ok(())
}

#[derive(Debug, Args)]
pub struct AttendanceArgs {
    /// Course id; every course when omitted
    #[arg(long)]
    pub course: Option<i64>,
    /// Day to show (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<NaiveDate>,
    /// present, absent or late
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long, short)]
    pub search: Option<String>,
}

pub async fn attendance(app: &mut App, args: AttendanceArgs) -> Result<()> {
    let mut dashboard = load(app, &[]).await?;
    dashboard.select_attendance(args.course, args.date);
    dashboard.wait_for_loads().await;
    super::settle(app, &mut dashboard)?;

    dashboard.attendance_criteria = Criteria::new()
        .search(args.search.as_deref().unwrap_or(""))
        .select_opt(AttendanceField::Status, args.status.as_deref());

    let view = dashboard.filtered_attendance();
    let stats = dashboard.attendance_stats();

    output::heading("Attendance");
    output::stat("Records", stats.total);
    output::stat("Present", stats.present);
    output::stat("Absent", stats.absent);
    output::stat("Late", stats.late);
    output::stat("Attendance Rate", format_percent_one_decimal(stats.attendance_rate));
    println!();
    output::records(&view, "attendance records");
    Ok(())
}

#[derive(Debug, Args)]
pub struct AddStudentArgs {
    /// JSON file holding the registration form
    #[arg(long, short)]
    pub file: PathBuf,
}

pub async fn add_student(app: &mut App, args: AddStudentArgs) -> Result<()> {
    let contents = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let form: NewStudent = serde_json::from_str(&contents).context("Invalid student form")?;

    let assigned = app.assigned_district();
    if let Err(errors) = form.validate(assigned.as_deref()) {
        for (field, message) in errors.iter() {
            eprintln!("  {}: {}", field, message);
        }
        return Err(errors).context("Student form has errors");
    }

    let student = app.api()?.create_student(&form).await?;
    info!(id = ?student.id, "Student registered");
    println!(
        "Registered {} ({}).",
        student.display_name(),
        if student.registration_no.is_empty() { "no registration number yet" } else { student.registration_no.as_str() }
    );
    Ok(())
}

#[derive(Debug, Args)]
pub struct DeleteStudentArgs {
    pub id: i64,
    /// Confirm the deletion
    #[arg(long)]
    pub yes: bool,
}

pub async fn delete_student(app: &mut App, args: DeleteStudentArgs) -> Result<()> {
    if !args.yes {
        anyhow::bail!("Deleting a student cannot be undone. Re-run with --yes to confirm.");
    }
    app.api()?.delete_student(args.id).await?;
    info!(id = args.id, "Student deleted");
    println!("Student {} deleted.", args.id);
    Ok(())
}
