use anyhow::Result;
use chrono::Utc;
use clap::Args;

use naita_core::aggregate::{
    display_percent, format_percent_one_decimal, percentage, DistrictReport, ReportPeriod,
    ReportScope,
};
use naita_core::dashboard::Dataset;

use super::load;
use crate::app::App;
use crate::output;

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// District to report on; defaults to the user's district
    #[arg(long)]
    pub district: Option<String>,
    /// Limit the report to one center (by name)
    #[arg(long)]
    pub center: Option<String>,
    /// weekly, monthly, quarterly or yearly
    #[arg(long, default_value = "monthly")]
    pub period: String,
    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(app: &mut App, args: ReportArgs) -> Result<()> {
    let district = args.district.or_else(|| app.district());
    let dashboard = load(
        app,
        &[Dataset::Students, Dataset::Courses, Dataset::Centers, Dataset::Approvals],
    )
    .await?;

    let scope = ReportScope {
        district: district.as_deref(),
        center: args.center.as_deref(),
        period: ReportPeriod::parse(&args.period),
    };
    let report = DistrictReport::build(
        dashboard.students.records(),
        dashboard.courses.records(),
        dashboard.centers.records(),
        dashboard.approvals.records(),
        scope,
        Utc::now(),
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print(&report);
    }
    Ok(())
}

pub fn print(report: &DistrictReport) {
    let scope = match (&report.district, &report.center) {
        (_, Some(center)) => center.clone(),
        (Some(district), None) => format!("{} District", district),
        (None, None) => "All Districts".to_string(),
    };
    output::heading(&format!("District Report - {}", scope));
    println!(
        "  {} report generated {}",
        report.period,
        report.generated_at.format("%Y-%m-%d %H:%M UTC")
    );

    output::section("Summary");
    output::stat("Total Students", report.total_students);
    output::stat(&format!("New This Period ({}d)", report.period.days()), report.students_in_period);
    output::stat("Training Centers", report.total_centers);
    output::stat("Courses", format!("{} ({} active)", report.total_courses, report.active_courses));
    output::stat("Pending Approvals", report.pending_approvals);
    output::stat("Completion Rate", format_percent_one_decimal(report.completion_rate));

    output::section("Enrollment");
    output::stat("Enrolled", report.enrollment.enrolled);
    output::stat("Completed", report.enrollment.completed);
    output::stat("Pending", report.enrollment.pending);
    output::stat("Dropped", report.enrollment.dropped);
    let share = |n: usize| percentage(n, report.total_students);
    output::stat_share("Trained", report.trained, share(report.trained));
    output::stat_share("Not Trained", report.not_trained, share(report.not_trained));

    output::section("Last 7 Days");
    output::stat("New Students", report.recent_activity.new_students);
    output::stat("New Courses", report.recent_activity.new_courses);
    output::stat("Completed Training", report.recent_activity.completed_students);

    output::section("Enrollment Trend");
    let trend: Vec<(String, usize)> = report
        .enrollment_trend
        .iter()
        .map(|m| (m.month.clone(), m.students))
        .collect();
    output::bars(&trend);

    output::section("Center Performance");
    if report.center_performance.is_empty() {
        output::empty_state("centers");
    } else {
        let rows: Vec<Vec<String>> = report
            .center_performance
            .iter()
            .map(|c| {
                vec![
                    c.center.clone(),
                    c.students.to_string(),
                    format!("{}%", display_percent(c.completion_rate)),
                    c.tier.to_string(),
                ]
            })
            .collect();
        output::table(&["Center", "Students", "Completion", "Performance"], &rows);
        println!();
        for (tier, n) in report.performance_distribution() {
            output::stat(tier.as_str(), n);
        }
    }

    output::section("Course Completion");
    if report.course_completion.is_empty() {
        output::empty_state("active courses");
    } else {
        let rows: Vec<Vec<String>> = report
            .course_completion
            .iter()
            .map(|c| vec![c.course.clone(), format_percent_one_decimal(c.completion)])
            .collect();
        output::table(&["Course", "Completion"], &rows);
    }
}
