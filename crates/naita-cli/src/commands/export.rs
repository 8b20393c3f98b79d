//! File output: report exports, ID cards and fixture snapshots.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, ValueEnum};
use serde::Serialize;
use tracing::info;

use naita_core::aggregate::{ApprovalStats, AttendanceStats, CourseStats, StudentStats, Summary};
use naita_core::api::ApiClient;
use naita_core::dashboard::Dataset;
use naita_core::export::{export_to_file, write_bytes, ExportFormat, IdCardPayload, ReportPayload, Tabular};
use naita_core::filter::{Criteria, StudentField};
use naita_core::provider::{ApiProvider, DataProvider, FixtureData, FixtureProvider};

use super::load_complete;
use crate::app::App;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportDataset {
    Students,
    Courses,
    Approvals,
    Attendance,
}

impl ExportDataset {
    fn dataset(&self) -> Dataset {
        match self {
            ExportDataset::Students => Dataset::Students,
            ExportDataset::Courses => Dataset::Courses,
            ExportDataset::Approvals => Dataset::Approvals,
            ExportDataset::Attendance => Dataset::Attendance,
        }
    }

    fn title(&self) -> &'static str {
        match self {
            ExportDataset::Students => "Students Report",
            ExportDataset::Courses => "Courses Report",
            ExportDataset::Approvals => "Approvals Report",
            ExportDataset::Attendance => "Attendance Report",
        }
    }
}

pub fn parse_format(s: &str) -> Result<ExportFormat, String> {
    ExportFormat::parse(s).ok_or_else(|| format!("unknown format '{}' (expected csv, json, pdf or xlsx)", s))
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[arg(value_enum)]
    pub dataset: ExportDataset,
    /// csv, json, pdf or xlsx
    #[arg(long, short, value_parser = parse_format, default_value = "csv")]
    pub format: ExportFormat,
    /// Output file; defaults to `<title>_<date>.<ext>` in the current directory
    #[arg(long, short)]
    pub out: Option<PathBuf>,
    /// Only export students from this district
    #[arg(long)]
    pub district: Option<String>,
    #[arg(long, short)]
    pub search: Option<String>,
}

pub async fn export(app: &mut App, args: ExportArgs) -> Result<()> {
    let mut dashboard = load_complete(app, &[args.dataset.dataset()]).await?;
    let query = args.search.as_deref().unwrap_or("");
    let now = Utc::now();
    let title = args.dataset.title();
    // PDF and Excel need the server even when reading fixtures
    let remote = if args.format.is_local() { None } else { Some(app.api()?.clone()) };

    let target = Target {
        format: args.format,
        out: args.out.as_deref(),
        remote: remote.as_ref(),
    };

    match args.dataset {
        ExportDataset::Students => {
            dashboard.student_criteria = Criteria::new()
                .search(query)
                .select_opt(StudentField::District, args.district.as_deref());
            let view = dashboard.filtered_students();
            let summary = Summary::Students(StudentStats::compute(view.iter().copied(), now));
            target.write(ReportPayload::new(title, view, summary, now)).await
        }
        ExportDataset::Courses => {
            dashboard.course_criteria = Criteria::new().search(query);
            let view = dashboard.filtered_courses();
            let summary = Summary::Courses(CourseStats::compute(view.iter().copied()));
            target.write(ReportPayload::new(title, view, summary, now)).await
        }
        ExportDataset::Approvals => {
            dashboard.approval_criteria = Criteria::new().search(query);
            let view = dashboard.filtered_approvals();
            let summary = Summary::Approvals(ApprovalStats::compute(view.iter().copied()));
            target.write(ReportPayload::new(title, view, summary, now)).await
        }
        ExportDataset::Attendance => {
            dashboard.attendance_criteria = Criteria::new().search(query);
            let view = dashboard.filtered_attendance();
            let summary = Summary::Attendance(AttendanceStats::compute(view.iter().copied()));
            target.write(ReportPayload::new(title, view, summary, now)).await
        }
    }
}

/// Where and how one export is written
struct Target<'a> {
    format: ExportFormat,
    out: Option<&'a Path>,
    remote: Option<&'a ApiClient>,
}

impl Target<'_> {
    async fn write<T>(&self, payload: ReportPayload<'_, T>) -> Result<()>
    where
        T: Tabular + Serialize,
    {
        let path = match self.out {
            Some(path) => path.to_path_buf(),
            None => payload.default_path(Path::new("."), self.format),
        };

        match self.remote {
            Some(api) => {
                let bytes = api.export_report(&payload, self.format).await?;
                write_bytes(&path, &bytes)?;
            }
            None => export_to_file(&payload, self.format, &path)?,
        }

        println!("Exported {} rows to {}", payload.data.len(), path.display());
        Ok(())
    }
}

#[derive(Debug, Args)]
pub struct IdCardArgs {
    /// Student id
    pub id: i64,
    /// Download the printable card to this PDF file
    #[arg(long)]
    pub pdf: Option<PathBuf>,
}

pub async fn id_card(app: &mut App, args: IdCardArgs) -> Result<()> {
    if let Some(path) = args.pdf {
        let bytes = app.api()?.download_id_card(args.id).await?;
        write_bytes(&path, &bytes)?;
        println!("Saved ID card to {}", path.display());
        return Ok(());
    }

    let dashboard = load_complete(app, &[Dataset::Students]).await?;
    let student = dashboard
        .students
        .records()
        .iter()
        .find(|s| s.id == Some(args.id))
        .with_context(|| format!("No student with id {}", args.id))?;

    let payload = IdCardPayload::for_student(student, Utc::now());
    println!("{}", payload.to_json()?);
    Ok(())
}

#[derive(Debug, Args)]
pub struct SnapshotArgs {
    /// Directory to write the fixture files to
    pub dir: PathBuf,
}

/// Save live API data as fixtures for offline use
pub async fn snapshot(app: &mut App, args: SnapshotArgs) -> Result<()> {
    let provider = ApiProvider::new(app.api()?.clone());
    let (students, courses, centers, approvals, attendance) = tokio::try_join!(
        provider.students(),
        provider.courses(None),
        provider.centers(),
        provider.approvals(),
        provider.attendance(None, None),
    )?;

    let data = FixtureData {
        students,
        courses,
        centers,
        approvals,
        attendance,
    };
    FixtureProvider::save(&args.dir, &data)?;
    info!(dir = %args.dir.display(), "Snapshot saved");
    println!(
        "Saved {} students, {} courses, {} centers, {} approvals and {} attendance records to {}",
        data.students.len(),
        data.courses.len(),
        data.centers.len(),
        data.approvals.len(),
        data.attendance.len(),
        args.dir.display()
    );
    Ok(())
}
