//! NAITA MIS - command line dashboards for the training-center MIS.
//!
//! Prints the statistics, tables and reports of the web dashboards, and
//! exports them, from either the live REST API or JSON fixtures.

mod app;
mod commands;
mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use naita_core::models::Role;

use app::{App, SESSION_EXPIRED};
use commands::export::{ExportArgs, IdCardArgs, SnapshotArgs};
use commands::records::{
    AddStudentArgs, ApprovalsCommand, AttendanceArgs, CentersArgs, CoursesArgs, DeleteStudentArgs,
    StudentsArgs,
};
use commands::report::ReportArgs;

#[derive(Debug, Parser)]
#[command(name = "naita", version, about = "Dashboards for the NAITA training-center MIS")]
struct Cli {
    /// Read records from JSON fixtures in this directory instead of the API
    #[arg(long, global = true, value_name = "DIR")]
    fixtures: Option<PathBuf>,

    /// Backend address, e.g. http://127.0.0.1:8000
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in and store a session
    Login {
        #[arg(long)]
        email: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Dashboard for your role
    Overview {
        /// Show the dashboard of another role (admin, head_office, district_manager, ...)
        #[arg(long)]
        role: Option<Role>,
    },
    /// Student registrations
    Students(StudentsArgs),
    /// Courses, optionally for one center
    Courses(CoursesArgs),
    /// Training centers
    Centers(CentersArgs),
    /// Approval requests
    Approvals {
        #[command(subcommand)]
        command: Option<ApprovalsCommand>,
    },
    /// Attendance by course and day
    Attendance(AttendanceArgs),
    /// District performance report
    Report(ReportArgs),
    /// Export a table as CSV, JSON, PDF or Excel
    Export(ExportArgs),
    /// Print a student's ID card QR payload, or download the card
    IdCard(IdCardArgs),
    /// Register a student from a JSON form
    AddStudent(AddStudentArgs),
    /// Delete a student
    DeleteStudent(DeleteStudentArgs),
    /// Save live data as fixtures
    Snapshot(SnapshotArgs),
}

impl Command {
    /// Whether a 401 from this command means the stored session expired.
    /// On `login` it means the credentials were wrong.
    fn uses_session(&self) -> bool {
        !matches!(self, Command::Login { .. })
    }
}

/// Initialize the tracing subscriber for logging.
/// `RUST_LOG` controls the level; logs go to stderr so tables stay clean.
fn init_tracing() -> WorkerGuard {
    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer))
        .with(filter)
        .init();
    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    let _guard = init_tracing();

    let cli = Cli::parse();
    info!(command = ?cli.command, "NAITA MIS starting");

    let mut app = App::new(cli.fixtures, cli.api_url)?;
    let uses_session = cli.command.uses_session();
    let result = run(&mut app, cli.command).await;

    if let Err(ref e) = result {
        if uses_session && app.check_unauthorized(e) {
            return result.context(SESSION_EXPIRED);
        }
    }
    result
}

async fn run(app: &mut App, command: Command) -> Result<()> {
    match command {
        Command::Login { email } => app.login(email).await,
        Command::Logout => app.logout(),
        Command::Overview { role } => commands::overview::overview(app, role).await,
        Command::Students(args) => commands::records::students(app, args).await,
        Command::Courses(args) => commands::records::courses(app, args).await,
        Command::Centers(args) => commands::records::centers(app, args).await,
        Command::Approvals { command } => commands::records::approvals(app, command).await,
        Command::Attendance(args) => commands::records::attendance(app, args).await,
        Command::Report(args) => commands::report::run(app, args).await,
        Command::Export(args) => commands::export::export(app, args).await,
        Command::IdCard(args) => commands::export::id_card(app, args).await,
        Command::AddStudent(args) => commands::records::add_student(app, args).await,
        Command::DeleteStudent(args) => commands::records::delete_student(app, args).await,
        Command::Snapshot(args) => commands::export::snapshot(app, args).await,
    }
}
