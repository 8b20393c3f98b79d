//! Command implementations.
//!
//! Every read command builds a [`Dashboard`] over the selected provider,
//! loads the datasets it needs and prints derived views of the snapshots.

pub mod export;
pub mod overview;
pub mod records;
pub mod report;

use anyhow::Result;
use clap::ValueEnum;

use naita_core::dashboard::{Dashboard, Dataset};
use naita_core::models::{ApprovalSortColumn, CourseSortColumn, StudentSortColumn};
use naita_core::provider::{AnyProvider, DataProvider};

use crate::app::{App, SESSION_EXPIRED};
use crate::output;

/// Load `datasets` and wait for all of them
pub async fn load(app: &mut App, datasets: &[Dataset]) -> Result<Dashboard<AnyProvider>> {
    let mut dashboard = Dashboard::new(app.provider()?);
    for dataset in datasets {
        dashboard.load(*dataset);
    }
    dashboard.wait_for_loads().await;
    settle(app, &mut dashboard)?;
    Ok(dashboard)
}

/// Load `datasets` for a command that writes files. A failed load is an
/// error here rather than an empty table.
pub async fn load_complete(app: &mut App, datasets: &[Dataset]) -> Result<Dashboard<AnyProvider>> {
    let dashboard = load(app, datasets).await?;
    ensure_loaded(&dashboard, datasets)?;
    Ok(dashboard)
}

fn ensure_loaded<P: DataProvider>(dashboard: &Dashboard<P>, datasets: &[Dataset]) -> Result<()> {
    for dataset in datasets {
        if let Some(error) = dashboard.load_error(*dataset) {
            anyhow::bail!("{} could not be loaded: {}", dataset, error);
        }
    }
    Ok(())
}

/// Load centers, then the courses of the named center
pub async fn load_center_courses(
    app: &mut App,
    center: Option<&str>,
    extra: &[Dataset],
) -> Result<Dashboard<AnyProvider>> {
    let mut datasets = vec![Dataset::Centers];
    datasets.extend_from_slice(extra);
    let mut dashboard = load(app, &datasets).await?;

    let center_id = match center {
        Some(name) => match dashboard.center_id(name) {
            Some(id) => Some(id),
            None => anyhow::bail!("Unknown center: {}", name),
        },
        None => None,
    };
    dashboard.select_center(center_id);
    dashboard.wait_for_loads().await;
    settle(app, &mut dashboard)?;
    Ok(dashboard)
}

/// Report a failed load, or stop when the session was rejected
fn settle(app: &mut App, dashboard: &mut Dashboard<AnyProvider>) -> Result<()> {
    if dashboard.session_expired {
        app.expire_session();
        anyhow::bail!(SESSION_EXPIRED);
    }
    if let Some(message) = dashboard.status_message.take() {
        output::status(&message);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StudentSort {
    Name,
    Registration,
    District,
    Status,
    Created,
}

impl From<StudentSort> for StudentSortColumn {
    fn from(sort: StudentSort) -> Self {
        match sort {
            StudentSort::Name => StudentSortColumn::Name,
            StudentSort::Registration => StudentSortColumn::RegistrationNo,
            StudentSort::District => StudentSortColumn::District,
            StudentSort::Status => StudentSortColumn::Status,
            StudentSort::Created => StudentSortColumn::Created,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CourseSort {
    Name,
    Code,
    Status,
    Students,
    Progress,
}

impl From<CourseSort> for CourseSortColumn {
    fn from(sort: CourseSort) -> Self {
        match sort {
            CourseSort::Name => CourseSortColumn::Name,
            CourseSort::Code => CourseSortColumn::Code,
            CourseSort::Status => CourseSortColumn::Status,
            CourseSort::Students => CourseSortColumn::Students,
            CourseSort::Progress => CourseSortColumn::Progress,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ApprovalSort {
    Date,
    Priority,
    Status,
    Type,
}

impl From<ApprovalSort> for ApprovalSortColumn {
    fn from(sort: ApprovalSort) -> Self {
        match sort {
            ApprovalSort::Date => ApprovalSortColumn::Date,
            ApprovalSort::Priority => ApprovalSortColumn::Priority,
            ApprovalSort::Status => ApprovalSortColumn::Status,
            ApprovalSort::Type => ApprovalSortColumn::Type,
        }
    }
}
