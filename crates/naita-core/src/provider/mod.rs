//! Record sources for the dashboards.
//!
//! [`DataProvider`] is implemented by [`ApiProvider`] (the live REST API)
//! and [`FixtureProvider`] (JSON files or in-memory records). Either can be
//! used wherever records are loaded, which keeps dashboards testable without
//! a backend.

pub mod api;
pub mod fixture;

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{ApprovalRequest, AttendanceRecord, Center, Course, Student};

pub use api::ApiProvider;
pub use fixture::{FixtureData, FixtureProvider};

pub trait DataProvider: Clone + Send + Sync + 'static {
    fn students(&self) -> impl Future<Output = Result<Vec<Student>>> + Send;

    /// Courses, optionally limited to one center
    fn courses(&self, center: Option<i64>) -> impl Future<Output = Result<Vec<Course>>> + Send;

    fn centers(&self) -> impl Future<Output = Result<Vec<Center>>> + Send;

    fn approvals(&self) -> impl Future<Output = Result<Vec<ApprovalRequest>>> + Send;

    /// Attendance for one course, or every course when `course` is `None`
    fn attendance(
        &self,
        course: Option<i64>,
        date: Option<NaiveDate>,
    ) -> impl Future<Output = Result<Vec<AttendanceRecord>>> + Send;
}

/// Provider chosen at startup
#[derive(Clone)]
pub enum AnyProvider {
    Api(ApiProvider),
    Fixture(FixtureProvider),
}

impl AnyProvider {
    pub fn describe(&self) -> String {
        match self {
            AnyProvider::Api(p) => format!("API at {}", p.client().base_url()),
            AnyProvider::Fixture(p) => p.describe(),
        }
    }
}

impl DataProvider for AnyProvider {
    async fn students(&self) -> Result<Vec<Student>> {
        match self {
            AnyProvider::Api(p) => p.students().await,
            AnyProvider::Fixture(p) => p.students().await,
        }
    }

    async fn courses(&self, center: Option<i64>) -> Result<Vec<Course>> {
        match self {
            AnyProvider::Api(p) => p.courses(center).await,
            AnyProvider::Fixture(p) => p.courses(center).await,
        }
    }

    async fn centers(&self) -> Result<Vec<Center>> {
        match self {
            AnyProvider::Api(p) => p.centers().await,
            AnyProvider::Fixture(p) => p.centers().await,
        }
    }

    async fn approvals(&self) -> Result<Vec<ApprovalRequest>> {
        match self {
            AnyProvider::Api(p) => p.approvals().await,
            AnyProvider::Fixture(p) => p.approvals().await,
        }
    }

    async fn attendance(
        &self,
        course: Option<i64>,
        date: Option<NaiveDate>,
    ) -> Result<Vec<AttendanceRecord>> {
        match self {
            AnyProvider::Api(p) => p.attendance(course, date).await,
            AnyProvider::Fixture(p) => p.attendance(course, date).await,
        }
    }
}

/// Immutable result of one successful load
#[derive(Debug)]
pub struct Snapshot<T> {
    records: Arc<[T]>,
    pub fetched_at: DateTime<Utc>,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
            fetched_at: self.fetched_at,
        }
    }
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self {
            records: Arc::from(Vec::new()),
            fetched_at: DateTime::<Utc>::MIN_UTC,
        }
    }
}

impl<T> Snapshot<T> {
    pub fn new(records: Vec<T>) -> Self {
        Self::at(records, Utc::now())
    }

    pub fn at(records: Vec<T>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            records: Arc::from(records),
            fetched_at,
        }
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.fetched_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        if self.fetched_at == DateTime::<Utc>::MIN_UTC {
            return "never".to_string();
        }
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            format!("{}h ago", minutes / 60)
        } else {
            format!("{}d ago", minutes / 1440)
        }
    }
}
