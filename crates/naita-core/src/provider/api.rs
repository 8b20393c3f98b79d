use anyhow::Result;
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use super::DataProvider;
use crate::api::ApiClient;
use crate::models::{ApprovalRequest, AttendanceRecord, Center, Course, Student};

/// Maximum concurrent attendance requests when loading every course
const MAX_CONCURRENT_REQUESTS: usize = 5;

/// Records fetched live from the backend
#[derive(Clone)]
pub struct ApiProvider {
    client: ApiClient,
}

impl ApiProvider {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

impl DataProvider for ApiProvider {
    async fn students(&self) -> Result<Vec<Student>> {
        self.client.fetch_students().await
    }

    async fn courses(&self, center: Option<i64>) -> Result<Vec<Course>> {
        self.client.fetch_courses(center).await
    }

    async fn centers(&self) -> Result<Vec<Center>> {
        self.client.fetch_centers().await
    }

    async fn approvals(&self) -> Result<Vec<ApprovalRequest>> {
        self.client.fetch_approvals().await
    }

    async fn attendance(
        &self,
        course: Option<i64>,
        date: Option<NaiveDate>,
    ) -> Result<Vec<AttendanceRecord>> {
        if let Some(course) = course {
            return self.client.fetch_attendance(course, date).await;
        }

        // The endpoint is per course, so fan out over every course
        let course_ids: Vec<i64> = self
            .client
            .fetch_courses(None)
            .await?
            .iter()
            .filter_map(|c| c.id)
            .collect();
        debug!(courses = course_ids.len(), "Fetching attendance for all courses");

        let results: Vec<(i64, Result<Vec<AttendanceRecord>>)> = stream::iter(course_ids)
            .map(|id| {
                let client = self.client.clone();
                async move { (id, client.fetch_attendance(id, date).await) }
            })
            .buffer_unordered(MAX_CONCURRENT_REQUESTS)
            .collect()
            .await;

        let mut records = Vec::new();
        for (course, result) in results {
            match result {
                Ok(mut batch) => records.append(&mut batch),
                Err(e) => warn!(course = course, error = %e, "Attendance fetch failed"),
            }
        }
        records.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.student_name.cmp(&b.student_name)));
        Ok(records)
    }
}
