//! REST client for the NAITA MIS backend.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use reqwest::{header, Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::SessionData;
use crate::export::{ExportFormat, ReportPayload};
use crate::models::{
    ApprovalRequest, ApprovalStatus, AttendanceRecord, Center, Course, CurrentUser, NewStudent,
    Role, Student,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Backend address used when nothing is configured
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access: String,
    refresh: String,
    #[serde(default)]
    role: Option<Role>,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct StatusUpdate {
    status: ApprovalStatus,
}

/// List endpoints return either a bare array or a paginated object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListResponse<T> {
    Paginated { results: Vec<T> },
    Plain(Vec<T>),
}

impl<T> ListResponse<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            ListResponse::Paginated { results } => results,
            ListResponse::Plain(items) => items,
        }
    }
}

/// API client for the NAITA MIS backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    initial_backoff: Duration,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        })
    }

    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
            initial_backoff: self.initial_backoff,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Obtain a token pair and look up the user's role and district
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionData> {
        let url = self.url("/api/token/");
        let tokens: TokenResponse = self
            .post(&url, &Credentials { email, password })
            .await
            .context("Login failed")?;

        let authed = self.with_token(tokens.access.clone());
        let (role, district) = match authed.current_user().await {
            Ok(user) => (user.role, user.district),
            Err(e) => {
                warn!(error = %e, "Could not load user profile after login");
                (tokens.role.unwrap_or(Role::Admin), None)
            }
        };

        debug!(email = email, role = %role, "Logged in");
        Ok(SessionData {
            access_token: tokens.access,
            refresh_token: tokens.refresh,
            role,
            email: email.to_string(),
            district,
            created_at: Utc::now(),
        })
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
        Ok(headers)
    }

    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(response: Response) -> Result<Option<Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// Send a request, retrying 429 responses with exponential backoff
    async fn send<F>(&self, method: Method, url: &str, build: F) -> Result<Response>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let mut retries = 0;
        let mut backoff = self.initial_backoff;

        loop {
            let request = self
                .client
                .request(method.clone(), url)
                .headers(self.auth_headers()?);
            let response = build(request)
                .send()
                .await
                .map_err(ApiError::from)
                .with_context(|| format!("Failed to send {} request to {}", method, url))?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => return Ok(response),
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(url = url, retry = retries, backoff_ms = backoff.as_millis() as u64, "Rate limited, backing off");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
            }
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.send(Method::GET, url, |r| r)
            .await?
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    async fn get_list<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>> {
        let list: ListResponse<T> = self.get(url).await?;
        Ok(list.into_vec())
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, url: &str, body: &B) -> Result<T> {
        self.send(Method::POST, url, |r| r.json(body))
            .await?
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    async fn patch<T: DeserializeOwned, B: Serialize>(&self, url: &str, body: &B) -> Result<T> {
        self.send(Method::PATCH, url, |r| r.json(body))
            .await?
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    async fn bytes(&self, response: Response, url: &str) -> Result<Vec<u8>> {
        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read response body from {}", url))?;
        Ok(bytes.to_vec())
    }

    // ===== Data Fetching Methods =====

    pub async fn current_user(&self) -> Result<CurrentUser> {
        self.get(&self.url("/api/users/me/")).await
    }

    pub async fn fetch_students(&self) -> Result<Vec<Student>> {
        let students: Vec<Student> = self.get_list(&self.url("/api/students/")).await?;
        debug!(count = students.len(), "Fetched students");
        Ok(students)
    }

    /// Courses, optionally limited to one center
    pub async fn fetch_courses(&self, center: Option<i64>) -> Result<Vec<Course>> {
        let url = match center {
            Some(id) => self.url(&format!("/api/courses/?center={}", id)),
            None => self.url("/api/courses/"),
        };
        let courses: Vec<Course> = self.get_list(&url).await?;
        debug!(count = courses.len(), center = ?center, "Fetched courses");
        Ok(courses)
    }

    pub async fn fetch_centers(&self) -> Result<Vec<Center>> {
        let centers: Vec<Center> = self.get_list(&self.url("/api/centers/")).await?;
        debug!(count = centers.len(), "Fetched centers");
        Ok(centers)
    }

    pub async fn fetch_approvals(&self) -> Result<Vec<ApprovalRequest>> {
        let approvals: Vec<ApprovalRequest> = self.get_list(&self.url("/api/approvals/")).await?;
        debug!(count = approvals.len(), "Fetched approvals");
        Ok(approvals)
    }

    /// Attendance for a course, optionally on one date
    pub async fn fetch_attendance(&self, course: i64, date: Option<NaiveDate>) -> Result<Vec<AttendanceRecord>> {
        let mut url = self.url(&format!("/api/attendance/?course={}", course));
        if let Some(date) = date {
            url.push_str(&format!("&date={}", date.format("%Y-%m-%d")));
        }
        let records: Vec<AttendanceRecord> = self.get_list(&url).await?;
        debug!(count = records.len(), course = course, "Fetched attendance");
        Ok(records)
    }

    // ===== Mutations =====

    pub async fn update_approval_status(&self, id: i64, status: ApprovalStatus) -> Result<ApprovalRequest> {
        let url = self.url(&format!("/api/approvals/{}/", id));
        self.patch(&url, &StatusUpdate { status })
            .await
            .with_context(|| format!("Failed to mark approval {} as {}", id, status))
    }

    pub async fn create_student(&self, student: &NewStudent) -> Result<Student> {
        self.post(&self.url("/api/students/"), student)
            .await
            .context("Failed to register student")
    }

    pub async fn delete_student(&self, id: i64) -> Result<()> {
        let url = self.url(&format!("/api/students/{}/", id));
        self.send(Method::DELETE, &url, |r| r)
            .await
            .with_context(|| format!("Failed to delete student {}", id))?;
        Ok(())
    }

    // ===== Server-rendered files =====

    /// ID card PDF for one student
    pub async fn download_id_card(&self, id: i64) -> Result<Vec<u8>> {
        let url = self.url(&format!("/api/students/{}/id-card/", id));
        let response = self.send(Method::GET, &url, |r| r).await?;
        self.bytes(response, &url).await
    }

    /// Render a report payload as PDF or Excel on the server
    pub async fn export_report<T: Serialize>(
        &self,
        payload: &ReportPayload<'_, T>,
        format: ExportFormat,
    ) -> Result<Vec<u8>> {
        if format.is_local() {
            anyhow::bail!("{} export is written locally", format);
        }
        let url = self.url(&format!("/api/reports/export/?format={}", format.extension()));
        let response = self
            .send(Method::POST, &url, |r| r.json(payload))
            .await
            .with_context(|| format!("Failed to export {} report", format))?;
        self.bytes(response, &url).await
    }
}
