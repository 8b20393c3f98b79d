//! Dashboard state and background loading.
//!
//! Each dataset is held as an immutable [`Snapshot`]. Loads run in spawned
//! tasks and report back over an mpsc channel. Every load is tagged with a
//! per-dataset generation number; a result is applied only if its generation
//! is still the latest one issued for that dataset, so a slow response can
//! never overwrite a newer one. Failed loads keep the previous snapshot and
//! set `status_message`.
//!
//! Filtered and sorted views are recomputed from the snapshots on demand.

use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::aggregate::{ApprovalStats, AttendanceStats, CourseStats, StudentStats};
use crate::api::ApiError;
use crate::filter::{
    apply, sort_approvals, sort_courses, sort_students, ApprovalField, AttendanceField,
    CenterField, CourseField, Criteria, StudentField,
};
use crate::models::{
    ApprovalRequest, ApprovalSortColumn, AttendanceRecord, Center, Course, CourseSortColumn,
    Student, StudentSortColumn,
};
use crate::provider::{DataProvider, Snapshot};

/// Capacity of the load result channel
const CHANNEL_BUFFER_SIZE: usize = 32;

const REFRESHING_MESSAGE: &str = "Refreshing data...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    Students,
    Courses,
    Centers,
    Approvals,
    Attendance,
}

impl Dataset {
    pub const ALL: [Dataset; 5] = [
        Dataset::Students,
        Dataset::Courses,
        Dataset::Centers,
        Dataset::Approvals,
        Dataset::Attendance,
    ];

    fn index(&self) -> usize {
        match self {
            Dataset::Students => 0,
            Dataset::Courses => 1,
            Dataset::Centers => 2,
            Dataset::Approvals => 3,
            Dataset::Attendance => 4,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Dataset::Students => "Students",
            Dataset::Courses => "Courses",
            Dataset::Centers => "Centers",
            Dataset::Approvals => "Approvals",
            Dataset::Attendance => "Attendance",
        }
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Records produced by one load
#[derive(Debug)]
pub enum Payload {
    Students(Vec<Student>),
    Courses(Vec<Course>),
    Centers(Vec<Center>),
    Approvals(Vec<ApprovalRequest>),
    Attendance(Vec<AttendanceRecord>),
}

/// Message sent from a load task back to the dashboard
#[derive(Debug)]
pub struct LoadResult {
    pub dataset: Dataset,
    pub generation: u64,
    pub payload: anyhow::Result<Payload>,
}

/// Table ordering for the views that support sorting
#[derive(Debug, Clone, Copy)]
pub struct SortState<C> {
    pub column: C,
    pub ascending: bool,
}

impl<C: Copy> SortState<C> {
    pub fn new(column: C) -> Self {
        Self {
            column,
            ascending: true,
        }
    }

    /// Same column flips direction, a new column sorts ascending
    pub fn toggle(&mut self, column: C)
    where
        C: PartialEq,
    {
        if self.column == column {
            self.ascending = !self.ascending;
        } else {
            self.column = column;
            self.ascending = true;
        }
    }
}

pub struct Dashboard<P: DataProvider> {
    provider: P,
    result_tx: mpsc::Sender<LoadResult>,
    result_rx: mpsc::Receiver<LoadResult>,
    /// Latest generation issued per dataset
    issued: [u64; 5],
    /// Whether the latest load per dataset is still outstanding
    pending: [bool; 5],
    /// Error of the latest completed load per dataset
    errors: [Option<String>; 5],

    pub students: Snapshot<Student>,
    pub courses: Snapshot<Course>,
    pub centers: Snapshot<Center>,
    pub approvals: Snapshot<ApprovalRequest>,
    pub attendance: Snapshot<AttendanceRecord>,

    selected_center: Option<i64>,
    attendance_course: Option<i64>,
    attendance_date: Option<NaiveDate>,

    pub student_criteria: Criteria<StudentField>,
    pub course_criteria: Criteria<CourseField>,
    pub center_criteria: Criteria<CenterField>,
    pub approval_criteria: Criteria<ApprovalField>,
    pub attendance_criteria: Criteria<AttendanceField>,

    pub student_sort: SortState<StudentSortColumn>,
    pub course_sort: SortState<CourseSortColumn>,
    pub approval_sort: SortState<ApprovalSortColumn>,

    pub status_message: Option<String>,
    /// Set when the backend rejected the stored token
    pub session_expired: bool,
}

impl<P: DataProvider> Dashboard<P> {
    pub fn new(provider: P) -> Self {
        let (result_tx, result_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        Self {
            provider,
            result_tx,
            result_rx,
            issued: [0; 5],
            pending: [false; 5],
            errors: Default::default(),
            students: Snapshot::default(),
            courses: Snapshot::default(),
            centers: Snapshot::default(),
            approvals: Snapshot::default(),
            attendance: Snapshot::default(),
            selected_center: None,
            attendance_course: None,
            attendance_date: None,
            student_criteria: Criteria::new(),
            course_criteria: Criteria::new(),
            center_criteria: Criteria::new(),
            approval_criteria: Criteria::new(),
            attendance_criteria: Criteria::new(),
            student_sort: SortState::new(StudentSortColumn::Name),
            course_sort: SortState::new(CourseSortColumn::Name),
            approval_sort: SortState::new(ApprovalSortColumn::Date),
            status_message: None,
            session_expired: false,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    // ===== Loading =====

    fn issue(&mut self, dataset: Dataset) -> u64 {
        let i = dataset.index();
        self.issued[i] += 1;
        self.pending[i] = true;
        self.issued[i]
    }

    /// Start a background load of one dataset, superseding any load in flight
    pub fn load(&mut self, dataset: Dataset) {
        let generation = self.issue(dataset);
        let provider = self.provider.clone();
        let tx = self.result_tx.clone();
        let center = self.selected_center;
        let course = self.attendance_course;
        let date = self.attendance_date;

        debug!(dataset = %dataset, generation = generation, "Load started");

        tokio::spawn(async move {
            let payload = match dataset {
                Dataset::Students => provider.students().await.map(Payload::Students),
                Dataset::Courses => provider.courses(center).await.map(Payload::Courses),
                Dataset::Centers => provider.centers().await.map(Payload::Centers),
                Dataset::Approvals => provider.approvals().await.map(Payload::Approvals),
                Dataset::Attendance => provider
                    .attendance(course, date)
                    .await
                    .map(Payload::Attendance),
            };
            let result = LoadResult {
                dataset,
                generation,
                payload,
            };
            if let Err(e) = tx.send(result).await {
                error!(error = %e, "Failed to send load result - channel closed");
            }
        });
    }

    /// Load every dataset. Courses follow the current center selection.
    pub fn load_all(&mut self) {
        for dataset in Dataset::ALL {
            self.load(dataset);
        }
        self.status_message = Some(REFRESHING_MESSAGE.to_string());
    }

    /// Select a center and reload its courses
    pub fn select_center(&mut self, center: Option<i64>) {
        self.selected_center = center;
        self.load(Dataset::Courses);
    }

    pub fn selected_center(&self) -> Option<i64> {
        self.selected_center
    }

    /// Select the course and day for the attendance view and reload it
    pub fn select_attendance(&mut self, course: Option<i64>, date: Option<NaiveDate>) {
        self.attendance_course = course;
        self.attendance_date = date;
        self.load(Dataset::Attendance);
    }

    pub fn is_loading(&self) -> bool {
        self.pending.iter().any(|p| *p)
    }

    pub fn is_loading_dataset(&self, dataset: Dataset) -> bool {
        self.pending[dataset.index()]
    }

    /// Error of the latest load of `dataset`, if it failed. The snapshot then
    /// still holds earlier data, or none at all.
    pub fn load_error(&self, dataset: Dataset) -> Option<&str> {
        self.errors[dataset.index()].as_deref()
    }

    /// Apply every result already received, without waiting.
    /// Returns the number of results applied.
    pub fn check_background_tasks(&mut self) -> usize {
        let mut results = Vec::new();
        while let Ok(result) = self.result_rx.try_recv() {
            results.push(result);
        }
        let mut applied = 0;
        for result in results {
            if self.process_load_result(result) {
                applied += 1;
            }
        }
        applied
    }

    /// Wait until the latest load of every dataset has reported back
    pub async fn wait_for_loads(&mut self) {
        while self.is_loading() {
            match self.result_rx.recv().await {
                Some(result) => {
                    self.process_load_result(result);
                }
                None => break,
            }
        }
        if self.status_message.as_deref() == Some(REFRESHING_MESSAGE) {
            self.status_message = None;
        }
    }

    /// Apply one result. Returns false when it was superseded.
    fn process_load_result(&mut self, result: LoadResult) -> bool {
        let i = result.dataset.index();
        if result.generation != self.issued[i] {
            debug!(
                dataset = %result.dataset,
                generation = result.generation,
                latest = self.issued[i],
                "Discarding stale load result"
            );
            return false;
        }
        self.pending[i] = false;

        let payload = match result.payload {
            Ok(payload) => payload,
            Err(e) => {
                warn!(dataset = %result.dataset, error = %e, "Load failed, keeping previous data");
                if e.chain().any(|c| matches!(c.downcast_ref::<ApiError>(), Some(ApiError::Unauthorized))) {
                    self.session_expired = true;
                }
                let message = format!("{:#}", e);
                self.status_message = Some(format!("{} failed to load: {}", result.dataset, message));
                self.errors[i] = Some(message);
                return true;
            }
        };

        self.errors[i] = None;
        let now = Utc::now();
        match payload {
            Payload::Students(data) => self.students = Snapshot::at(data, now),
            Payload::Courses(data) => self.courses = Snapshot::at(data, now),
            Payload::Centers(data) => self.centers = Snapshot::at(data, now),
            Payload::Approvals(data) => self.approvals = Snapshot::at(data, now),
            Payload::Attendance(data) => self.attendance = Snapshot::at(data, now),
        }
        info!(dataset = %result.dataset, records = self.count(result.dataset), "Data loaded");
        true
    }

    pub fn count(&self, dataset: Dataset) -> usize {
        match dataset {
            Dataset::Students => self.students.len(),
            Dataset::Courses => self.courses.len(),
            Dataset::Centers => self.centers.len(),
            Dataset::Approvals => self.approvals.len(),
            Dataset::Attendance => self.attendance.len(),
        }
    }

    // ===== Derived views =====

    pub fn filtered_students(&self) -> Vec<&Student> {
        let mut view = apply(self.students.records(), &self.student_criteria);
        sort_students(&mut view, self.student_sort.column, self.student_sort.ascending);
        view
    }

    pub fn filtered_courses(&self) -> Vec<&Course> {
        let mut view = apply(self.courses.records(), &self.course_criteria);
        sort_courses(&mut view, self.course_sort.column, self.course_sort.ascending);
        view
    }

    pub fn filtered_centers(&self) -> Vec<&Center> {
        apply(self.centers.records(), &self.center_criteria)
    }

    pub fn filtered_approvals(&self) -> Vec<&ApprovalRequest> {
        let mut view = apply(self.approvals.records(), &self.approval_criteria);
        sort_approvals(&mut view, self.approval_sort.column, self.approval_sort.ascending);
        view
    }

    pub fn filtered_attendance(&self) -> Vec<&AttendanceRecord> {
        apply(self.attendance.records(), &self.attendance_criteria)
    }

    pub fn student_stats(&self, now: DateTime<Utc>) -> StudentStats {
        StudentStats::compute(self.filtered_students(), now)
    }

    pub fn course_stats(&self) -> CourseStats {
        CourseStats::compute(self.filtered_courses())
    }

    pub fn approval_stats(&self) -> ApprovalStats {
        ApprovalStats::compute(self.filtered_approvals())
    }

    pub fn attendance_stats(&self) -> AttendanceStats {
        AttendanceStats::compute(self.filtered_attendance())
    }

    /// Look up a center id by its name, ignoring case
    pub fn center_id(&self, name: &str) -> Option<i64> {
        self.centers
            .records()
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name.trim()))
            .and_then(|c| c.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ApprovalStatus;
    use crate::provider::{FixtureData, FixtureProvider};
    use anyhow::Result;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn fixture() -> FixtureData {
        FixtureData {
            students: serde_json::from_value(serde_json::json!([
                {"full_name_english": "Kamal Perera", "district": "Colombo", "enrollment_status": "Enrolled"},
                {"full_name_english": "Nimali Silva", "district": "Colombo", "enrollment_status": "Pending"},
                {"full_name_english": "Saman Kumara", "district": "Galle", "enrollment_status": "Enrolled"}
            ]))
            .expect("students"),
            courses: serde_json::from_value(serde_json::json!([
                {"id": 10, "name": "Web Development", "center": 1, "status": "Active"},
                {"id": 11, "name": "Welding", "center": 2, "status": "Active"}
            ]))
            .expect("courses"),
            centers: serde_json::from_value(serde_json::json!([
                {"id": 1, "name": "Colombo Center"},
                {"id": 2, "name": "Galle Center"}
            ]))
            .expect("centers"),
            approvals: serde_json::from_value(serde_json::json!([
                {"id": 1, "type": "Budget", "priority": "High", "status": "Pending"}
            ]))
            .expect("approvals"),
            attendance: Vec::new(),
        }
    }

    /// Courses for center 1 arrive late; approvals can be made to fail
    #[derive(Clone)]
    struct ScriptedProvider {
        inner: FixtureProvider,
        fail_approvals: Arc<AtomicBool>,
    }

    impl DataProvider for ScriptedProvider {
        async fn students(&self) -> Result<Vec<Student>> {
            self.inner.students().await
        }

        async fn courses(&self, center: Option<i64>) -> Result<Vec<Course>> {
            if center == Some(1) {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            self.inner.courses(center).await
        }

        async fn centers(&self) -> Result<Vec<Center>> {
            self.inner.centers().await
        }

        async fn approvals(&self) -> Result<Vec<ApprovalRequest>> {
            if self.fail_approvals.load(Ordering::SeqCst) {
                anyhow::bail!("connection refused");
            }
            self.inner.approvals().await
        }

        async fn attendance(
            &self,
            course: Option<i64>,
            date: Option<NaiveDate>,
        ) -> Result<Vec<AttendanceRecord>> {
            self.inner.attendance(course, date).await
        }
    }

    fn scripted() -> (ScriptedProvider, Arc<AtomicBool>) {
        let fail = Arc::new(AtomicBool::new(false));
        let provider = ScriptedProvider {
            inner: FixtureProvider::in_memory(fixture()),
            fail_approvals: Arc::clone(&fail),
        };
        (provider, fail)
    }

    #[tokio::test]
    async fn test_load_all_and_filtered_views() {
        let mut dashboard = Dashboard::new(FixtureProvider::in_memory(fixture()));
        dashboard.load_all();
        dashboard.wait_for_loads().await;

        assert!(!dashboard.is_loading());
        assert!(dashboard.status_message.is_none());
        assert_eq!(dashboard.students.len(), 3);
        assert_eq!(dashboard.centers.len(), 2);

        dashboard.student_criteria = Criteria::new().select(StudentField::District, "Colombo");
        let view = dashboard.filtered_students();
        assert_eq!(view.len(), 2);
        let stats = dashboard.student_stats(Utc::now());
        assert_eq!(stats.trained, 0);
        assert_eq!(stats.trained_percent(), 0.0);

        assert_eq!(dashboard.center_id("galle center"), Some(2));
        assert_eq!(dashboard.approval_stats().pending, 1);
    }

    #[test]
    fn test_stale_generation_is_discarded() {
        let (provider, _) = scripted();
        let mut dashboard = Dashboard::new(provider);

        let old = dashboard.issue(Dataset::Courses);
        let latest = dashboard.issue(Dataset::Courses);

        let fresh: Vec<Course> = serde_json::from_value(serde_json::json!([
            {"name": "Welding", "status": "Active"}
        ]))
        .expect("courses");
        let stale: Vec<Course> = serde_json::from_value(serde_json::json!([
            {"name": "Old A", "status": "Active"},
            {"name": "Old B", "status": "Active"}
        ]))
        .expect("courses");

        assert!(dashboard.process_load_result(LoadResult {
            dataset: Dataset::Courses,
            generation: latest,
            payload: Ok(Payload::Courses(fresh)),
        }));
        assert!(!dashboard.process_load_result(LoadResult {
            dataset: Dataset::Courses,
            generation: old,
            payload: Ok(Payload::Courses(stale)),
        }));

        assert_eq!(dashboard.courses.len(), 1);
        assert_eq!(dashboard.courses.records()[0].name, "Welding");
        assert!(!dashboard.is_loading_dataset(Dataset::Courses));
    }

    #[tokio::test]
    async fn test_slow_response_for_previous_center_is_ignored() {
        let (provider, _) = scripted();
        let mut dashboard = Dashboard::new(provider);

        dashboard.select_center(Some(1));
        dashboard.select_center(Some(2));
        dashboard.wait_for_loads().await;

        assert_eq!(dashboard.courses.len(), 1);
        assert_eq!(dashboard.courses.records()[0].name, "Welding");

        // Let the superseded center 1 response arrive
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(dashboard.check_background_tasks(), 0);
        assert_eq!(dashboard.courses.records()[0].name, "Welding");
        assert_eq!(dashboard.selected_center(), Some(2));
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_snapshot() {
        let (provider, fail) = scripted();
        let mut dashboard = Dashboard::new(provider);

        dashboard.load(Dataset::Approvals);
        dashboard.wait_for_loads().await;
        assert_eq!(dashboard.approvals.len(), 1);
        assert!(dashboard.status_message.is_none());

        fail.store(true, Ordering::SeqCst);
        dashboard.load(Dataset::Approvals);
        dashboard.wait_for_loads().await;

        assert_eq!(dashboard.approvals.len(), 1);
        assert_eq!(dashboard.approvals.records()[0].status, ApprovalStatus::Pending);
        let message = dashboard.status_message.clone().unwrap_or_default();
        assert!(message.contains("Approvals failed to load"));
        assert!(message.contains("connection refused"));
        assert!(dashboard
            .load_error(Dataset::Approvals)
            .is_some_and(|e| e.contains("connection refused")));
        assert!(dashboard.load_error(Dataset::Students).is_none());

        fail.store(false, Ordering::SeqCst);
        dashboard.load(Dataset::Approvals);
        dashboard.wait_for_loads().await;
        assert!(dashboard.load_error(Dataset::Approvals).is_none());
    }

    #[test]
    fn test_unauthorized_marks_session_expired() {
        let (provider, _) = scripted();
        let mut dashboard = Dashboard::new(provider);
        let generation = dashboard.issue(Dataset::Students);

        let err = anyhow::Error::from(ApiError::Unauthorized).context("Failed to fetch students");
        dashboard.process_load_result(LoadResult {
            dataset: Dataset::Students,
            generation,
            payload: Err(err),
        });

        assert!(dashboard.session_expired);
        assert!(dashboard.students.is_empty());
        assert!(dashboard.status_message.is_some());
    }

    #[test]
    fn test_sort_state_toggle() {
        let mut sort = SortState::new(StudentSortColumn::Name);
        sort.toggle(StudentSortColumn::Name);
        assert!(!sort.ascending);
        sort.toggle(StudentSortColumn::District);
        assert_eq!(sort.column, StudentSortColumn::District);
        assert!(sort.ascending);
    }
}
