//! Fixture-backed provider.
//!
//! Fixtures are `<name>.json` files in one directory (`students`, `courses`,
//! `centers`, `approvals`, `attendance`). A file holds either a bare JSON
//! array or the wrapped form written by [`FixtureProvider::save`]. Missing
//! files load as empty lists.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use super::DataProvider;
use crate::models::{ApprovalRequest, AttendanceRecord, Center, Course, Student};

const STUDENTS: &str = "students";
const COURSES: &str = "courses";
const CENTERS: &str = "centers";
const APPROVALS: &str = "approvals";
const ATTENDANCE: &str = "attendance";

#[derive(Serialize)]
struct SavedFixture<'a, T> {
    data: &'a [T],
    saved_at: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FixtureFile<T> {
    Wrapped { data: Vec<T> },
    Plain(Vec<T>),
}

/// A full set of records held in memory
#[derive(Debug, Clone, Default)]
pub struct FixtureData {
    pub students: Vec<Student>,
    pub courses: Vec<Course>,
    pub centers: Vec<Center>,
    pub approvals: Vec<ApprovalRequest>,
    pub attendance: Vec<AttendanceRecord>,
}

#[derive(Debug, Clone)]
enum Source {
    Dir(PathBuf),
    Memory(Arc<FixtureData>),
}

#[derive(Debug, Clone)]
pub struct FixtureProvider {
    source: Source,
}

impl FixtureProvider {
    /// Read fixtures from a directory
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            source: Source::Dir(dir.into()),
        }
    }

    pub fn in_memory(data: FixtureData) -> Self {
        Self {
            source: Source::Memory(Arc::new(data)),
        }
    }

    pub fn describe(&self) -> String {
        match &self.source {
            Source::Dir(dir) => format!("fixtures in {}", dir.display()),
            Source::Memory(_) => "in-memory fixtures".to_string(),
        }
    }

    fn load<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<Vec<T>> {
        let path = dir.join(format!("{}.json", name));
        if !path.exists() {
            debug!(path = %path.display(), "Fixture missing, using empty list");
            return Ok(Vec::new());
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read fixture file: {}", name))?;
        let file: FixtureFile<T> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse fixture file: {}", name))?;

        Ok(match file {
            FixtureFile::Wrapped { data } => data,
            FixtureFile::Plain(data) => data,
        })
    }

    fn save_one<T: Serialize>(dir: &Path, name: &str, data: &[T], saved_at: DateTime<Utc>) -> Result<()> {
        let path = dir.join(format!("{}.json", name));
        let contents = serde_json::to_string_pretty(&SavedFixture { data, saved_at })?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write fixture file: {}", name))?;
        Ok(())
    }

    /// Write a full record set as fixtures
    pub fn save(dir: &Path, data: &FixtureData) -> Result<()> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create fixtures directory {}", dir.display()))?;
        let now = Utc::now();
        Self::save_one(dir, STUDENTS, &data.students, now)?;
        Self::save_one(dir, COURSES, &data.courses, now)?;
        Self::save_one(dir, CENTERS, &data.centers, now)?;
        Self::save_one(dir, APPROVALS, &data.approvals, now)?;
        Self::save_one(dir, ATTENDANCE, &data.attendance, now)?;
        debug!(dir = %dir.display(), students = data.students.len(), "Fixtures saved");
        Ok(())
    }

    fn records<T, F>(&self, name: &str, select: F) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Clone,
        F: FnOnce(&FixtureData) -> &Vec<T>,
    {
        match &self.source {
            Source::Dir(dir) => Self::load(dir, name),
            Source::Memory(data) => Ok(select(&**data).clone()),
        }
    }
}

impl DataProvider for FixtureProvider {
    async fn students(&self) -> Result<Vec<Student>> {
        self.records(STUDENTS, |d| &d.students)
    }

    async fn courses(&self, center: Option<i64>) -> Result<Vec<Course>> {
        let mut courses: Vec<Course> = self.records(COURSES, |d| &d.courses)?;
        if let Some(center) = center {
            courses.retain(|c| c.center == Some(center));
        }
        Ok(courses)
    }

    async fn centers(&self) -> Result<Vec<Center>> {
        self.records(CENTERS, |d| &d.centers)
    }

    async fn approvals(&self) -> Result<Vec<ApprovalRequest>> {
        self.records(APPROVALS, |d| &d.approvals)
    }

    async fn attendance(
        &self,
        course: Option<i64>,
        date: Option<NaiveDate>,
    ) -> Result<Vec<AttendanceRecord>> {
        let mut records: Vec<AttendanceRecord> = self.records(ATTENDANCE, |d| &d.attendance)?;
        records.retain(|r| {
            course.map(|c| r.course == Some(c)).unwrap_or(true)
                && date.map(|d| r.date == d).unwrap_or(true)
        });
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("naita-fixtures-{}-{}", name, std::process::id()))
    }

    fn sample() -> FixtureData {
        FixtureData {
            students: serde_json::from_value(serde_json::json!([
                {"full_name_english": "Kamal Perera", "district": "Colombo"},
                {"full_name_english": "Saman Kumara", "district": "Galle"}
            ]))
            .expect("students"),
            courses: serde_json::from_value(serde_json::json!([
                {"id": 10, "name": "Web Development", "center": 1, "status": "Active"},
                {"id": 11, "name": "Welding", "center": 2, "status": "Active"}
            ]))
            .expect("courses"),
            centers: Vec::new(),
            approvals: Vec::new(),
            attendance: serde_json::from_value(serde_json::json!([
                {"course": 10, "student_name": "Kamal Perera", "date": "2024-03-15", "status": "present"},
                {"course": 10, "student_name": "Kamal Perera", "date": "2024-03-16", "status": "late"},
                {"course": 11, "student_name": "Saman Kumara", "date": "2024-03-15", "status": "absent"}
            ]))
            .expect("attendance"),
        }
    }

    #[tokio::test]
    async fn test_save_then_load_from_dir() {
        let dir = temp_dir("roundtrip");
        FixtureProvider::save(&dir, &sample()).expect("save");

        let provider = FixtureProvider::from_dir(&dir);
        let students = provider.students().await.expect("students");
        assert_eq!(students.len(), 2);
        assert_eq!(students[1].full_name_english, "Saman Kumara");
        assert!(provider.approvals().await.expect("approvals").is_empty());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_plain_array_and_missing_files() {
        let dir = temp_dir("plain");
        std::fs::create_dir_all(&dir).expect("mkdir");
        std::fs::write(dir.join("centers.json"), r#"[{"id": 1, "name": "Colombo Center"}]"#)
            .expect("write");

        let provider = FixtureProvider::from_dir(&dir);
        let centers = provider.centers().await.expect("centers");
        assert_eq!(centers.len(), 1);
        assert!(centers[0].is_active());
        assert!(provider.students().await.expect("students").is_empty());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_malformed_fixture_is_an_error() {
        let dir = temp_dir("malformed");
        std::fs::create_dir_all(&dir).expect("mkdir");
        std::fs::write(dir.join("students.json"), "{not json").expect("write");

        let provider = FixtureProvider::from_dir(&dir);
        let err = provider.students().await.expect_err("should fail");
        assert!(err.to_string().contains("students"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_in_memory_filters() {
        let provider = FixtureProvider::in_memory(sample());
        assert_eq!(provider.courses(Some(1)).await.expect("courses").len(), 1);
        assert_eq!(provider.courses(None).await.expect("courses").len(), 2);

        let day = NaiveDate::from_ymd_opt(2024, 3, 15);
        assert_eq!(provider.attendance(Some(10), None).await.expect("attendance").len(), 2);
        assert_eq!(provider.attendance(None, day).await.expect("attendance").len(), 2);
        assert_eq!(provider.attendance(Some(10), day).await.expect("attendance").len(), 1);
    }
}
