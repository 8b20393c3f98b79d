//! Report export.
//!
//! CSV and JSON are written locally. PDF and Excel rendering happens on the
//! server: callers POST a [`ReportPayload`] through the API client and write
//! the returned bytes with [`write_bytes`].

pub mod id_card;

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aggregate::Summary;
use crate::models::{ApprovalRequest, AttendanceRecord, Course, Student};
use crate::utils::{format_date, format_datetime, slugify};

pub use id_card::IdCardPayload;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0} export is rendered by the server")]
    RemoteFormat(ExportFormat),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
    Pdf,
    Excel,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Excel => "xlsx",
        }
    }

    /// Whether the file can be produced without the server
    pub fn is_local(&self) -> bool {
        matches!(self, ExportFormat::Csv | ExportFormat::Json)
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "json" => Some(ExportFormat::Json),
            "pdf" => Some(ExportFormat::Pdf),
            "xlsx" | "excel" => Some(ExportFormat::Excel),
            _ => None,
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Csv => write!(f, "CSV"),
            ExportFormat::Json => write!(f, "JSON"),
            ExportFormat::Pdf => write!(f, "PDF"),
            ExportFormat::Excel => write!(f, "Excel"),
        }
    }
}

/// Everything an exporter needs to render a report
#[derive(Debug, Clone, Serialize)]
pub struct ReportPayload<'a, T> {
    pub title: String,
    pub data: Vec<&'a T>,
    pub summary: Summary,
    #[serde(rename = "generatedAt")]
    pub generated_at: DateTime<Utc>,
}

impl<'a, T> ReportPayload<'a, T> {
    pub fn new(title: impl Into<String>, data: Vec<&'a T>, summary: Summary, generated_at: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            data,
            summary,
            generated_at,
        }
    }

    /// `<slug-of-title>_<YYYYMMDD>.<ext>`
    pub fn default_file_name(&self, format: ExportFormat) -> String {
        format!(
            "{}_{}.{}",
            slugify(&self.title),
            self.generated_at.format("%Y%m%d"),
            format.extension()
        )
    }

    pub fn default_path(&self, dir: &Path, format: ExportFormat) -> PathBuf {
        dir.join(self.default_file_name(format))
    }
}

/// A record that can be written as a table row
pub trait Tabular {
    fn headers() -> &'static [&'static str];
    fn row(&self) -> Vec<String>;
}

fn or_empty(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

impl Tabular for Student {
    fn headers() -> &'static [&'static str] {
        &[
            "Registration No",
            "Full Name",
            "NIC",
            "District",
            "Mobile",
            "Center",
            "Course",
            "Status",
            "Training",
            "Registered",
        ]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.registration_no.clone(),
            self.display_name().to_string(),
            self.nic_id.clone(),
            or_empty(&self.district),
            or_empty(&self.mobile_no),
            or_empty(&self.center_name),
            or_empty(&self.course_name),
            self.status_label().to_string(),
            self.training_label().to_string(),
            format_datetime(self.created_at.as_ref()),
        ]
    }
}

impl Tabular for Course {
    fn headers() -> &'static [&'static str] {
        &["Code", "Name", "Category", "District", "Center", "Instructor", "Status", "Students", "Progress"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.code.clone(),
            self.name.clone(),
            or_empty(&self.category),
            or_empty(&self.district),
            or_empty(&self.center_name),
            self.instructor_display(),
            self.status.to_string(),
            self.student_count().to_string(),
            format!("{}%", self.progress_percent()),
        ]
    }
}

impl Tabular for ApprovalRequest {
    fn headers() -> &'static [&'static str] {
        &["ID", "Type", "Description", "Center", "Requested By", "Priority", "Status", "Created"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.request_type.clone(),
            self.description.clone(),
            or_empty(&self.center),
            self.requested_by.full_name(),
            self.priority.to_string(),
            self.status.to_string(),
            format_datetime(self.created_at.as_ref()),
        ]
    }
}

impl Tabular for AttendanceRecord {
    fn headers() -> &'static [&'static str] {
        &["Date", "Student", "NIC", "Course", "Status", "Check In", "Remarks"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            format_date(Some(&self.date)),
            self.student_name.clone(),
            self.student_nic.clone(),
            self.course_name.clone(),
            self.status.to_string(),
            or_empty(&self.check_in_time),
            or_empty(&self.remarks),
        ]
    }
}

/// Write records as CSV with a header row
pub fn write_csv<T: Tabular, W: Write>(records: &[&T], writer: W) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(T::headers())?;
    for record in records {
        csv_writer.write_record(record.row())?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize, W: Write>(payload: &ReportPayload<'_, T>, writer: W) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(writer, payload)?;
    Ok(())
}

/// Write a locally rendered export to `path`
pub fn export_to_file<T>(payload: &ReportPayload<'_, T>, format: ExportFormat, path: &Path) -> Result<(), ExportError>
where
    T: Tabular + Serialize,
{
    if !format.is_local() {
        return Err(ExportError::RemoteFormat(format));
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = std::fs::File::create(path)?;
    let writer = std::io::BufWriter::new(file);

    match format {
        ExportFormat::Csv => write_csv(&payload.data, writer)?,
        _ => write_json(payload, writer)?,
    }

    tracing::info!(path = %path.display(), format = %format, rows = payload.data.len(), "Report exported");
    Ok(())
}

/// Save server-rendered bytes (PDF, Excel, ID cards)
pub fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, bytes)?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "File saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{ApprovalStats, StudentStats};
    use chrono::TimeZone;

    fn students() -> Vec<Student> {
        serde_json::from_value(serde_json::json!([
            {"registration_no": "NAITA-001", "full_name_english": "Kamal Perera", "nic_id": "123456789V",
             "district": "Colombo", "enrollment_status": "Enrolled"},
            {"registration_no": "NAITA-002", "full_name_english": "Perera, Nimali", "nic_id": "987654321V",
             "district": "Galle", "training_received": true}
        ]))
        .expect("student fixtures")
    }

    #[test]
    fn test_csv_header_and_rows() {
        let records = students();
        let view: Vec<&Student> = records.iter().collect();
        let mut out = Vec::new();
        write_csv(&view, &mut out).expect("write csv");

        let text = String::from_utf8(out).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Registration No,Full Name,NIC,District"));
        assert!(lines[1].starts_with("NAITA-001,Kamal Perera,123456789V,Colombo"));
        assert!(lines[1].contains(",Enrolled,Not Trained,"));
        // Commas are quoted
        assert!(lines[2].contains("\"Perera, Nimali\""));
        assert!(lines[2].contains(",Pending,Trained,"));
    }

    #[test]
    fn test_payload_json_uses_generated_at() {
        let records = students();
        let generated_at = Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap();
        let payload = ReportPayload::new(
            "Student Report",
            records.iter().collect(),
            Summary::Students(StudentStats::compute(&records, generated_at)),
            generated_at,
        );

        let mut out = Vec::new();
        write_json(&payload, &mut out).expect("write json");
        let value: serde_json::Value = serde_json::from_slice(&out).expect("parse json");
        assert_eq!(value["title"], "Student Report");
        assert_eq!(value["data"].as_array().map(|a| a.len()), Some(2));
        assert_eq!(value["summary"]["kind"], "students");
        assert_eq!(value["summary"]["total"], 2);
        assert!(value["generatedAt"].as_str().unwrap_or("").starts_with("2024-03-15T09:30:00"));
    }

    #[test]
    fn test_default_file_name() {
        let generated_at = Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap();
        let payload: ReportPayload<'_, ApprovalRequest> = ReportPayload::new(
            "Pending Approvals (Colombo)",
            Vec::new(),
            Summary::Approvals(ApprovalStats::default()),
            generated_at,
        );
        assert_eq!(
            payload.default_file_name(ExportFormat::Excel),
            "pending-approvals-colombo_20240315.xlsx"
        );
        assert_eq!(payload.default_file_name(ExportFormat::Csv), "pending-approvals-colombo_20240315.csv");
    }

    #[test]
    fn test_export_to_file_rejects_remote_formats() {
        let payload: ReportPayload<'_, Student> = ReportPayload::new(
            "Students",
            Vec::new(),
            Summary::Students(StudentStats::default()),
            Utc::now(),
        );
        let path = std::env::temp_dir().join("naita-export-test.pdf");
        let result = export_to_file(&payload, ExportFormat::Pdf, &path);
        assert!(matches!(result, Err(ExportError::RemoteFormat(ExportFormat::Pdf))));
    }

    #[test]
    fn test_export_to_file_writes_csv() {
        let records = students();
        let payload = ReportPayload::new(
            "Students",
            records.iter().collect(),
            Summary::Students(StudentStats::default()),
            Utc::now(),
        );
        let dir = std::env::temp_dir().join(format!("naita-export-{}", std::process::id()));
        let path = payload.default_path(&dir, ExportFormat::Csv);
        export_to_file(&payload, ExportFormat::Csv, &path).expect("export");

        let text = std::fs::read_to_string(&path).expect("read back");
        assert_eq!(text.lines().count(), 3);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(ExportFormat::parse("XLSX"), Some(ExportFormat::Excel));
        assert_eq!(ExportFormat::parse("excel"), Some(ExportFormat::Excel));
        assert_eq!(ExportFormat::parse("docx"), None);
        assert!(ExportFormat::Json.is_local());
        assert!(!ExportFormat::Pdf.is_local());
    }
}
