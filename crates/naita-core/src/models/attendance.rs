use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
        }
    }
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: Option<i64>,
    pub student: Option<i64>,
    #[serde(default)]
    pub student_name: String,
    #[serde(default)]
    pub student_nic: String,
    pub course: Option<i64>,
    #[serde(default)]
    pub course_name: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    /// Wall-clock check-in time as sent by the API, e.g. "08:50"
    pub check_in_time: Option<String>,
    pub remarks: Option<String>,
}

impl AttendanceRecord {
    pub fn attended(&self) -> bool {
        self.status != AttendanceStatus::Absent
    }
}
