//! QR payload printed on student ID cards.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Student;

const NOT_ASSIGNED: &str = "Not assigned";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdCardPayload {
    pub student_id: Option<i64>,
    pub registration_no: String,
    pub full_name: String,
    pub nic_id: String,
    pub course_name: String,
    pub center_name: String,
    pub enrollment_status: String,
    /// RFC 3339 generation time
    pub timestamp: String,
}

impl IdCardPayload {
    pub fn for_student(student: &Student, now: DateTime<Utc>) -> Self {
        let assigned = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or(NOT_ASSIGNED)
                .to_string()
        };

        Self {
            student_id: student.id,
            registration_no: student.registration_no.clone(),
            full_name: student.display_name().to_string(),
            nic_id: student.nic_id.clone(),
            course_name: assigned(&student.course_name),
            center_name: assigned(&student.center_name),
            enrollment_status: student.status_label().to_string(),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Compact JSON encoded into the QR code
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_defaults_for_unassigned_student() {
        let student: Student = serde_json::from_value(serde_json::json!({
            "id": 42,
            "registration_no": "NAITA-2024-0042",
            "full_name_english": "Kamal Perera",
            "nic_id": "123456789V",
            "course_name": "  "
        }))
        .expect("student fixture");
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap();

        let payload = IdCardPayload::for_student(&student, now);
        assert_eq!(payload.student_id, Some(42));
        assert_eq!(payload.course_name, "Not assigned");
        assert_eq!(payload.center_name, "Not assigned");
        assert_eq!(payload.enrollment_status, "Pending");
        assert_eq!(payload.timestamp, "2024-03-15T09:30:00.000Z");
    }

    #[test]
    fn test_payload_json_fields() {
        let student: Student = serde_json::from_value(serde_json::json!({
            "id": 7,
            "registration_no": "NAITA-007",
            "full_name_english": "Nimali Silva",
            "nic_id": "200012345678",
            "course_name": "Web Development",
            "center_name": "Colombo Center",
            "enrollment_status": "Enrolled"
        }))
        .expect("student fixture");

        let json = IdCardPayload::for_student(&student, Utc::now())
            .to_json()
            .expect("serialize");
        let value: serde_json::Value = serde_json::from_str(&json).expect("parse");
        assert_eq!(value["full_name"], "Nimali Silva");
        assert_eq!(value["course_name"], "Web Development");
        assert_eq!(value["center_name"], "Colombo Center");
        assert_eq!(value["enrollment_status"], "Enrolled");
        assert!(value["timestamp"].is_string());
    }
}
