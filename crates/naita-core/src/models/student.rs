use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::null_as_empty;
use crate::validation::{self, ValidationErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnrollmentStatus {
    Pending,
    Enrolled,
    Completed,
    Dropped,
}

impl EnrollmentStatus {
    pub const ALL: [EnrollmentStatus; 4] = [
        EnrollmentStatus::Pending,
        EnrollmentStatus::Enrolled,
        EnrollmentStatus::Completed,
        EnrollmentStatus::Dropped,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Pending => "Pending",
            EnrollmentStatus::Enrolled => "Enrolled",
            EnrollmentStatus::Completed => "Completed",
            EnrollmentStatus::Dropped => "Dropped",
        }
    }
}

impl std::fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gender::Male => write!(f, "Male"),
            Gender::Female => write!(f, "Female"),
            Gender::Other => write!(f, "Other"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrainingNature {
    Initial,
    Further,
    #[serde(rename = "Re-training")]
    Retraining,
}

/// One G.C.E. O/L or A/L subject result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Qualification {
    pub subject: String,
    pub grade: String,
    pub year: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: Option<i64>,
    #[serde(default)]
    pub registration_no: String,
    #[serde(default)]
    pub full_name_english: String,
    pub full_name_sinhala: Option<String>,
    #[serde(default)]
    pub name_with_initials: String,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub nic_id: String,

    // Address
    pub address_line: Option<String>,
    pub district: Option<String>,
    pub divisional_secretariat: Option<String>,
    pub grama_niladhari_division: Option<String>,
    pub village: Option<String>,

    // Contact
    pub mobile_no: Option<String>,
    pub email: Option<String>,

    // Enrollment
    pub enrollment_status: Option<EnrollmentStatus>,
    pub center: Option<i64>,
    pub center_name: Option<String>,
    pub course: Option<i64>,
    pub course_name: Option<String>,
    pub batch_display: Option<String>,
    pub enrollment_date: Option<NaiveDate>,

    // Qualifications
    #[serde(default, deserialize_with = "null_as_empty")]
    pub ol_results: Vec<Qualification>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub al_results: Vec<Qualification>,

    // Prior training
    #[serde(default)]
    pub training_received: bool,
    pub training_provider: Option<String>,
    pub course_vocation_name: Option<String>,
    pub training_duration: Option<String>,
    pub training_nature: Option<TrainingNature>,

    pub date_of_application: Option<NaiveDate>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Student {
    /// English full name, falling back to the name with initials
    pub fn display_name(&self) -> &str {
        if self.full_name_english.trim().is_empty() {
            &self.name_with_initials
        } else {
            &self.full_name_english
        }
    }

    pub fn status_label(&self) -> &'static str {
        self.enrollment_status
            .map(|s| s.as_str())
            .unwrap_or("Pending")
    }

    pub fn training_label(&self) -> &'static str {
        if self.training_received {
            "Trained"
        } else {
            "Not Trained"
        }
    }

    pub fn has_ol_results(&self) -> bool {
        !self.ol_results.is_empty()
    }

    pub fn has_al_results(&self) -> bool {
        !self.al_results.is_empty()
    }
}

/// Payload for the student registration form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewStudent {
    pub full_name_english: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub full_name_sinhala: String,
    pub name_with_initials: String,
    pub gender: String,
    pub date_of_birth: Option<NaiveDate>,
    pub nic_id: String,
    #[serde(default)]
    pub address_line: String,
    pub district: String,
    #[serde(default)]
    pub divisional_secretariat: String,
    #[serde(default)]
    pub grama_niladhari_division: String,
    #[serde(default)]
    pub village: String,
    pub mobile_no: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(default)]
    pub ol_results: Vec<Qualification>,
    #[serde(default)]
    pub al_results: Vec<Qualification>,
    #[serde(default)]
    pub training_received: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub training_provider: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub course_vocation_name: String,
}

impl NewStudent {
    /// Check the form before submitting it.
    /// `assigned_district` restricts the district for data entry officers.
    pub fn validate(&self, assigned_district: Option<&str>) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if self.full_name_english.trim().is_empty() {
            errors.add("full_name_english", "Full name is required");
        }
        if self.name_with_initials.trim().is_empty() {
            errors.add("name_with_initials", "Name with initials is required");
        }
        if !matches!(self.gender.as_str(), "Male" | "Female" | "Other") {
            errors.add("gender", "Gender must be Male, Female or Other");
        }
        if self.date_of_birth.is_none() {
            errors.add("date_of_birth", "Date of birth is required");
        }
        if !validation::is_valid_nic(&self.nic_id) {
            errors.add("nic_id", "NIC must be 9 digits followed by V or X, or 12 digits");
        }
        if self.district.trim().is_empty() {
            errors.add("district", "District is required");
        } else if let Some(assigned) = assigned_district {
            if self.district != assigned {
                errors.add(
                    "district",
                    format!("You can only add students from your assigned district ({})", assigned),
                );
            }
        }
        if !validation::is_valid_mobile(&self.mobile_no) {
            errors.add("mobile_no", "Mobile number must contain 9 to 15 digits");
        }
        if !self.email.is_empty() && !validation::is_valid_email(&self.email) {
            errors.add("email", "Enter a valid email address");
        }
        for q in self.ol_results.iter().chain(self.al_results.iter()) {
            if q.subject.trim().is_empty() || q.grade.trim().is_empty() {
                errors.add("qualifications", "Each result needs a subject and a grade");
                break;
            }
        }

        errors.into_result()
    }
}

// Sorting options for the students table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudentSortColumn {
    Name,
    RegistrationNo,
    District,
    Status,
    Created,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> NewStudent {
        NewStudent {
            full_name_english: "Kamal Perera".to_string(),
            name_with_initials: "K. Perera".to_string(),
            gender: "Male".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(2003, 4, 12),
            nic_id: "200310301234".to_string(),
            district: "Colombo".to_string(),
            mobile_no: "+94771234567".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_student_decodes_null_results_as_empty() {
        let json = r#"{
            "id": 7,
            "registration_no": "REG000007",
            "full_name_english": "Kamal Perera",
            "name_with_initials": "K. Perera",
            "nic_id": "200310301234",
            "district": "Colombo",
            "enrollment_status": "Enrolled",
            "ol_results": null,
            "training_received": false,
            "created_at": "2024-03-15T10:20:30.123456Z"
        }"#;

        let student: Student = serde_json::from_str(json).expect("student should decode");
        assert!(student.ol_results.is_empty());
        assert!(student.al_results.is_empty());
        assert_eq!(student.enrollment_status, Some(EnrollmentStatus::Enrolled));
        assert_eq!(student.display_name(), "Kamal Perera");
    }

    #[test]
    fn test_student_rejects_unknown_enrollment_status() {
        let json = r#"{"full_name_english": "A", "enrollment_status": "Graduated"}"#;
        assert!(serde_json::from_str::<Student>(json).is_err());
    }

    #[test]
    fn test_student_labels() {
        let json = r#"{"name_with_initials": "N. Silva", "training_received": true}"#;
        let student: Student = serde_json::from_str(json).expect("student should decode");
        assert_eq!(student.display_name(), "N. Silva");
        assert_eq!(student.status_label(), "Pending");
        assert_eq!(student.training_label(), "Trained");
    }

    #[test]
    fn test_new_student_valid() {
        assert!(valid_form().validate(None).is_ok());
        assert!(valid_form().validate(Some("Colombo")).is_ok());
    }

    #[test]
    fn test_new_student_field_errors() {
        let form = NewStudent {
            nic_id: "12345".to_string(),
            mobile_no: "abc".to_string(),
            email: "not-an-email".to_string(),
            ..valid_form()
        };
        let errors = form.validate(None).unwrap_err();
        assert!(errors.get("nic_id").is_some());
        assert!(errors.get("mobile_no").is_some());
        assert!(errors.get("email").is_some());
        assert!(errors.get("full_name_english").is_none());
    }

    #[test]
    fn test_new_student_district_restricted() {
        let errors = valid_form().validate(Some("Galle")).unwrap_err();
        let message = errors.get("district").expect("district error");
        assert!(message.contains("Galle"));
    }
}
