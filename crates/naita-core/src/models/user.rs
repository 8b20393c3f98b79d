use serde::{Deserialize, Serialize};

/// User role as reported by the token endpoint and `/api/users/me/`.
///
/// Both `district_manager` and `center_manager` appear in the API; they are
/// kept as distinct roles. Unrecognised labels are preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    HeadOffice,
    DistrictManager,
    CenterManager,
    TrainingOfficer,
    DataEntry,
    Instructor,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::HeadOffice => "head_office",
            Role::DistrictManager => "district_manager",
            Role::CenterManager => "center_manager",
            Role::TrainingOfficer => "training_officer",
            Role::DataEntry => "data_entry",
            Role::Instructor => "instructor",
            Role::Other(s) => s,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Role::Admin => "Administrator",
            Role::HeadOffice => "Head Office",
            Role::DistrictManager => "District Manager",
            Role::CenterManager => "Center Manager",
            Role::TrainingOfficer => "Training Officer",
            Role::DataEntry => "Data Entry",
            Role::Instructor => "Instructor",
            Role::Other(s) => s,
        }
    }

    /// Roles whose views span every district
    pub fn is_head_office(&self) -> bool {
        matches!(self, Role::Admin | Role::HeadOffice)
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "admin" => Role::Admin,
            "head_office" => Role::HeadOffice,
            "district_manager" => Role::DistrictManager,
            "center_manager" => Role::CenterManager,
            "training_officer" => Role::TrainingOfficer,
            "data_entry" => Role::DataEntry,
            "instructor" => Role::Instructor,
            _ => Role::Other(s),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl std::str::FromStr for Role {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Role::from(s.to_string()))
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub role: Role,
    pub district: Option<String>,
    pub center: Option<i64>,
}
