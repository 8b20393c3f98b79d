use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Center {
    pub id: Option<i64>,
    pub name: String,
    pub location: Option<String>,
    pub district: Option<String>,
    pub manager: Option<String>,
    pub students: Option<u32>,
    pub instructors: Option<u32>,
    pub phone: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    pub performance: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

fn default_status() -> String {
    "Active".to_string()
}

impl Center {
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("active")
    }
}
