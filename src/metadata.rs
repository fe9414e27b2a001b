use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub project_name: String,
    pub project_start_date: NaiveDate,
}

impl ProjectMetadata {
    pub fn new(project_name: impl Into<String>, project_start_date: NaiveDate) -> Self {
        Self {
            project_name: project_name.into(),
            project_start_date,
        }
    }
}

impl Default for ProjectMetadata {
    fn default() -> Self {
        Self {
            project_name: "New Project".to_string(),
            project_start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default(),
        }
    }
}
