use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::job::{JobReport, JobStatus};

pub type ApplicationId = i64;

#[derive(Debug, Clone, Serialize)]
pub struct ApplicationCreate<'a> {
    pub target_job_description: &'a str,
}

/// A tailoring application as owned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationResponse {
    pub id: ApplicationId,
    pub user_id: String,
    pub status: JobStatus,
    pub target_job_description: String,
    #[serde(default)]
    pub final_resume_text: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl JobReport for ApplicationResponse {
    fn status(&self) -> JobStatus {
        self.status
    }
}
