use serde::{Deserialize, Serialize};

use crate::models::job::{JobReport, JobStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeCheckRequest {
    pub job_post: String,
    /// When absent the backend scores the user's stored base resume.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summarize_job_post: Option<bool>,
}

impl ResumeCheckRequest {
    pub fn for_base_resume(job_post: &str) -> Self {
        Self {
            job_post: job_post.to_string(),
            resume_text: None,
            summarize_job_post: None,
        }
    }

    pub fn for_resume(job_post: &str, resume_text: &str) -> Self {
        Self {
            job_post: job_post.to_string(),
            resume_text: Some(resume_text.to_string()),
            summarize_job_post: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeCheckJob {
    pub job_id: String,
}

/// Result of a score-check job. Analysis, score and detail are only set once completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeCheckResult {
    pub status: JobStatus,
    #[serde(default)]
    pub analysis: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    /// Backend-defined CSV-like breakdown of the score.
    #[serde(default, alias = "score_csv")]
    pub raw_csv: Option<String>,
}

impl ResumeCheckResult {
    /// Score rounded and clamped to the 0–100 display range.
    pub fn display_score(&self) -> Option<u8> {
        self.score
            .filter(|s| s.is_finite())
            .map(|s| s.round().clamp(0.0, 100.0) as u8)
    }
}

impl JobReport for ResumeCheckResult {
    fn status(&self) -> JobStatus {
        self.status
    }
}
