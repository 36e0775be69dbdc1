use std::fmt;

use serde::{Deserialize, Serialize};

/// The three kinds of asynchronous backend work the client tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    ResumeProcessing,
    ScoreCheck,
    Tailoring,
}

impl JobKind {
    pub fn label(self) -> &'static str {
        match self {
            JobKind::ResumeProcessing => "resume processing",
            JobKind::ScoreCheck => "score check",
            JobKind::Tailoring => "tailoring",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Status as reported by the backend. `processing` and friends are folded into `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[serde(alias = "processing", alias = "queued", alias = "running")]
    Pending,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Pending)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JobStatus::Pending => "pending",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        })
    }
}

/// A backend poll response that carries a job status.
pub trait JobReport {
    fn status(&self) -> JobStatus;
}
