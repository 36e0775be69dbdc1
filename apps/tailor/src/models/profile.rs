use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub has_base_resume: bool,
}

/// One role extracted from the base resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobHistory {
    pub id: i64,
    pub user_id: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub achievements_list: Option<Vec<String>>,
    #[serde(default)]
    pub detailed_background: Option<String>,
    #[serde(default)]
    pub is_default_rewrite: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobHistoryUpdate {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed_background: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_default_rewrite: Option<bool>,
}

impl From<&JobHistory> for JobHistoryUpdate {
    fn from(job: &JobHistory) -> Self {
        Self {
            id: job.id,
            detailed_background: job.detailed_background.clone(),
            is_default_rewrite: job.is_default_rewrite,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResumeUpload<'a> {
    pub resume_text: &'a str,
}

/// Everything the backend extracts from a raw resume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessedResume {
    #[serde(default)]
    pub job_histories: Vec<JobHistory>,
    #[serde(default)]
    pub professional_summary: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

/// The processing endpoint answers either with a bare list of histories or the full object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ProcessResumeBody {
    Histories(Vec<JobHistory>),
    Full(ProcessedResume),
}

impl From<ProcessResumeBody> for ProcessedResume {
    fn from(body: ProcessResumeBody) -> Self {
        match body {
            ProcessResumeBody::Histories(job_histories) => ProcessedResume {
                job_histories,
                ..Default::default()
            },
            ProcessResumeBody::Full(processed) => processed,
        }
    }
}
