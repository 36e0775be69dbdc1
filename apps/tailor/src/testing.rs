//! Scripted in-memory `JobApi` used by the flow tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::api_client::{ApiError, JobApi};
use crate::models::application::{ApplicationId, ApplicationResponse};
use crate::models::export::{ExportFormat, ExportReadiness, ExportedDocument};
use crate::models::job::JobStatus;
use crate::models::profile::{JobHistory, JobHistoryUpdate, ProcessedResume, Profile};
use crate::models::score_check::{ResumeCheckJob, ResumeCheckRequest, ResumeCheckResult};

#[derive(Debug, Clone)]
pub enum Reply<T> {
    Ok(T),
    Status(u16),
    /// A response that could not be completed or decoded.
    Broken,
}

#[derive(Debug, Clone)]
pub struct Step<T> {
    delay: Duration,
    reply: Reply<T>,
}

impl<T> Step<T> {
    pub fn after(mut self, millis: u64) -> Self {
        self.delay = Duration::from_millis(millis);
        self
    }
}

pub fn ok<T>(value: T) -> Step<T> {
    Step {
        delay: Duration::ZERO,
        reply: Reply::Ok(value),
    }
}

pub fn status<T>(code: u16) -> Step<T> {
    Step {
        delay: Duration::ZERO,
        reply: Reply::Status(code),
    }
}

pub fn broken<T>() -> Step<T> {
    Step {
        delay: Duration::ZERO,
        reply: Reply::Broken,
    }
}

/// Replies in order; the last step repeats forever.
#[derive(Debug)]
struct Script<T> {
    steps: VecDeque<Step<T>>,
}

impl<T: Clone> Script<T> {
    fn new(steps: Vec<Step<T>>) -> Self {
        Self {
            steps: steps.into(),
        }
    }

    fn next(&mut self) -> Option<Step<T>> {
        if self.steps.len() > 1 {
            self.steps.pop_front()
        } else {
            self.steps.front().cloned()
        }
    }
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            steps: VecDeque::new(),
        }
    }
}

async fn play<T: Clone>(step: Option<Step<T>>) -> Result<T, ApiError> {
    let Some(step) = step else {
        return Err(ApiError::Api {
            status: 404,
            message: "not scripted".to_string(),
        });
    };
    if !step.delay.is_zero() {
        tokio::time::sleep(step.delay).await;
    }
    match step.reply {
        Reply::Ok(value) => Ok(value),
        Reply::Status(code) => Err(ApiError::Api {
            status: code,
            message: format!("status {code}"),
        }),
        Reply::Broken => Err(ApiError::Parse(
            serde_json::from_str::<serde_json::Value>("{").unwrap_err(),
        )),
    }
}

#[derive(Debug, Default)]
pub struct FakeApi {
    calls: Mutex<HashMap<String, usize>>,
    profile_error: Mutex<Option<ApiError>>,
    processed: Mutex<Script<ProcessedResume>>,
    histories: Mutex<Vec<JobHistory>>,
    saved_updates: Mutex<Vec<Vec<JobHistoryUpdate>>>,
    created: Mutex<Script<ApplicationResponse>>,
    applications: Mutex<Script<ApplicationResponse>>,
    started_checks: Mutex<Script<ResumeCheckJob>>,
    check_requests: Mutex<Vec<ResumeCheckRequest>>,
    checks: Mutex<HashMap<String, Script<ResumeCheckResult>>>,
    readiness: Mutex<Script<ExportReadiness>>,
    documents: Mutex<Script<ExportedDocument>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile_error(self, error: ApiError) -> Self {
        *self.profile_error.lock().unwrap() = Some(error);
        self
    }

    pub fn with_processed(self, steps: Vec<Step<ProcessedResume>>) -> Self {
        *self.processed.lock().unwrap() = Script::new(steps);
        self
    }

    pub fn with_histories(self, histories: Vec<JobHistory>) -> Self {
        *self.histories.lock().unwrap() = histories;
        self
    }

    pub fn with_created(self, steps: Vec<Step<ApplicationResponse>>) -> Self {
        *self.created.lock().unwrap() = Script::new(steps);
        self
    }

    pub fn with_applications(self, steps: Vec<Step<ApplicationResponse>>) -> Self {
        *self.applications.lock().unwrap() = Script::new(steps);
        self
    }

    /// Job ids handed out by successive score-check creations.
    pub fn with_started_checks(self, steps: Vec<Step<ResumeCheckJob>>) -> Self {
        *self.started_checks.lock().unwrap() = Script::new(steps);
        self
    }

    pub fn with_check(self, job_id: &str, steps: Vec<Step<ResumeCheckResult>>) -> Self {
        self.checks
            .lock()
            .unwrap()
            .insert(job_id.to_string(), Script::new(steps));
        self
    }

    pub fn with_readiness(self, steps: Vec<Step<ExportReadiness>>) -> Self {
        *self.readiness.lock().unwrap() = Script::new(steps);
        self
    }

    pub fn with_documents(self, steps: Vec<Step<ExportedDocument>>) -> Self {
        *self.documents.lock().unwrap() = Script::new(steps);
        self
    }

    pub fn calls(&self, name: &str) -> usize {
        self.calls.lock().unwrap().get(name).copied().unwrap_or(0)
    }

    pub fn check_requests(&self) -> Vec<ResumeCheckRequest> {
        self.check_requests.lock().unwrap().clone()
    }

    pub fn saved_updates(&self) -> Vec<Vec<JobHistoryUpdate>> {
        self.saved_updates.lock().unwrap().clone()
    }

    fn record(&self, name: &str) {
        *self.calls.lock().unwrap().entry(name.to_string()).or_default() += 1;
    }
}

#[async_trait]
impl JobApi for FakeApi {
    async fn get_profile(&self, _token: &str) -> Result<Profile, ApiError> {
        self.record("get_profile");
        if let Some(error) = self.profile_error.lock().unwrap().take() {
            return Err(error);
        }
        Ok(Profile {
            id: "user-1".to_string(),
            email: Some("jane@example.com".to_string()),
            has_base_resume: true,
        })
    }

    async fn process_resume(
        &self,
        _token: &str,
        _resume_text: &str,
    ) -> Result<ProcessedResume, ApiError> {
        self.record("process_resume");
        let step = self.processed.lock().unwrap().next();
        play(step).await
    }

    async fn job_histories(&self, _token: &str) -> Result<Vec<JobHistory>, ApiError> {
        self.record("job_histories");
        Ok(self.histories.lock().unwrap().clone())
    }

    async fn update_job_histories(
        &self,
        _token: &str,
        updates: &[JobHistoryUpdate],
    ) -> Result<Vec<JobHistory>, ApiError> {
        self.record("update_job_histories");
        self.saved_updates.lock().unwrap().push(updates.to_vec());
        Ok(self.histories.lock().unwrap().clone())
    }

    async fn create_application(
        &self,
        _token: &str,
        _job_description: &str,
    ) -> Result<ApplicationResponse, ApiError> {
        self.record("create_application");
        let step = self.created.lock().unwrap().next();
        play(step).await
    }

    async fn get_application(
        &self,
        _token: &str,
        _id: ApplicationId,
    ) -> Result<ApplicationResponse, ApiError> {
        self.record("get_application");
        let step = self.applications.lock().unwrap().next();
        play(step).await
    }

    async fn start_resume_check(
        &self,
        _token: &str,
        request: &ResumeCheckRequest,
    ) -> Result<ResumeCheckJob, ApiError> {
        self.record("start_resume_check");
        self.check_requests.lock().unwrap().push(request.clone());
        let step = self.started_checks.lock().unwrap().next();
        play(step).await
    }

    async fn get_resume_check(
        &self,
        _token: &str,
        job_id: &str,
    ) -> Result<ResumeCheckResult, ApiError> {
        self.record("get_resume_check");
        self.record(&format!("get_resume_check:{job_id}"));
        let step = self
            .checks
            .lock()
            .unwrap()
            .get_mut(job_id)
            .and_then(|script| script.next());
        play(step).await
    }

    async fn export_readiness(
        &self,
        _token: &str,
        _id: ApplicationId,
        _format: ExportFormat,
    ) -> Result<ExportReadiness, ApiError> {
        self.record("export_readiness");
        let step = self.readiness.lock().unwrap().next();
        play(step).await
    }

    async fn export_document(
        &self,
        _token: &str,
        _id: ApplicationId,
        _format: ExportFormat,
    ) -> Result<ExportedDocument, ApiError> {
        self.record("export_document");
        let step = self.documents.lock().unwrap().next();
        play(step).await
    }
}

pub fn application(id: ApplicationId, status: JobStatus, text: Option<&str>) -> ApplicationResponse {
    ApplicationResponse {
        id,
        user_id: "user-1".to_string(),
        status,
        target_job_description: "Senior Rust Engineer".to_string(),
        final_resume_text: text.map(str::to_string),
        created_at: None,
    }
}

pub fn check(status: JobStatus, analysis: Option<&str>, score: Option<f64>) -> ResumeCheckResult {
    ResumeCheckResult {
        status,
        analysis: analysis.map(str::to_string),
        score,
        raw_csv: None,
    }
}

pub fn check_job(job_id: &str) -> ResumeCheckJob {
    ResumeCheckJob {
        job_id: job_id.to_string(),
    }
}

pub fn history(id: i64, title: &str, default: Option<bool>) -> JobHistory {
    JobHistory {
        id,
        user_id: "user-1".to_string(),
        company_name: Some("Acme".to_string()),
        job_title: Some(title.to_string()),
        achievements_list: None,
        detailed_background: None,
        is_default_rewrite: default,
    }
}

pub fn document(filename: &str, body: &'static [u8]) -> ExportedDocument {
    ExportedDocument {
        filename: filename.to_string(),
        content_type: Some("application/pdf".to_string()),
        bytes: Bytes::from_static(body),
    }
}

/// Drains whatever the view has received so far.
pub fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<crate::view::ViewEvent>) -> Vec<crate::view::ViewEvent> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}
