//! API client: a typed wrapper around the resume-tailoring backend.
//!
//! Every call carries the session's bearer credential. Non-2xx answers always
//! become an `ApiError`; 204 and empty bodies are "no content", not errors.
//! There is no retry here: callers decide what a failure means for their stage.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::application::{ApplicationCreate, ApplicationId, ApplicationResponse};
use crate::models::export::{ExportFormat, ExportReadiness, ExportedDocument};
use crate::models::profile::{
    JobHistory, JobHistoryUpdate, ProcessResumeBody, ProcessedResume, Profile, ResumeUpload,
};
use crate::models::score_check::{ResumeCheckJob, ResumeCheckRequest, ResumeCheckResult};

pub const DEFAULT_API_URL: &str = "https://resume-api-backend.onrender.com";
const GENERIC_ERROR: &str = "API request failed";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("no valid credential for this request")]
    MissingCredential,

    #[error("API returned no content where a body was expected")]
    EmptyContent,
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::MissingCredential)
            || matches!(self, ApiError::Api { status, .. } if *status == 401 || *status == 403)
    }

    /// Message safe to show to a user; transport details stay in the logs.
    pub fn user_message(&self) -> &str {
        match self {
            ApiError::Api { message, .. } => message,
            _ => GENERIC_ERROR,
        }
    }
}

/// The backend operations the orchestrator depends on.
///
/// `ApiClient` is the production implementation; flows hold an `Arc<dyn JobApi>`
/// so they can be driven by scripted fakes in tests.
#[async_trait]
pub trait JobApi: Send + Sync {
    async fn get_profile(&self, token: &str) -> Result<Profile, ApiError>;

    async fn process_resume(
        &self,
        token: &str,
        resume_text: &str,
    ) -> Result<ProcessedResume, ApiError>;

    async fn job_histories(&self, token: &str) -> Result<Vec<JobHistory>, ApiError>;

    async fn update_job_histories(
        &self,
        token: &str,
        updates: &[JobHistoryUpdate],
    ) -> Result<Vec<JobHistory>, ApiError>;

    async fn create_application(
        &self,
        token: &str,
        job_description: &str,
    ) -> Result<ApplicationResponse, ApiError>;

    async fn get_application(
        &self,
        token: &str,
        id: ApplicationId,
    ) -> Result<ApplicationResponse, ApiError>;

    async fn start_resume_check(
        &self,
        token: &str,
        request: &ResumeCheckRequest,
    ) -> Result<ResumeCheckJob, ApiError>;

    async fn get_resume_check(
        &self,
        token: &str,
        job_id: &str,
    ) -> Result<ResumeCheckResult, ApiError>;

    async fn export_readiness(
        &self,
        token: &str,
        id: ApplicationId,
        format: ExportFormat,
    ) -> Result<ExportReadiness, ApiError>;

    async fn export_document(
        &self,
        token: &str,
        id: ApplicationId,
        format: ExportFormat,
    ) -> Result<ExportedDocument, ApiError>;
}

/// reqwest-backed client for the tailoring backend.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// `timeout` of `None` keeps reqwest's default (no overall deadline).
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn request(&self, method: Method, path: &str, token: &str) -> Result<RequestBuilder, ApiError> {
        if token.trim().is_empty() {
            return Err(ApiError::MissingCredential);
        }
        let url = format!("{}{}", self.base_url, path);
        debug!("{method} {url}");
        Ok(self.client.request(method, url).bearer_auth(token))
    }

    /// Sends a request and decodes a JSON body. `Ok(None)` means 204 or an empty body.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Option<T>, ApiError> {
        let response = check_status(request.send().await?).await?;

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let body = response.bytes().await?;
        if body.is_empty() {
            return Ok(None);
        }

        Ok(Some(serde_json::from_slice(&body)?))
    }

    async fn send_required<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        self.send(request).await?.ok_or(ApiError::EmptyContent)
    }
}

#[async_trait]
impl JobApi for ApiClient {
    async fn get_profile(&self, token: &str) -> Result<Profile, ApiError> {
        let request = self.request(Method::GET, "/profiles/me", token)?;
        self.send_required(request).await
    }

    async fn process_resume(
        &self,
        token: &str,
        resume_text: &str,
    ) -> Result<ProcessedResume, ApiError> {
        let request = self
            .request(Method::POST, "/profiles/process-resume", token)?
            .json(&ResumeUpload { resume_text });
        let body: ProcessResumeBody = self.send_required(request).await?;
        Ok(body.into())
    }

    async fn job_histories(&self, token: &str) -> Result<Vec<JobHistory>, ApiError> {
        let request = self.request(Method::GET, "/profiles/job-histories", token)?;
        Ok(self.send(request).await?.unwrap_or_default())
    }

    async fn update_job_histories(
        &self,
        token: &str,
        updates: &[JobHistoryUpdate],
    ) -> Result<Vec<JobHistory>, ApiError> {
        let request = self
            .request(Method::PATCH, "/profiles/job-histories", token)?
            .json(updates);
        Ok(self.send(request).await?.unwrap_or_default())
    }

    async fn create_application(
        &self,
        token: &str,
        job_description: &str,
    ) -> Result<ApplicationResponse, ApiError> {
        let request = self
            .request(Method::POST, "/applications/", token)?
            .json(&ApplicationCreate {
                target_job_description: job_description,
            });
        self.send_required(request).await
    }

    async fn get_application(
        &self,
        token: &str,
        id: ApplicationId,
    ) -> Result<ApplicationResponse, ApiError> {
        let request = self.request(Method::GET, &format!("/applications/{id}"), token)?;
        self.send_required(request).await
    }

    async fn start_resume_check(
        &self,
        token: &str,
        request: &ResumeCheckRequest,
    ) -> Result<ResumeCheckJob, ApiError> {
        let request = self
            .request(Method::POST, "/resume-check/", token)?
            .json(request);
        self.send_required(request).await
    }

    async fn get_resume_check(
        &self,
        token: &str,
        job_id: &str,
    ) -> Result<ResumeCheckResult, ApiError> {
        let request = self.request(Method::GET, &format!("/resume-check/{job_id}"), token)?;
        self.send_required(request).await
    }

    async fn export_readiness(
        &self,
        token: &str,
        id: ApplicationId,
        format: ExportFormat,
    ) -> Result<ExportReadiness, ApiError> {
        let response = self
            .request(Method::HEAD, &format!("/applications/{id}/export"), token)?
            .query(&[("format", format.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(ExportReadiness::Ready);
        }
        if status.is_client_error()
            && status != StatusCode::UNAUTHORIZED
            && status != StatusCode::FORBIDDEN
        {
            debug!("Export of application {id} as {format} not ready ({status})");
            return Ok(ExportReadiness::NotReady {
                status: status.as_u16(),
            });
        }

        Err(ApiError::Api {
            status: status.as_u16(),
            message: GENERIC_ERROR.to_string(),
        })
    }

    async fn export_document(
        &self,
        token: &str,
        id: ApplicationId,
        format: ExportFormat,
    ) -> Result<ExportedDocument, ApiError> {
        let request = self
            .request(Method::GET, &format!("/applications/{id}/export"), token)?
            .query(&[("format", format.as_str())]);
        let response = check_status(request.send().await?).await?;

        let headers = response.headers();
        let filename = headers
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_disposition)
            .unwrap_or_else(|| format.default_filename(id));
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response.bytes().await?;
        debug!("Downloaded {} bytes as {filename}", bytes.len());

        Ok(ExportedDocument {
            filename,
            content_type,
            bytes,
        })
    }
}

/// Converts a non-2xx response into `ApiError::Api`, extracting the backend's message.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body).unwrap_or_else(|| GENERIC_ERROR.to_string());
    warn!("API returned {status}: {message}");

    Err(ApiError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Pulls a readable message out of an error body: `detail[0].msg`, `detail`, or `message`.
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;

    if let Some(msg) = value
        .pointer("/detail/0/msg")
        .and_then(|m| m.as_str())
    {
        return Some(msg.to_string());
    }

    ["detail", "message"]
        .iter()
        .find_map(|key| value.get(key).and_then(|m| m.as_str()))
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
}

/// Reads `filename="..."` out of a Content-Disposition header. Directory
/// parts are dropped and `.` or `..` yield `None`.
fn filename_from_disposition(value: &str) -> Option<String> {
    value
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim().trim_matches('"'))
        .map(|name| name.rsplit(['/', '\\']).next().unwrap_or(name).to_string())
        .filter(|name| !matches!(name.as_str(), "" | "." | ".."))
}
