//! What flows hand to whichever front end renders them: notifications,
//! incremental state updates, and fallback navigation targets.

use tokio::sync::mpsc;

use crate::models::application::ApplicationId;
use crate::models::export::ExportFormat;
use crate::models::score_check::ResumeCheckResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

/// Payload carried from job-description submission to the status view.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationLaunch {
    pub application_id: ApplicationId,
    pub score_check_job_id: String,
    pub job_description: String,
}

/// The initial (pre-tailoring) analysis as known when tailoring finished.
#[derive(Debug, Clone, PartialEq)]
pub enum InitialScore {
    Ready(ResumeCheckResult),
    /// Still running; the receiving view resumes polling this job id.
    Pending(String),
    Unavailable,
}

/// Payload carried from the status view to the results view.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsPayload {
    pub application_id: ApplicationId,
    pub job_description: Option<String>,
    pub initial_score: InitialScore,
}

/// Where a failed flow sends the user. Payloads for the next view are the
/// flows' return values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    SignIn,
    Dashboard,
    WizardResume,
}

/// Incremental updates emitted while a flow runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Notify(Notification),
    TailoringPending,
    InitialAnalysis(ResumeCheckResult),
    InitialAnalysisUnavailable(String),
    TailoredResume(String),
    TailoredAnalysis(ResumeCheckResult),
    TailoredAnalysisUnavailable(String),
    ExportAvailability { format: ExportFormat, ready: bool },
}

/// Sending half handed to flows. Sends to a closed view are dropped silently.
#[derive(Debug, Clone)]
pub struct ViewSender(mpsc::UnboundedSender<ViewEvent>);

pub fn channel() -> (ViewSender, mpsc::UnboundedReceiver<ViewEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ViewSender(tx), rx)
}

impl ViewSender {
    pub fn emit(&self, event: ViewEvent) {
        let _ = self.0.send(event);
    }

    pub fn notify(&self, level: Level, message: impl Into<String>) {
        self.emit(ViewEvent::Notify(Notification {
            level,
            message: message.into(),
        }));
    }

    pub fn success(&self, message: impl Into<String>) {
        self.notify(Level::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.notify(Level::Error, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.notify(Level::Info, message);
    }
}
