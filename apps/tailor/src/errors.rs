use thiserror::Error;

use crate::api_client::ApiError;
use crate::models::job::JobKind;
use crate::view::{Level, Notification, Route, ViewSender};

/// Why a job ended in the Failed state. Only the logs tell these apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    /// The backend answered with status "failed".
    Reported,
    /// The poll request itself could not be completed.
    Transport(String),
    /// Gave up after the configured number of polls.
    Exhausted { attempts: u32 },
}

/// State a flow needs from an earlier view but did not receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    Credential,
    JobHistories,
}

/// Orchestrator-level error. Each variant maps to one user notification
/// and, where the current view cannot continue, a known-good route.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("could not start {kind}: {source}")]
    Creation {
        kind: JobKind,
        #[source]
        source: ApiError,
    },

    #[error("{kind} status check failed: {reason}")]
    PollTransport { kind: JobKind, reason: String },

    #[error("{kind} job {id} failed: {cause:?}")]
    JobFailed {
        kind: JobKind,
        id: String,
        cause: FailureCause,
    },

    #[error("missing precondition: {0:?}")]
    Precondition(Precondition),

    #[error("invalid input: {0}")]
    Invalid(String),

    #[error("failed to load {what}: {source}")]
    Load {
        what: &'static str,
        #[source]
        source: ApiError,
    },

    #[error("request failed: {0}")]
    Request(#[from] ApiError),

    #[error("export not ready after {attempts} attempts")]
    ExportNotReady { attempts: u32 },
}

impl FlowError {
    /// Builds the terminal error for a job, keeping transport failures distinct for logging.
    pub fn job(kind: JobKind, id: impl Into<String>, cause: FailureCause) -> Self {
        match cause {
            FailureCause::Transport(reason) => FlowError::PollTransport { kind, reason },
            cause => FlowError::JobFailed {
                kind,
                id: id.into(),
                cause,
            },
        }
    }

    /// Creation failures caused by a rejected credential send the user to sign in instead.
    pub fn creation(kind: JobKind, source: ApiError) -> Self {
        if source.is_unauthorized() {
            FlowError::Precondition(Precondition::Credential)
        } else {
            FlowError::Creation { kind, source }
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            FlowError::Creation { kind, .. } => match kind {
                JobKind::Tailoring | JobKind::ScoreCheck => "Failed to start application.",
                JobKind::ResumeProcessing => "Failed to process resume.",
            }
            .to_string(),
            FlowError::PollTransport { kind, .. } | FlowError::JobFailed { kind, .. } => {
                match kind {
                    JobKind::Tailoring => "Something went wrong while tailoring your resume.",
                    JobKind::ScoreCheck => "Could not load resume analysis.",
                    JobKind::ResumeProcessing => "Failed to process resume.",
                }
                .to_string()
            }
            FlowError::Precondition(Precondition::Credential) => {
                "Your session has expired. Please sign in again.".to_string()
            }
            FlowError::Precondition(Precondition::JobHistories) => {
                "No job history found. Please go back to step 1.".to_string()
            }
            FlowError::Invalid(message) => message.clone(),
            FlowError::Load { what, .. } => format!("Failed to load {what}."),
            FlowError::Request(source) => source.user_message().to_string(),
            FlowError::ExportNotReady { .. } => {
                "Your document is not ready for download yet. Please try again shortly."
                    .to_string()
            }
        }
    }

    pub fn notification(&self) -> Notification {
        Notification {
            level: Level::Error,
            message: self.user_message(),
        }
    }

    /// Where the user goes when the current view cannot continue; `None` means stay.
    pub fn fallback_route(&self) -> Option<Route> {
        match self {
            FlowError::Precondition(Precondition::Credential) => Some(Route::SignIn),
            FlowError::Precondition(Precondition::JobHistories) => Some(Route::WizardResume),
            FlowError::PollTransport {
                kind: JobKind::Tailoring,
                ..
            }
            | FlowError::JobFailed {
                kind: JobKind::Tailoring,
                ..
            }
            | FlowError::Load { .. } => Some(Route::Dashboard),
            _ => None,
        }
    }

    /// Logs the error and pushes its single user-facing notification.
    pub fn report(self, view: &ViewSender) -> Self {
        match &self {
            FlowError::PollTransport { kind, reason } => {
                tracing::warn!("{kind} poll request could not be completed: {reason}");
            }
            FlowError::JobFailed { kind, id, cause } => {
                tracing::warn!("{kind} job {id} ended as failed ({cause:?})");
            }
            FlowError::Invalid(_) | FlowError::ExportNotReady { .. } => {
                tracing::info!("{self}");
            }
            other => tracing::error!("{other}"),
        }
        view.emit(crate::view::ViewEvent::Notify(self.notification()));
        self
    }
}
