//! Per-job state machine and the poll session that feeds it.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use crate::api_client::ApiError;
use crate::errors::FailureCause;
use crate::models::job::{JobKind, JobReport, JobStatus};
use crate::poller::{self, PollHandle, PollStep};

#[derive(Debug, Clone, PartialEq)]
pub enum JobState<T> {
    NotStarted,
    Pending,
    Completed(T),
    Failed(FailureCause),
}

/// One poll observation, as delivered to the owning flow.
#[derive(Debug, Clone, PartialEq)]
pub enum JobUpdate<T> {
    Pending,
    Completed(T),
    Failed(FailureCause),
}

impl<T: JobReport> JobUpdate<T> {
    pub fn from_report(report: T) -> Self {
        match report.status() {
            JobStatus::Pending => JobUpdate::Pending,
            JobStatus::Completed => JobUpdate::Completed(report),
            JobStatus::Failed => JobUpdate::Failed(FailureCause::Reported),
        }
    }
}

/// What an update did to the job.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition<T> {
    /// Update arrived for a job that is not pending; nothing changed.
    Ignored,
    StillPending,
    Completed(T),
    Failed(FailureCause),
}

#[derive(Debug, Clone)]
pub struct TrackedJob<T> {
    kind: JobKind,
    id: String,
    state: JobState<T>,
}

impl<T: Clone> TrackedJob<T> {
    pub fn new(kind: JobKind) -> Self {
        Self {
            kind,
            id: String::new(),
            state: JobState::NotStarted,
        }
    }

    /// A job whose creation call already succeeded.
    pub fn started(kind: JobKind, id: impl Into<String>) -> Self {
        let mut job = Self::new(kind);
        job.start(id);
        job
    }

    /// NotStarted → Pending. Returns false if the job was already started.
    pub fn start(&mut self, id: impl Into<String>) -> bool {
        if !matches!(self.state, JobState::NotStarted) {
            return false;
        }
        self.id = id.into();
        self.state = JobState::Pending;
        true
    }

    pub fn observe(&mut self, update: JobUpdate<T>) -> Transition<T> {
        if !matches!(self.state, JobState::Pending) {
            debug!("Ignoring update for {} job {} in state {:?}", self.kind, self.id, self.state_name());
            return Transition::Ignored;
        }

        match update {
            JobUpdate::Pending => Transition::StillPending,
            JobUpdate::Completed(result) => {
                self.state = JobState::Completed(result.clone());
                Transition::Completed(result)
            }
            JobUpdate::Failed(cause) => {
                self.state = JobState::Failed(cause.clone());
                Transition::Failed(cause)
            }
        }
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> &JobState<T> {
        &self.state
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, JobState::Completed(_) | JobState::Failed(_))
    }

    fn state_name(&self) -> &'static str {
        match self.state {
            JobState::NotStarted => "not_started",
            JobState::Pending => "pending",
            JobState::Completed(_) => "completed",
            JobState::Failed(_) => "failed",
        }
    }
}

/// Starts polling one job and forwards each observation into `events`.
///
/// The session stops itself on a terminal status, on a request error (reported
/// as a transport failure), or after `max_attempts` pending answers.
pub fn track<T, E, F, Fut>(
    kind: JobKind,
    id: &str,
    interval: Duration,
    max_attempts: Option<u32>,
    mut fetch: F,
    wrap: fn(JobUpdate<T>) -> E,
    events: mpsc::UnboundedSender<E>,
) -> PollHandle
where
    T: JobReport + Send + 'static,
    E: Send + 'static,
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
{
    let job_id = id.to_string();
    let mut attempts: u32 = 0;

    poller::start(format!("{kind}:{id}"), interval, move || {
        attempts += 1;
        let attempt = attempts;
        let request = fetch();
        let events = events.clone();
        let job_id = job_id.clone();

        async move {
            match request.await {
                Ok(report) => {
                    let status = report.status();
                    debug!("{kind} job {job_id} poll #{attempt}: {status}");

                    if !status.is_terminal() && max_attempts.is_some_and(|max| attempt >= max) {
                        let _ = events.send(wrap(JobUpdate::Failed(FailureCause::Exhausted {
                            attempts: attempt,
                        })));
                        return Ok(PollStep::Done);
                    }

                    let _ = events.send(wrap(JobUpdate::from_report(report)));
                    Ok(if status.is_terminal() {
                        PollStep::Done
                    } else {
                        PollStep::Continue
                    })
                }
                Err(e) => {
                    let _ = events.send(wrap(JobUpdate::Failed(FailureCause::Transport(
                        e.to_string(),
                    ))));
                    Err(e)
                }
            }
        }
    })
}
