//! Application status: tracks tailoring and the initial score check side by side.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::api_client::JobApi;
use crate::config::PollingConfig;
use crate::errors::{FailureCause, FlowError};
use crate::models::application::{ApplicationId, ApplicationResponse};
use crate::models::job::JobKind;
use crate::models::score_check::ResumeCheckResult;
use crate::orchestrator::tracker::{self, JobState, JobUpdate, TrackedJob, Transition};
use crate::poller::PollHandle;
use crate::session::Session;
use crate::view::{ApplicationLaunch, InitialScore, ResultsPayload, ViewEvent, ViewSender};

pub const PROGRESS_MESSAGES: [&str; 7] = [
    "Analyzing job description...",
    "Matching your skills and experience...",
    "Rewriting your achievements for maximum impact...",
    "Writing a professional summary...",
    "Crafting a compelling narrative...",
    "Finalizing your tailored resume...",
    "Almost there, just polishing the details...",
];

/// Cosmetic; unrelated to the polling cadence.
pub const PROGRESS_ROTATION: Duration = Duration::from_millis(2500);

pub fn progress_message(tick: usize) -> &'static str {
    PROGRESS_MESSAGES[tick % PROGRESS_MESSAGES.len()]
}

#[derive(Debug)]
enum StatusEvent {
    Tailoring(JobUpdate<ApplicationResponse>),
    Score(JobUpdate<ResumeCheckResult>),
}

pub struct ApplicationStatusFlow {
    api: Arc<dyn JobApi>,
    session: Session,
    polling: PollingConfig,
    view: ViewSender,
}

impl ApplicationStatusFlow {
    pub fn new(api: Arc<dyn JobApi>, session: Session, polling: PollingConfig, view: ViewSender) -> Self {
        Self {
            api,
            session,
            polling,
            view,
        }
    }

    /// Runs until tailoring reaches a terminal state.
    ///
    /// On success the returned payload carries the initial analysis if it is
    /// known, or its still-pending job id so the results view can keep polling
    /// it. On failure the user has been notified once and both sessions are stopped.
    pub async fn run(self, launch: ApplicationLaunch) -> Result<ResultsPayload, FlowError> {
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut tailoring: TrackedJob<ApplicationResponse> =
            TrackedJob::started(JobKind::Tailoring, launch.application_id.to_string());
        let mut score: TrackedJob<ResumeCheckResult> =
            TrackedJob::started(JobKind::ScoreCheck, launch.score_check_job_id.clone());

        let tailoring_poll = self.poll_application(launch.application_id, tx.clone());
        let score_poll = self.poll_score(&launch.score_check_job_id, tx);

        info!(
            "Tracking application {} with score check {}",
            launch.application_id, launch.score_check_job_id
        );
        self.view.emit(ViewEvent::TailoringPending);

        while let Some(event) = rx.recv().await {
            match event {
                StatusEvent::Score(update) => match score.observe(update) {
                    Transition::Completed(result) => {
                        debug!("Initial analysis for application {} is ready", launch.application_id);
                        self.view.emit(ViewEvent::InitialAnalysis(result));
                    }
                    Transition::Failed(cause) => {
                        let err = FlowError::job(JobKind::ScoreCheck, score.id(), cause).report(&self.view);
                        self.view
                            .emit(ViewEvent::InitialAnalysisUnavailable(err.user_message()));
                    }
                    Transition::StillPending | Transition::Ignored => {}
                },
                StatusEvent::Tailoring(update) => match tailoring.observe(update) {
                    Transition::Completed(app) => {
                        score_poll.stop();
                        tailoring_poll.stop();
                        self.view.success("Your tailored resume is ready!");
                        return Ok(self.results_payload(&launch, &app, &score));
                    }
                    Transition::Failed(cause) => {
                        score_poll.stop();
                        return Err(
                            FlowError::job(JobKind::Tailoring, tailoring.id(), cause).report(&self.view)
                        );
                    }
                    Transition::StillPending | Transition::Ignored => {}
                },
            }
        }

        // Every sender is gone without a terminal tailoring update.
        score_poll.stop();
        Err(FlowError::job(
            JobKind::Tailoring,
            tailoring.id(),
            FailureCause::Transport("status updates stopped".to_string()),
        )
        .report(&self.view))
    }

    fn results_payload(
        &self,
        launch: &ApplicationLaunch,
        app: &ApplicationResponse,
        score: &TrackedJob<ResumeCheckResult>,
    ) -> ResultsPayload {
        let initial_score = match score.state() {
            JobState::Completed(result) => InitialScore::Ready(result.clone()),
            JobState::Pending => InitialScore::Pending(score.id().to_string()),
            JobState::NotStarted | JobState::Failed(_) => InitialScore::Unavailable,
        };

        let job_description = if launch.job_description.trim().is_empty() {
            app.target_job_description.clone()
        } else {
            launch.job_description.clone()
        };

        ResultsPayload {
            application_id: app.id,
            job_description: Some(job_description).filter(|jd| !jd.trim().is_empty()),
            initial_score,
        }
    }

    fn poll_application(
        &self,
        id: ApplicationId,
        events: mpsc::UnboundedSender<StatusEvent>,
    ) -> PollHandle {
        let api = self.api.clone();
        let token = self.session.credential();
        tracker::track(
            JobKind::Tailoring,
            &id.to_string(),
            self.polling.application_interval,
            self.polling.max_attempts,
            move || {
                let api = api.clone();
                let token = token.clone();
                async move { api.get_application(&token, id).await }
            },
            StatusEvent::Tailoring,
            events,
        )
    }

    fn poll_score(&self, job_id: &str, events: mpsc::UnboundedSender<StatusEvent>) -> PollHandle {
        let api = self.api.clone();
        let token = self.session.credential();
        let id = job_id.to_string();
        tracker::track(
            JobKind::ScoreCheck,
            job_id,
            self.polling.score_interval,
            self.polling.max_attempts,
            move || {
                let api = api.clone();
                let token = token.clone();
                let id = id.clone();
                async move { api.get_resume_check(&token, &id).await }
            },
            StatusEvent::Score,
            events,
        )
    }
}
