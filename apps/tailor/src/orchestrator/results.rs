//! Results: the tailored resume plus before/after analyses.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::api_client::{ApiError, JobApi};
use crate::config::PollingConfig;
use crate::errors::{FlowError, Precondition};
use crate::models::application::{ApplicationId, ApplicationResponse};
use crate::models::job::JobKind;
use crate::models::score_check::{ResumeCheckJob, ResumeCheckRequest, ResumeCheckResult};
use crate::orchestrator::tracker::{self, JobUpdate, TrackedJob, Transition};
use crate::poller::PollHandle;
use crate::session::Session;
use crate::view::{InitialScore, ResultsPayload, ViewEvent, ViewSender};

pub const MISSING_DATA: &str = "Analysis could not be performed due to missing data.";
pub const INITIAL_UNAVAILABLE: &str = "Original analysis not available.";
const TAILORED_FAILED: &str = "Could not load tailored resume analysis.";
const TAILORED_ERROR_STATE: &str = "Error loading analysis.";

#[derive(Debug, Clone, PartialEq)]
pub struct ResultsView {
    pub application: ApplicationResponse,
    pub initial_analysis: Option<ResumeCheckResult>,
    pub tailored_analysis: Option<ResumeCheckResult>,
}

#[derive(Debug)]
enum ResultsEvent {
    Initial(JobUpdate<ResumeCheckResult>),
    Tailored(JobUpdate<ResumeCheckResult>),
}

/// A score check with its poll session; dropping it stops the polling.
#[derive(Debug)]
pub struct TrackedCheck {
    job: TrackedJob<ResumeCheckResult>,
    _poll: PollHandle,
}

impl TrackedCheck {
    pub fn job_id(&self) -> &str {
        self.job.id()
    }

    fn is_pending(&self) -> bool {
        !self.job.is_terminal()
    }
}

pub struct ResultsFlow {
    api: Arc<dyn JobApi>,
    session: Session,
    polling: PollingConfig,
    view: ViewSender,
    events_tx: mpsc::UnboundedSender<ResultsEvent>,
    events_rx: mpsc::UnboundedReceiver<ResultsEvent>,
    tailored_check_started: bool,
}

impl ResultsFlow {
    pub fn new(api: Arc<dyn JobApi>, session: Session, polling: PollingConfig, view: ViewSender) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            api,
            session,
            polling,
            view,
            events_tx,
            events_rx,
            tailored_check_started: false,
        }
    }

    pub async fn load(&self, id: ApplicationId) -> Result<ApplicationResponse, FlowError> {
        self.api
            .get_application(&self.session.credential(), id)
            .await
            .map_err(|source| {
                if source.is_unauthorized() {
                    FlowError::Precondition(Precondition::Credential)
                } else {
                    FlowError::Load {
                        what: "results",
                        source,
                    }
                }
            })
    }

    /// Creates the post-tailoring score check at most once per flow.
    ///
    /// Without tailored text or a job description there is nothing to compare
    /// and no job is created. Creation failures are reported here and leave the
    /// rest of the results usable.
    pub async fn start_tailored_check(
        &mut self,
        app: &ApplicationResponse,
        job_description: Option<&str>,
    ) -> Option<TrackedCheck> {
        let request = self.tailored_check_request(app, job_description)?;
        let created = self
            .api
            .start_resume_check(&self.session.credential(), &request)
            .await;
        self.tailored_check_created(app.id, created)
    }

    /// One-shot guard plus the missing-data check. `None` means no job is to
    /// be created.
    fn tailored_check_request(
        &mut self,
        app: &ApplicationResponse,
        job_description: Option<&str>,
    ) -> Option<ResumeCheckRequest> {
        if self.tailored_check_started {
            debug!("Tailored score check for application {} already started", app.id);
            return None;
        }
        self.tailored_check_started = true;

        let resume_text = app.final_resume_text.as_deref().filter(|t| !t.trim().is_empty());
        let job_description = job_description.filter(|jd| !jd.trim().is_empty());
        let (Some(resume_text), Some(job_description)) = (resume_text, job_description) else {
            info!("Skipping tailored analysis for application {}: missing data", app.id);
            self.view
                .emit(ViewEvent::TailoredAnalysisUnavailable(MISSING_DATA.to_string()));
            return None;
        };
        Some(ResumeCheckRequest::for_resume(job_description, resume_text))
    }

    fn tailored_check_created(
        &self,
        application_id: ApplicationId,
        created: Result<ResumeCheckJob, ApiError>,
    ) -> Option<TrackedCheck> {
        match created {
            Ok(job) => {
                info!(
                    "Started tailored score check {} for application {application_id}",
                    job.job_id
                );
                Some(self.poll_check(&job.job_id, ResultsEvent::Tailored))
            }
            Err(e) => {
                warn!("Failed to start tailored score check for application {application_id}: {e}");
                self.view.error(TAILORED_FAILED);
                self.view
                    .emit(ViewEvent::TailoredAnalysisUnavailable(TAILORED_ERROR_STATE.to_string()));
                None
            }
        }
    }

    fn poll_check(
        &self,
        job_id: &str,
        wrap: fn(JobUpdate<ResumeCheckResult>) -> ResultsEvent,
    ) -> TrackedCheck {
        let api = self.api.clone();
        let token = self.session.credential();
        let id = job_id.to_string();
        let poll = tracker::track(
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
            wrap,
            self.events_tx.clone(),
        );
        TrackedCheck {
            job: TrackedJob::started(JobKind::ScoreCheck, job_id),
            _poll: poll,
        }
    }

    /// Loads the application, then emits each analysis as soon as it is known.
    /// Returns once no score check is left pending.
    pub async fn run(mut self, payload: ResultsPayload) -> Result<ResultsView, FlowError> {
        let application = self
            .load(payload.application_id)
            .await
            .map_err(|e| e.report(&self.view))?;

        if let Some(text) = &application.final_resume_text {
            self.view.emit(ViewEvent::TailoredResume(text.clone()));
        }

        let mut initial_analysis = None;
        let mut initial = match payload.initial_score {
            InitialScore::Ready(result) => {
                self.view.emit(ViewEvent::InitialAnalysis(result.clone()));
                initial_analysis = Some(result);
                None
            }
            InitialScore::Pending(job_id) => Some(self.poll_check(&job_id, ResultsEvent::Initial)),
            InitialScore::Unavailable => {
                self.view
                    .emit(ViewEvent::InitialAnalysisUnavailable(INITIAL_UNAVAILABLE.to_string()));
                None
            }
        };

        // Creation is polled beside the events; neither holds back the other.
        let request = self.tailored_check_request(&application, payload.job_description.as_deref());
        let mut creating = request.is_some();
        let create = {
            let api = self.api.clone();
            let token = self.session.credential();
            async move {
                match request {
                    Some(request) => Some(api.start_resume_check(&token, &request).await),
                    None => None,
                }
            }
        };
        tokio::pin!(create);

        let mut tailored: Option<TrackedCheck> = None;
        let mut tailored_analysis = None;

        while creating
            || initial.as_ref().is_some_and(TrackedCheck::is_pending)
            || tailored.as_ref().is_some_and(TrackedCheck::is_pending)
        {
            let event = tokio::select! {
                created = &mut create, if creating => {
                    creating = false;
                    if let Some(created) = created {
                        tailored = self.tailored_check_created(application.id, created);
                    }
                    continue;
                }
                event = self.events_rx.recv() => event,
            };
            let Some(event) = event else {
                break;
            };

            match event {
                ResultsEvent::Initial(update) => {
                    let Some(check) = initial.as_mut() else { continue };
                    match check.job.observe(update) {
                        Transition::Completed(result) => {
                            self.view.emit(ViewEvent::InitialAnalysis(result.clone()));
                            initial_analysis = Some(result);
                        }
                        Transition::Failed(cause) => {
                            let err = FlowError::job(JobKind::ScoreCheck, check.job_id(), cause)
                                .report(&self.view);
                            self.view
                                .emit(ViewEvent::InitialAnalysisUnavailable(err.user_message()));
                        }
                        Transition::StillPending | Transition::Ignored => {}
                    }
                }
                ResultsEvent::Tailored(update) => {
                    let Some(check) = tailored.as_mut() else { continue };
                    match check.job.observe(update) {
                        Transition::Completed(result) => {
                            self.view.emit(ViewEvent::TailoredAnalysis(result.clone()));
                            tailored_analysis = Some(result);
                        }
                        Transition::Failed(cause) => {
                            warn!(
                                "{}",
                                FlowError::job(JobKind::ScoreCheck, check.job_id(), cause)
                            );
                            self.view.error(TAILORED_FAILED);
                            self.view.emit(ViewEvent::TailoredAnalysisUnavailable(
                                TAILORED_ERROR_STATE.to_string(),
                            ));
                        }
                        Transition::StillPending | Transition::Ignored => {}
                    }
                }
            }
        }

        // Stops any session still running if the loop ended early.
        initial.take();
        tailored.take();

        Ok(ResultsView {
            application,
            initial_analysis,
            tailored_analysis,
        })
    }
}
