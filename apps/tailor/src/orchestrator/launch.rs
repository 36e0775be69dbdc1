//! Job-description submission: starts tailoring and the initial score check together.

use tracing::info;

use crate::api_client::JobApi;
use crate::errors::FlowError;
use crate::models::job::JobKind;
use crate::models::score_check::ResumeCheckRequest;
use crate::session::Session;
use crate::view::{ApplicationLaunch, ViewSender};

pub const EMPTY_JOB_DESCRIPTION: &str = "Please paste a job description.";

/// Creates the application and the base-resume score check concurrently.
///
/// Either creation failing fails the submission; the user stays where they are.
pub async fn submit_job_description(
    api: &dyn JobApi,
    session: &Session,
    view: &ViewSender,
    job_description: &str,
) -> Result<ApplicationLaunch, FlowError> {
    if job_description.trim().is_empty() {
        return Err(FlowError::Invalid(EMPTY_JOB_DESCRIPTION.to_string()).report(view));
    }

    let token = session.credential();
    let check_request = ResumeCheckRequest::for_base_resume(job_description);

    let application = async {
        api.create_application(&token, job_description)
            .await
            .map_err(|e| FlowError::creation(JobKind::Tailoring, e))
    };
    let score_check = async {
        api.start_resume_check(&token, &check_request)
            .await
            .map_err(|e| FlowError::creation(JobKind::ScoreCheck, e))
    };

    let (application, score_check) = tokio::try_join!(application, score_check)
        .map_err(|e| e.report(view))?;

    info!(
        "Application {} created; initial score check {}",
        application.id, score_check.job_id
    );
    view.success("Application started! We are now tailoring your resume.");

    Ok(ApplicationLaunch {
        application_id: application.id,
        score_check_job_id: score_check.job_id,
        job_description: job_description.to_string(),
    })
}
