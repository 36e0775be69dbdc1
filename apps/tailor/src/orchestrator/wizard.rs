//! Profile wizard: base-resume processing, then job-history details.

use tracing::{info, warn};

use crate::api_client::JobApi;
use crate::errors::{FlowError, Precondition};
use crate::models::job::JobKind;
use crate::models::profile::{JobHistory, JobHistoryUpdate};
use crate::session::Session;
use crate::view::{Route, ViewSender};

pub const EMPTY_RESUME: &str = "Please paste your resume text.";

/// Number of job histories rewritten by default when the user has not picked any.
pub const DEFAULT_REWRITE_COUNT: usize = 2;

/// Step 1. Returns the extracted job histories, the payload for step 2.
pub async fn process_resume(
    api: &dyn JobApi,
    session: &Session,
    view: &ViewSender,
    resume_text: &str,
) -> Result<Vec<JobHistory>, FlowError> {
    if resume_text.trim().is_empty() {
        return Err(FlowError::Invalid(EMPTY_RESUME.to_string()).report(view));
    }

    let processed = api
        .process_resume(&session.credential(), resume_text)
        .await
        .map_err(|e| FlowError::creation(JobKind::ResumeProcessing, e).report(view))?;

    info!("Resume processed into {} job histories", processed.job_histories.len());
    view.success("Resume processed successfully!");
    Ok(processed.job_histories)
}

/// Leaving step 1 is only allowed once a base resume exists.
pub fn leave_resume_step(session: &Session, view: &ViewSender) -> Option<Route> {
    if session.has_base_resume() {
        Some(Route::Dashboard)
    } else {
        view.info("You need to upload a resume to continue.");
        None
    }
}

/// Marks the first histories for rewriting unless the user already chose some.
pub fn default_rewrite_selection(histories: &mut [JobHistory]) {
    if histories.iter().any(|h| h.is_default_rewrite == Some(true)) {
        return;
    }
    for (i, history) in histories.iter_mut().enumerate() {
        history.is_default_rewrite = Some(i < DEFAULT_REWRITE_COUNT);
    }
}

/// Step 2. Saves background text and rewrite flags for every history.
pub async fn save_details(
    api: &dyn JobApi,
    session: &Session,
    view: &ViewSender,
    mut histories: Vec<JobHistory>,
) -> Result<Vec<JobHistory>, FlowError> {
    if histories.is_empty() {
        return Err(FlowError::Precondition(Precondition::JobHistories).report(view));
    }

    default_rewrite_selection(&mut histories);
    let updates: Vec<JobHistoryUpdate> = histories.iter().map(JobHistoryUpdate::from).collect();

    match api.update_job_histories(&session.credential(), &updates).await {
        Ok(saved) => {
            info!("Saved {} job histories", updates.len());
            view.success("Profile updated successfully!");
            Ok(saved)
        }
        Err(e) if e.is_unauthorized() => {
            Err(FlowError::Precondition(Precondition::Credential).report(view))
        }
        Err(e) => {
            warn!("Failed to update job history: {e}");
            Err(FlowError::Request(e).report(view))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::{ProcessedResume, Profile};
    use crate::testing::{drain, history, ok, status, FakeApi};
    use crate::view;

    #[test]
    fn test_first_two_selected_by_default() {
        let mut histories = vec![
            history(1, "Staff Engineer", None),
            history(2, "Senior Engineer", None),
            history(3, "Engineer", None),
        ];
        default_rewrite_selection(&mut histories);
        let flags: Vec<_> = histories.iter().map(|h| h.is_default_rewrite).collect();
        assert_eq!(flags, vec![Some(true), Some(true), Some(false)]);
    }

    #[test]
    fn test_user_choice_is_kept() {
        let mut histories = vec![
            history(1, "Staff Engineer", Some(false)),
            history(2, "Senior Engineer", None),
            history(3, "Engineer", Some(true)),
        ];
        default_rewrite_selection(&mut histories);
        let flags: Vec<_> = histories.iter().map(|h| h.is_default_rewrite).collect();
        assert_eq!(flags, vec![Some(false), None, Some(true)]);
    }

    #[test]
    fn test_single_history_selected() {
        let mut histories = vec![history(1, "Engineer", Some(false))];
        default_rewrite_selection(&mut histories);
        assert_eq!(histories[0].is_default_rewrite, Some(true));
    }

    #[tokio::test]
    async fn test_blank_resume_rejected() {
        let api = FakeApi::new();
        let (view, _rx) = view::channel();
        let err = process_resume(&api, &Session::with_profile("t", None), &view, "   ")
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), EMPTY_RESUME);
        assert_eq!(api.calls("process_resume"), 0);
    }

    #[tokio::test]
    async fn test_processed_histories_become_step_two_payload() {
        let api = FakeApi::new().with_processed(vec![ok(ProcessedResume {
            job_histories: vec![history(1, "Engineer", None)],
            ..Default::default()
        })]);
        let (view, mut rx) = view::channel();

        let histories = process_resume(&api, &Session::with_profile("t", None), &view, "Jane Doe\nEngineer")
            .await
            .unwrap();
        assert_eq!(histories.len(), 1);
        assert_eq!(drain(&mut rx).len(), 1);
    }

    #[tokio::test]
    async fn test_processing_failure_is_reported() {
        let api = FakeApi::new().with_processed(vec![status(422)]);
        let (view, _rx) = view::channel();
        let err = process_resume(&api, &Session::with_profile("t", None), &view, "resume")
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Failed to process resume.");
    }

    #[tokio::test]
    async fn test_missing_histories_send_user_back() {
        let api = FakeApi::new();
        let (view, mut rx) = view::channel();

        let err = save_details(&api, &Session::with_profile("t", None), &view, Vec::new())
            .await
            .unwrap_err();
        assert_eq!(err.fallback_route(), Some(Route::WizardResume));
        assert_eq!(api.calls("update_job_histories"), 0);
        assert_eq!(drain(&mut rx).len(), 1);
    }

    #[tokio::test]
    async fn test_save_applies_default_selection() {
        let api = FakeApi::new().with_histories(vec![history(1, "A", Some(true))]);
        let (view, _rx) = view::channel();
        let histories = vec![
            history(1, "A", None),
            history(2, "B", None),
            history(3, "C", None),
        ];

        let returned = save_details(&api, &Session::with_profile("t", None), &view, histories)
            .await
            .unwrap();
        assert_eq!(returned.len(), 1);

        let saved = api.saved_updates();
        assert_eq!(saved.len(), 1);
        let flags: Vec<_> = saved[0].iter().map(|u| u.is_default_rewrite).collect();
        assert_eq!(flags, vec![Some(true), Some(true), Some(false)]);
    }

    #[test]
    fn test_leaving_step_one_requires_base_resume() {
        let (view, mut rx) = view::channel();
        let without = Session::with_profile(
            "t",
            Some(Profile {
                id: "u".into(),
                email: None,
                has_base_resume: false,
            }),
        );
        assert_eq!(leave_resume_step(&without, &view), None);
        assert_eq!(drain(&mut rx).len(), 1);

        let with = Session::with_profile(
            "t",
            Some(Profile {
                id: "u".into(),
                email: None,
                has_base_resume: true,
            }),
        );
        assert_eq!(leave_resume_step(&with, &view), Some(Route::Dashboard));
    }
}
