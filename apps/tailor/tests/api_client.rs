//! ApiClient against an in-process axum backend.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::{json, Value};

use tailor::api_client::{ApiClient, ApiError, JobApi};
use tailor::models::export::{ExportFormat, ExportReadiness};
use tailor::models::job::JobStatus;
use tailor::models::profile::JobHistoryUpdate;
use tailor::models::score_check::ResumeCheckRequest;

const TOKEN: &str = "good-token";

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some("Bearer good-token")
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "detail": "Not authenticated" })),
    )
        .into_response()
}

async fn profile(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({ "id": "user-1", "email": "jane@example.com", "has_base_resume": true }))
        .into_response()
}

async fn application(Path(id): Path<i64>) -> Response {
    if id != 1 {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "Application not found" })),
        )
            .into_response();
    }
    Json(json!({
        "id": 1,
        "user_id": "user-1",
        "status": "processing",
        "target_job_description": "Senior Rust Engineer",
        "final_resume_text": null,
        "created_at": "2024-05-01T12:00:00Z"
    }))
    .into_response()
}

async fn start_check(Json(body): Json<Value>) -> Response {
    if body["job_post"].as_str().unwrap_or_default().is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "detail": [{ "loc": ["body", "job_post"], "msg": "job_post must not be empty" }] })),
        )
            .into_response();
    }
    Json(json!({ "job_id": "check-1" })).into_response()
}

async fn get_check(Path(job_id): Path<String>) -> Response {
    match job_id.as_str() {
        "check-1" => Json(json!({
            "status": "completed",
            "analysis": "## Strong match",
            "score": 83.6,
            "score_csv": "Category,Score\nSkills,90"
        }))
        .into_response(),
        "empty" => StatusCode::OK.into_response(),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "Scoring backend unavailable" })),
        )
            .into_response(),
    }
}

async fn update_histories(Json(updates): Json<Vec<Value>>) -> Response {
    assert!(!updates.is_empty());
    StatusCode::NO_CONTENT.into_response()
}

async fn export(Path(id): Path<i64>, Query(params): Query<HashMap<String, String>>) -> Response {
    if id != 1 {
        return StatusCode::NOT_FOUND.into_response();
    }
    let format = params.get("format").cloned().unwrap_or_default();
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"jane-doe.{format}\""),
            ),
        ],
        b"%PDF-1.7".to_vec(),
    )
        .into_response()
}

async fn spawn_backend() -> String {
    let app = Router::new()
        .route("/profiles/me", get(profile))
        .route("/profiles/job-histories", patch(update_histories))
        .route("/applications/:id", get(application))
        .route("/applications/:id/export", get(export))
        .route("/resume-check/", post(start_check))
        .route("/resume-check/:job_id", get(get_check));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn client() -> ApiClient {
    ApiClient::new(&spawn_backend().await, None).unwrap()
}

#[tokio::test]
async fn test_bearer_credential_is_sent() {
    let client = client().await;

    let profile = client.get_profile(TOKEN).await.unwrap();
    assert_eq!(profile.email.as_deref(), Some("jane@example.com"));

    let err = client.get_profile("someone-else").await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(err.user_message(), "Not authenticated");
}

#[tokio::test]
async fn test_processing_status_reads_as_pending() {
    let client = client().await;
    let app = client.get_application(TOKEN, 1).await.unwrap();
    assert_eq!(app.status, JobStatus::Pending);
    assert!(app.final_resume_text.is_none());
    assert!(app.created_at.is_some());
}

#[tokio::test]
async fn test_error_detail_string_is_surfaced() {
    let client = client().await;
    let err = client.get_application(TOKEN, 99).await.unwrap_err();
    assert!(matches!(err, ApiError::Api { status: 404, .. }));
    assert_eq!(err.user_message(), "Application not found");
}

#[tokio::test]
async fn test_validation_error_message_is_surfaced() {
    let client = client().await;
    let err = client
        .start_resume_check(TOKEN, &ResumeCheckRequest::for_base_resume(""))
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "job_post must not be empty");
}

#[tokio::test]
async fn test_score_check_round_trip() {
    let client = client().await;
    let job = client
        .start_resume_check(TOKEN, &ResumeCheckRequest::for_resume("Senior Rust Engineer", "# Jane"))
        .await
        .unwrap();
    assert_eq!(job.job_id, "check-1");

    let result = client.get_resume_check(TOKEN, &job.job_id).await.unwrap();
    assert_eq!(result.status, JobStatus::Completed);
    assert_eq!(result.display_score(), Some(84));
    assert_eq!(result.raw_csv.as_deref(), Some("Category,Score\nSkills,90"));
}

#[tokio::test]
async fn test_message_field_and_empty_body() {
    let client = client().await;

    let err = client.get_resume_check(TOKEN, "broken").await.unwrap_err();
    assert_eq!(err.user_message(), "Scoring backend unavailable");

    let err = client.get_resume_check(TOKEN, "empty").await.unwrap_err();
    assert!(matches!(err, ApiError::EmptyContent));
}

#[tokio::test]
async fn test_no_content_is_not_an_error() {
    let client = client().await;
    let saved = client
        .update_job_histories(
            TOKEN,
            &[JobHistoryUpdate {
                id: 1,
                detailed_background: Some("Led the platform team".into()),
                is_default_rewrite: Some(true),
            }],
        )
        .await
        .unwrap();
    assert!(saved.is_empty());
}

#[tokio::test]
async fn test_export_readiness_and_download() {
    let client = client().await;

    assert_eq!(
        client.export_readiness(TOKEN, 1, ExportFormat::Pdf).await.unwrap(),
        ExportReadiness::Ready
    );
    assert_eq!(
        client.export_readiness(TOKEN, 2, ExportFormat::Pdf).await.unwrap(),
        ExportReadiness::NotReady { status: 404 }
    );

    let doc = client.export_document(TOKEN, 1, ExportFormat::Docx).await.unwrap();
    assert_eq!(doc.filename, "jane-doe.docx");
    assert_eq!(doc.content_type.as_deref(), Some("application/pdf"));
    assert_eq!(&doc.bytes[..], b"%PDF-1.7");
}
