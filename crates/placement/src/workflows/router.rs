use axum::{
    async_trait,
    extract::{FromRequestParts, Path, State},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use super::assessment::{AssessmentService, TestSubmission};
use super::error::WorkflowError;
use super::hiring::{
    ApplicationLifecycle, InterviewRequest, OfferLetterUpload, SubmittedFile, TransitionOutcome,
};
use super::ids::{ApplicationId, JobId, TestId, UserId};
use super::notify::templates::content_type_for;
use crate::error::AppError;

/// Header carrying the authenticated account id, set by the auth layer in
/// front of this router.
pub const ACTOR_HEADER: &str = "x-user-id";

#[derive(Clone, Debug)]
pub struct PlacementState {
    pub assessments: AssessmentService,
    pub lifecycle: ApplicationLifecycle,
}

/// Acting user resolved from [`ACTOR_HEADER`].
#[derive(Debug, Clone, Copy)]
pub struct Actor(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(ACTOR_HEADER)
            .ok_or_else(|| WorkflowError::invalid_input(format!("missing {ACTOR_HEADER} header")))?
            .to_str()
            .map_err(|_| WorkflowError::invalid_input(format!("malformed {ACTOR_HEADER} header")))?;
        Ok(Actor(UserId::parse(raw)?))
    }
}

pub fn placement_router(state: PlacementState) -> Router {
    Router::new()
        .route("/api/v1/tests", post(submit_test_handler))
        .route(
            "/api/v1/tests/:test_id/result-draft",
            post(result_draft_handler),
        )
        .route(
            "/api/v1/applications/:application_id/shortlist",
            post(shortlist_handler),
        )
        .route(
            "/api/v1/applications/:application_id/reject",
            post(reject_handler),
        )
        .route(
            "/api/v1/applications/:application_id/interview",
            post(schedule_interview_handler).delete(cancel_interview_handler),
        )
        .route(
            "/api/v1/applications/:application_id/offer",
            post(offer_handler),
        )
        .route(
            "/api/v1/applications/:application_id/hire",
            post(hire_handler),
        )
        .route(
            "/api/v1/applications/:application_id/files/:kind",
            get(submitted_file_handler),
        )
        .route("/api/v1/jobs/:job_id/funnel", get(funnel_handler))
        .with_state(state)
}

pub(crate) async fn submit_test_handler(
    State(state): State<PlacementState>,
    Actor(actor): Actor,
    Json(submission): Json<TestSubmission>,
) -> Result<Response, AppError> {
    let test = state.assessments.submit_test(actor, submission).await?;
    Ok((StatusCode::CREATED, Json(test)).into_response())
}

pub(crate) async fn result_draft_handler(
    State(state): State<PlacementState>,
    Actor(actor): Actor,
    Path(test_id): Path<String>,
) -> Result<Response, AppError> {
    let test_id = TestId::parse(&test_id)?;
    // Detached; failures are logged by the pipeline.
    let _handle = state.assessments.request_result_draft(actor, test_id)?;
    let payload = json!({ "test_id": test_id, "status": "queued" });
    Ok((StatusCode::ACCEPTED, Json(payload)).into_response())
}

pub(crate) async fn shortlist_handler(
    State(state): State<PlacementState>,
    Actor(actor): Actor,
    Path(application_id): Path<String>,
) -> Result<Response, AppError> {
    let application_id = ApplicationId::parse(&application_id)?;
    let outcome = state.lifecycle.shortlist(actor, application_id)?;
    Ok(transition_response(application_id, outcome))
}

pub(crate) async fn reject_handler(
    State(state): State<PlacementState>,
    Actor(actor): Actor,
    Path(application_id): Path<String>,
) -> Result<Response, AppError> {
    let application_id = ApplicationId::parse(&application_id)?;
    let outcome = state.lifecycle.reject(actor, application_id)?;
    Ok(transition_response(application_id, outcome))
}

pub(crate) async fn schedule_interview_handler(
    State(state): State<PlacementState>,
    Actor(actor): Actor,
    Path(application_id): Path<String>,
    Json(request): Json<InterviewRequest>,
) -> Result<Response, AppError> {
    let application_id = ApplicationId::parse(&application_id)?;
    let interview = state
        .lifecycle
        .schedule_interview(actor, application_id, request)?;
    Ok((StatusCode::CREATED, Json(interview)).into_response())
}

pub(crate) async fn cancel_interview_handler(
    State(state): State<PlacementState>,
    Actor(actor): Actor,
    Path(application_id): Path<String>,
) -> Result<Response, AppError> {
    let application_id = ApplicationId::parse(&application_id)?;
    let interview = state.lifecycle.cancel_interview(actor, application_id)?;
    Ok((StatusCode::OK, Json(interview)).into_response())
}

pub(crate) async fn offer_handler(
    State(state): State<PlacementState>,
    Actor(actor): Actor,
    Path(application_id): Path<String>,
    Json(upload): Json<OfferLetterUpload>,
) -> Result<Response, AppError> {
    let application_id = ApplicationId::parse(&application_id)?;
    let outcome = state.lifecycle.offer(actor, application_id, upload)?;
    Ok(transition_response(application_id, outcome))
}

pub(crate) async fn hire_handler(
    State(state): State<PlacementState>,
    Actor(actor): Actor,
    Path(application_id): Path<String>,
) -> Result<Response, AppError> {
    let application_id = ApplicationId::parse(&application_id)?;
    let outcome = state.lifecycle.hire(actor, application_id)?;
    Ok(transition_response(application_id, outcome))
}

pub(crate) async fn submitted_file_handler(
    State(state): State<PlacementState>,
    Actor(actor): Actor,
    Path((application_id, kind)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let application_id = ApplicationId::parse(&application_id)?;
    let kind = SubmittedFile::parse(&kind)?;
    let view = state
        .lifecycle
        .view_submitted_file(actor, application_id, kind)?;

    let bytes = tokio::fs::read(&view.path).await?;
    let content_type = content_type_for(&view.path).to_string();
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type)],
        bytes,
    )
        .into_response())
}

pub(crate) async fn funnel_handler(
    State(state): State<PlacementState>,
    Actor(actor): Actor,
    Path(job_id): Path<String>,
) -> Result<Response, AppError> {
    let job_id = JobId::parse(&job_id)?;
    let funnel = state.lifecycle.applicant_funnel(actor, job_id)?;
    Ok((StatusCode::OK, Json(funnel)).into_response())
}

fn transition_response(application_id: ApplicationId, outcome: TransitionOutcome) -> Response {
    let status = match outcome {
        TransitionOutcome::Applied => StatusCode::OK,
        TransitionOutcome::Stale => StatusCode::CONFLICT,
    };
    let payload = json!({
        "application_id": application_id,
        "outcome": outcome,
    });
    (status, Json(payload)).into_response()
}
