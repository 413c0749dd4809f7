use axum::{
    extract::State,
    response::{IntoResponse, Json, Response},
    Extension,
};
use uuid::Uuid;

use crate::dto::evaluation_dto::{
    DataResponse, WritingEvaluationRequest, WritingEvaluationView, WritingSubmissionResponse,
};
use crate::error::{Error, Result};
use crate::middleware::auth::AuthUser;
use crate::routes::extract::{ApiJson, ApiPath};
use crate::AppState;

/// The flow runs on its own task so a client disconnect cannot abandon it
/// between the placeholder insert and the final update.
#[axum::debug_handler]
pub async fn submit_evaluation(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(exam_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<WritingEvaluationRequest>,
) -> Result<Response> {
    let service = state.evaluation_service.clone();
    let evaluation = tokio::spawn(async move {
        service.submit_writing(user.user_id, exam_id, req).await
    })
    .await
    .map_err(|e| Error::Internal(format!("Writing evaluation task failed: {}", e)))??;

    Ok(Json(DataResponse::new(WritingSubmissionResponse {
        success: true,
        attempt_number: evaluation.attempt_number,
    }))
    .into_response())
}

#[axum::debug_handler]
pub async fn retry_evaluation(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(exam_id): ApiPath<Uuid>,
) -> Result<Response> {
    let service = state.evaluation_service.clone();
    let evaluation = tokio::spawn(async move {
        service.reevaluate_writing(user.user_id, exam_id).await
    })
    .await
    .map_err(|e| Error::Internal(format!("Writing re-evaluation task failed: {}", e)))??;

    Ok(Json(DataResponse::new(WritingSubmissionResponse {
        success: true,
        attempt_number: evaluation.attempt_number,
    }))
    .into_response())
}

#[axum::debug_handler]
pub async fn get_evaluation(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(exam_id): ApiPath<Uuid>,
) -> Result<Response> {
    let evaluation = state
        .evaluation_service
        .latest_writing(user.user_id, exam_id)
        .await?;
    Ok(Json(DataResponse::new(WritingEvaluationView::from(evaluation))).into_response())
}
