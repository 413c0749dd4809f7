use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Extension,
};
use uuid::Uuid;

use crate::dto::evaluation_dto::{DataResponse, ReadingEvaluationRequest};
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::exam::ExamType;
use crate::routes::extract::{ApiJson, ApiPath};
use crate::AppState;

#[axum::debug_handler]
pub async fn submit_evaluation(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(exam_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<ReadingEvaluationRequest>,
) -> Result<Response> {
    user.ensure_matches(req.user_id)?;
    let exam_type = ExamType::from_label(req.exam_type.as_deref());
    let evaluation = state
        .evaluation_service
        .submit_reading(user.user_id, exam_id, exam_type, req.responses)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(evaluation))).into_response())
}

#[axum::debug_handler]
pub async fn get_evaluation(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(exam_id): ApiPath<Uuid>,
) -> Result<Response> {
    let evaluation = state
        .evaluation_service
        .latest_reading(user.user_id, exam_id)
        .await?;
    Ok(Json(DataResponse::new(evaluation)).into_response())
}
