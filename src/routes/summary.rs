use axum::{
    extract::State,
    response::{IntoResponse, Json, Response},
    Extension,
};

use crate::dto::evaluation_dto::{DataResponse, SummaryQuery};
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::routes::extract::ApiQuery;
use crate::AppState;

#[axum::debug_handler]
pub async fn list_summaries(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<SummaryQuery>,
) -> Result<Response> {
    let rows = state
        .summary_service
        .list_summaries(user.user_id, query.exam_id)
        .await?;
    Ok(Json(DataResponse::new(rows)).into_response())
}
