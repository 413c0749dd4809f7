pub mod extract;
pub mod health;
pub mod listening;
pub mod reading;
pub mod summary;
pub mod writing;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::auth::require_bearer_auth;
use crate::AppState;

/// Assembles the HTTP surface. Everything except `/health` sits behind
/// bearer-token authentication.
pub fn create_router(state: AppState) -> Router {
    let evaluation_api = Router::new()
        .route(
            "/api/exams/:exam_id/listening/evaluation",
            get(listening::get_evaluation).post(listening::submit_evaluation),
        )
        .route(
            "/api/exams/:exam_id/reading/evaluation",
            get(reading::get_evaluation).post(reading::submit_evaluation),
        )
        .route(
            "/api/exams/:exam_id/writing/evaluation",
            get(writing::get_evaluation).post(writing::submit_evaluation),
        )
        .route(
            "/api/exams/:exam_id/writing/evaluation/retry",
            post(writing::retry_evaluation),
        )
        .route("/api/user_exam_summary", get(summary::list_summaries))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_bearer_auth,
        ));

    Router::new()
        .route("/health", get(health::health))
        .merge(evaluation_api)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024))
}
