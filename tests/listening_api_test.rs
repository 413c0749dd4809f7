mod common;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use common::{token_for, TestApp};
use ielts_backend::models::evaluation::Module;
use ielts_backend::models::question::AnswerKeyEntry;

fn seed_two_question_key(app: &TestApp, exam_id: Uuid) {
    app.store.set_answer_key(
        Module::Listening,
        exam_id,
        vec![
            AnswerKeyEntry::new(1, Some("cat")),
            AnswerKeyEntry::new(2, Some("dog")),
        ],
    );
}

#[tokio::test]
async fn listening_submit_then_fetch_latest() {
    let app = TestApp::new();
    let user = Uuid::new_v4();
    let exam = Uuid::new_v4();
    let token = token_for(user);
    seed_two_question_key(&app, exam);

    let uri = format!("/api/exams/{}/listening/evaluation", exam);
    let (status, body) = app
        .request(
            "POST",
            &uri,
            Some(&token),
            Some(json!({ "responses": { "1": "Cat", "2": "fish" } })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["correct_count"], 1);
    assert_eq!(body["data"]["band_score"], 2.0);
    assert_eq!(body["data"]["attempt_number"], 1);
    assert_eq!(body["data"]["user_id"], user.to_string());
    assert!(body["data"]["exam_type"].is_null());

    let (status, body) = app
        .request(
            "POST",
            &uri,
            Some(&token),
            Some(json!({ "responses": { "1": "cat", "2": "dog" } })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["attempt_number"], 2);
    assert_eq!(body["data"]["correct_count"], 2);

    let (status, body) = app.request("GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["attempt_number"], 2);
    assert_eq!(body["data"]["correct_count"], 2);

    let summary = app.store.summary(user, exam).expect("summary row");
    assert_eq!(summary.listening_band_score, Some(2.0));
    assert_eq!(summary.reading_band_score, None);
}

#[tokio::test]
async fn unanswered_questions_are_stored_as_blank() {
    let app = TestApp::new();
    let user = Uuid::new_v4();
    let exam = Uuid::new_v4();
    seed_two_question_key(&app, exam);

    let (status, body) = app
        .request(
            "POST",
            &format!("/api/exams/{}/listening/evaluation", exam),
            Some(&token_for(user)),
            Some(json!({ "responses": { "1": "cat" } })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["responses"], json!({ "1": "cat", "2": "" }));
    assert_eq!(body["data"]["correct_count"], 1);
}

#[tokio::test]
async fn exam_without_answer_key_scores_zero() {
    let app = TestApp::new();
    let exam = Uuid::new_v4();

    let (status, body) = app
        .request(
            "POST",
            &format!("/api/exams/{}/listening/evaluation", exam),
            Some(&token_for(Uuid::new_v4())),
            Some(json!({ "responses": { "1": "cat" } })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["correct_count"], 0);
    assert_eq!(body["data"]["band_score"], 2.0);
}

#[tokio::test]
async fn latest_without_attempts_is_not_found() {
    let app = TestApp::new();
    let (status, body) = app
        .request(
            "GET",
            &format!("/api/exams/{}/listening/evaluation", Uuid::new_v4()),
            Some(&token_for(Uuid::new_v4())),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Evaluation not found");
}

#[tokio::test]
async fn attempts_are_scoped_per_user() {
    let app = TestApp::new();
    let exam = Uuid::new_v4();
    seed_two_question_key(&app, exam);
    let uri = format!("/api/exams/{}/listening/evaluation", exam);

    let alice = token_for(Uuid::new_v4());
    let bob = token_for(Uuid::new_v4());
    let payload = json!({ "responses": { "1": "cat", "2": "dog" } });

    app.request("POST", &uri, Some(&alice), Some(payload.clone())).await;
    app.request("POST", &uri, Some(&alice), Some(payload.clone())).await;
    let (_, body) = app.request("POST", &uri, Some(&bob), Some(payload)).await;
    assert_eq!(body["data"]["attempt_number"], 1);
}

#[tokio::test]
async fn requests_without_a_valid_token_are_rejected() {
    let app = TestApp::new();
    let uri = format!("/api/exams/{}/listening/evaluation", Uuid::new_v4());

    let (status, body) = app.request("GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Missing Authorization Token");

    let (status, _) = app.request("GET", &uri, Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .request("POST", &uri, None, Some(json!({ "responses": {} })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(app.store.objective_rows(Module::Listening).is_empty());
}

#[tokio::test]
async fn mismatched_body_user_id_is_forbidden() {
    let app = TestApp::new();
    let user = Uuid::new_v4();
    let exam = Uuid::new_v4();

    let (status, _) = app
        .request(
            "POST",
            &format!("/api/exams/{}/listening/evaluation", exam),
            Some(&token_for(user)),
            Some(json!({ "user_id": Uuid::new_v4(), "responses": { "1": "cat" } })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(app.store.objective_rows(Module::Listening).is_empty());

    let (status, _) = app
        .request(
            "POST",
            &format!("/api/exams/{}/listening/evaluation", exam),
            Some(&token_for(user)),
            Some(json!({ "user_id": user, "responses": { "1": "cat" } })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::new();
    let (status, body) = app.request("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn malformed_requests_get_the_error_envelope() {
    let app = TestApp::new();
    let token = token_for(Uuid::new_v4());
    let uri = format!("/api/exams/{}/listening/evaluation", Uuid::new_v4());

    let (status, body) = app
        .request(
            "POST",
            &uri,
            Some(&token),
            Some(json!({ "responses": { "1": 5 } })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");
    assert!(app.store.objective_rows(Module::Listening).is_empty());

    let (status, body) = app
        .request(
            "GET",
            "/api/exams/not-a-uuid/listening/evaluation",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");

    let (status, body) = app
        .request(
            "GET",
            "/api/user_exam_summary?examId=nope",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");
}
