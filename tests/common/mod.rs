#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;
use uuid::Uuid;

use ielts_backend::config::Config;
use ielts_backend::database::store::EvaluationStore;
use ielts_backend::error::{Error, Result};
use ielts_backend::middleware::auth::Claims;
use ielts_backend::models::evaluation::{Module, ObjectiveEvaluation, WritingEvaluation};
use ielts_backend::models::question::AnswerKeyEntry;
use ielts_backend::models::summary::UserExamSummary;
use ielts_backend::services::ai_service::{GenerationRequest, TextGenerator};
use ielts_backend::{routes, AppState};

pub const JWT_SECRET: &str = "test_secret_key";

pub fn test_config() -> Config {
    Config {
        server_address: "127.0.0.1:0".to_string(),
        database_url: "postgres://unused".to_string(),
        database_max_connections: 1,
        jwt_secret: JWT_SECRET.to_string(),
        openai_api_key: "sk-test".to_string(),
        openai_base_url: "http://localhost".to_string(),
        openai_model: "gpt-test".to_string(),
        llm_timeout_secs: 1,
        llm_temperature: 0.2,
    }
}

pub fn token_for(user_id: Uuid) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (Utc::now().timestamp() + 3600) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("encode token")
}

/// In-memory stand-in for Postgres, enforcing the same uniqueness rules.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    pub fail_summaries: AtomicBool,
    pub hide_latest_attempt: AtomicBool,
}

#[derive(Default)]
struct Inner {
    answer_keys: HashMap<(Module, Uuid), Vec<AnswerKeyEntry>>,
    objective: HashMap<Module, Vec<ObjectiveEvaluation>>,
    writing: Vec<WritingEvaluation>,
    summaries: HashMap<(Uuid, Uuid), UserExamSummary>,
}

impl MemoryStore {
    pub fn set_answer_key(&self, module: Module, exam_id: Uuid, entries: Vec<AnswerKeyEntry>) {
        self.inner
            .lock()
            .unwrap()
            .answer_keys
            .insert((module, exam_id), entries);
    }

    pub fn objective_rows(&self, module: Module) -> Vec<ObjectiveEvaluation> {
        self.inner
            .lock()
            .unwrap()
            .objective
            .get(&module)
            .cloned()
            .unwrap_or_default()
    }

    pub fn writing_rows(&self) -> Vec<WritingEvaluation> {
        self.inner.lock().unwrap().writing.clone()
    }

    pub async fn upsert_band_directly(&self, user_id: Uuid, exam_id: Uuid, module: Module, band: f64) {
        EvaluationStore::upsert_summary_band(self, user_id, exam_id, module, band, Utc::now())
            .await
            .expect("seed summary");
    }

    pub fn summary(&self, user_id: Uuid, exam_id: Uuid) -> Option<UserExamSummary> {
        self.inner
            .lock()
            .unwrap()
            .summaries
            .get(&(user_id, exam_id))
            .cloned()
    }
}

fn latest_of<T: Clone>(rows: impl Iterator<Item = T>, attempt: impl Fn(&T) -> i32) -> Option<T> {
    rows.max_by_key(|r| attempt(r))
}

#[async_trait]
impl EvaluationStore for MemoryStore {
    async fn answer_key(&self, module: Module, exam_id: Uuid) -> Result<Vec<AnswerKeyEntry>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .answer_keys
            .get(&(module, exam_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn latest_attempt_number(
        &self,
        module: Module,
        user_id: Uuid,
        exam_id: Uuid,
    ) -> Result<Option<i32>> {
        if self.hide_latest_attempt.load(Ordering::SeqCst) {
            return Ok(None);
        }
        let inner = self.inner.lock().unwrap();
        let latest = match module {
            Module::Writing => inner
                .writing
                .iter()
                .filter(|r| r.user_id == user_id && r.exam_id == exam_id)
                .map(|r| r.attempt_number)
                .max(),
            other => inner
                .objective
                .get(&other)
                .into_iter()
                .flatten()
                .filter(|r| r.user_id == user_id && r.exam_id == exam_id)
                .map(|r| r.attempt_number)
                .max(),
        };
        Ok(latest)
    }

    async fn insert_objective(
        &self,
        module: Module,
        record: &ObjectiveEvaluation,
    ) -> Result<ObjectiveEvaluation> {
        let mut inner = self.inner.lock().unwrap();
        let rows = inner.objective.entry(module).or_default();
        if rows.iter().any(|r| {
            r.user_id == record.user_id
                && r.exam_id == record.exam_id
                && r.attempt_number == record.attempt_number
        }) {
            return Err(Error::Conflict("duplicate attempt_number".to_string()));
        }
        rows.push(record.clone());
        Ok(record.clone())
    }

    async fn latest_objective(
        &self,
        module: Module,
        user_id: Uuid,
        exam_id: Uuid,
    ) -> Result<Option<ObjectiveEvaluation>> {
        let inner = self.inner.lock().unwrap();
        Ok(latest_of(
            inner
                .objective
                .get(&module)
                .into_iter()
                .flatten()
                .filter(|r| r.user_id == user_id && r.exam_id == exam_id)
                .cloned(),
            |r| r.attempt_number,
        ))
    }

    async fn insert_writing(&self, record: &WritingEvaluation) -> Result<WritingEvaluation> {
        let mut inner = self.inner.lock().unwrap();
        if inner.writing.iter().any(|r| {
            r.user_id == record.user_id
                && r.exam_id == record.exam_id
                && r.attempt_number == record.attempt_number
        }) {
            return Err(Error::Conflict("duplicate attempt_number".to_string()));
        }
        inner.writing.push(record.clone());
        Ok(record.clone())
    }

    async fn update_writing(&self, record: &WritingEvaluation) -> Result<WritingEvaluation> {
        let mut inner = self.inner.lock().unwrap();
        let row = inner
            .writing
            .iter_mut()
            .find(|r| {
                r.user_id == record.user_id
                    && r.exam_id == record.exam_id
                    && r.attempt_number == record.attempt_number
            })
            .ok_or_else(|| Error::NotFound("Resource not found".to_string()))?;
        row.task_1_band = record.task_1_band;
        row.task_2_band = record.task_2_band;
        row.overall_band = record.overall_band;
        row.task_1_feedback = record.task_1_feedback.clone();
        row.task_2_feedback = record.task_2_feedback.clone();
        row.task_1_rewrite = record.task_1_rewrite.clone();
        row.task_2_rewrite = record.task_2_rewrite.clone();
        row.evaluated_at = record.evaluated_at;
        Ok(row.clone())
    }

    async fn latest_writing(
        &self,
        user_id: Uuid,
        exam_id: Uuid,
    ) -> Result<Option<WritingEvaluation>> {
        let inner = self.inner.lock().unwrap();
        Ok(latest_of(
            inner
                .writing
                .iter()
                .filter(|r| r.user_id == user_id && r.exam_id == exam_id)
                .cloned(),
            |r| r.attempt_number,
        ))
    }

    async fn upsert_summary_band(
        &self,
        user_id: Uuid,
        exam_id: Uuid,
        module: Module,
        band: f64,
        at: DateTime<Utc>,
    ) -> Result<UserExamSummary> {
        if self.fail_summaries.load(Ordering::SeqCst) {
            return Err(Error::Internal("summary table unavailable".to_string()));
        }
        let mut inner = self.inner.lock().unwrap();
        let row = inner
            .summaries
            .entry((user_id, exam_id))
            .or_insert_with(|| UserExamSummary {
                user_id,
                exam_id,
                listening_band_score: None,
                reading_band_score: None,
                writing_band_score: None,
                speaking_band_score: None,
                last_attempt_at: at,
                updated_at: at,
            });
        let slot = match module {
            Module::Listening => &mut row.listening_band_score,
            Module::Reading => &mut row.reading_band_score,
            Module::Writing => &mut row.writing_band_score,
            Module::Speaking => &mut row.speaking_band_score,
        };
        *slot = Some(band);
        row.last_attempt_at = at;
        row.updated_at = at;
        Ok(row.clone())
    }

    async fn list_summaries(
        &self,
        user_id: Uuid,
        exam_id: Option<Uuid>,
    ) -> Result<Vec<UserExamSummary>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .summaries
            .values()
            .filter(|s| s.user_id == user_id && exam_id.map_or(true, |e| s.exam_id == e))
            .cloned()
            .collect())
    }
}

/// How the scripted generator answers a writing task.
#[derive(Debug, Clone)]
pub enum Reply {
    Band(f64),
    Error,
    Garbage,
    Hang,
}

pub struct ScriptedGenerator {
    task_1: Mutex<Reply>,
    task_2: Mutex<Reply>,
    pub calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new(task_1: Reply, task_2: Reply) -> Self {
        Self {
            task_1: Mutex::new(task_1),
            task_2: Mutex::new(task_2),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, task_1: Reply, task_2: Reply) {
        *self.task_1.lock().unwrap() = task_1;
        *self.task_2.lock().unwrap() = task_2;
    }
}

pub fn rubric_reply(band: f64) -> JsonValue {
    json!({
        "band": band,
        "feedback": {
            "task_response": format!("Task response feedback for band {}", band),
            "coherence_cohesion": "Clear progression.",
            "grammatical_accuracy": "Minor slips.",
            "lexical_resource": "Adequate range."
        },
        "improved_response": format!("Improved response at band {}", band)
    })
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate_json(&self, request: GenerationRequest) -> Result<JsonValue> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = if request.user.contains("IELTS Writing Task 1") {
            self.task_1.lock().unwrap().clone()
        } else {
            self.task_2.lock().unwrap().clone()
        };
        match reply {
            Reply::Band(band) => Ok(rubric_reply(band)),
            Reply::Error => Err(Error::Internal("upstream unavailable".to_string())),
            Reply::Garbage => Ok(json!({ "score": "high" })),
            Reply::Hang => std::future::pending::<Result<JsonValue>>().await,
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub generator: Arc<ScriptedGenerator>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_generator(ScriptedGenerator::new(Reply::Band(6.0), Reply::Band(7.0)))
    }

    pub fn with_generator(generator: ScriptedGenerator) -> Self {
        let store = Arc::new(MemoryStore::default());
        let generator = Arc::new(generator);
        let state = AppState::new(test_config(), store.clone(), generator.clone());
        Self {
            router: routes::create_router(state),
            store,
            generator,
        }
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<JsonValue>,
    ) -> (StatusCode, JsonValue) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let resp = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
        let json = if bytes.is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null)
        };
        (status, json)
    }
}

/// A 40-question key whose answers are `answer-1` .. `answer-40`.
pub fn full_answer_key() -> Vec<AnswerKeyEntry> {
    (1..=40)
        .map(|n| AnswerKeyEntry {
            question_number: n,
            correct_answer: Some(format!("answer-{}", n)),
        })
        .collect()
}

/// Responses answering the first `correct` questions of [`full_answer_key`]
/// correctly and the rest wrongly.
pub fn responses_with_correct(correct: i32) -> JsonValue {
    let map: serde_json::Map<String, JsonValue> = (1..=40)
        .map(|n| {
            let answer = if n <= correct {
                format!("ANSWER-{} ", n)
            } else {
                "wrong".to_string()
            };
            (n.to_string(), JsonValue::String(answer))
        })
        .collect();
    JsonValue::Object(map)
}
