//! Storage seam for evaluation records and exam summaries.
//!
//! Every call is independent; implementations are not expected to offer
//! transactions spanning several calls. Inserting an evaluation whose
//! `(user_id, exam_id, attempt_number)` already exists must fail with
//! [`Error::Conflict`](crate::error::Error::Conflict) so the attempt
//! sequencer can pick the next number.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::Result;
use crate::models::evaluation::{Module, ObjectiveEvaluation, WritingEvaluation};
use crate::models::question::AnswerKeyEntry;
use crate::models::summary::UserExamSummary;

#[async_trait]
pub trait EvaluationStore: Send + Sync {
    /// Answer key for an objective module (listening or reading).
    async fn answer_key(&self, module: Module, exam_id: Uuid) -> Result<Vec<AnswerKeyEntry>>;

    /// Highest attempt number recorded for `(user_id, exam_id)` in the module's table.
    async fn latest_attempt_number(
        &self,
        module: Module,
        user_id: Uuid,
        exam_id: Uuid,
    ) -> Result<Option<i32>>;

    async fn insert_objective(
        &self,
        module: Module,
        record: &ObjectiveEvaluation,
    ) -> Result<ObjectiveEvaluation>;

    async fn latest_objective(
        &self,
        module: Module,
        user_id: Uuid,
        exam_id: Uuid,
    ) -> Result<Option<ObjectiveEvaluation>>;

    async fn insert_writing(&self, record: &WritingEvaluation) -> Result<WritingEvaluation>;

    /// Overwrites the scoring columns of an existing attempt in place.
    async fn update_writing(&self, record: &WritingEvaluation) -> Result<WritingEvaluation>;

    async fn latest_writing(&self, user_id: Uuid, exam_id: Uuid)
        -> Result<Option<WritingEvaluation>>;

    /// Sets a single module's band plus the timestamps, creating the row if absent.
    async fn upsert_summary_band(
        &self,
        user_id: Uuid,
        exam_id: Uuid,
        module: Module,
        band: f64,
        at: DateTime<Utc>,
    ) -> Result<UserExamSummary>;

    async fn list_summaries(
        &self,
        user_id: Uuid,
        exam_id: Option<Uuid>,
    ) -> Result<Vec<UserExamSummary>>;
}

/// A persisted evaluation row that the generic record manager can sequence,
/// insert and fetch without knowing which module table it lives in.
#[async_trait]
pub trait EvaluationRecord: Serialize + Clone + Send + Sync + 'static {
    fn attempt_number(&self) -> i32;

    fn set_attempt_number(&mut self, attempt_number: i32);

    fn user_id(&self) -> Uuid;

    fn exam_id(&self) -> Uuid;

    /// Band written to the module's summary column.
    fn summary_band(&self) -> f64;

    async fn insert(store: &dyn EvaluationStore, module: Module, record: &Self) -> Result<Self>;

    async fn latest(
        store: &dyn EvaluationStore,
        module: Module,
        user_id: Uuid,
        exam_id: Uuid,
    ) -> Result<Option<Self>>;
}

#[async_trait]
impl EvaluationRecord for ObjectiveEvaluation {
    fn attempt_number(&self) -> i32 {
        self.attempt_number
    }

    fn set_attempt_number(&mut self, attempt_number: i32) {
        self.attempt_number = attempt_number;
    }

    fn user_id(&self) -> Uuid {
        self.user_id
    }

    fn exam_id(&self) -> Uuid {
        self.exam_id
    }

    fn summary_band(&self) -> f64 {
        self.band_score
    }

    async fn insert(store: &dyn EvaluationStore, module: Module, record: &Self) -> Result<Self> {
        store.insert_objective(module, record).await
    }

    async fn latest(
        store: &dyn EvaluationStore,
        module: Module,
        user_id: Uuid,
        exam_id: Uuid,
    ) -> Result<Option<Self>> {
        store.latest_objective(module, user_id, exam_id).await
    }
}

#[async_trait]
impl EvaluationRecord for WritingEvaluation {
    fn attempt_number(&self) -> i32 {
        self.attempt_number
    }

    fn set_attempt_number(&mut self, attempt_number: i32) {
        self.attempt_number = attempt_number;
    }

    fn user_id(&self) -> Uuid {
        self.user_id
    }

    fn exam_id(&self) -> Uuid {
        self.exam_id
    }

    fn summary_band(&self) -> f64 {
        self.overall_band
    }

    async fn insert(store: &dyn EvaluationStore, _module: Module, record: &Self) -> Result<Self> {
        store.insert_writing(record).await
    }

    async fn latest(
        store: &dyn EvaluationStore,
        _module: Module,
        user_id: Uuid,
        exam_id: Uuid,
    ) -> Result<Option<Self>> {
        store.latest_writing(user_id, exam_id).await
    }
}
