use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::database::store::{EvaluationRecord, EvaluationStore};
use crate::dto::evaluation_dto::WritingEvaluationRequest;
use crate::error::{Error, Result};
use crate::models::evaluation::{
    ListeningEvaluation, Module, ObjectiveEvaluation, ReadingEvaluation, Responses,
    TaskEvaluation, WritingEvaluation,
};
use crate::models::exam::ExamType;
use crate::services::attempt_service::AttemptService;
use crate::services::eval_service::{EvalService, WritingTask};
use crate::services::grading_service::GradingService;
use crate::services::score_tables::objective_band;
use crate::services::summary_service::SummaryService;

/// Module-specific half of an evaluation: how a submission becomes a stored
/// record and how that record gets its final scores.
#[async_trait]
pub trait ScoringStrategy: Send + Sync + 'static {
    type Submission: Send + Sync + 'static;
    type Record: EvaluationRecord;

    fn module(&self) -> Module;

    fn validate(&self, _submission: &Self::Submission) -> Result<()> {
        Ok(())
    }

    /// Builds the row to insert. The attempt number is assigned afterwards.
    async fn draft(
        &self,
        store: &dyn EvaluationStore,
        user_id: Uuid,
        exam_id: Uuid,
        submission: Self::Submission,
    ) -> Result<Self::Record>;

    /// Runs after the row exists. Returns the record as finally stored.
    async fn finalize(
        &self,
        _store: &dyn EvaluationStore,
        record: Self::Record,
    ) -> Result<Self::Record> {
        Ok(record)
    }
}

pub struct ObjectiveSubmission {
    pub responses: Responses,
    /// Reading only.
    pub exam_type: Option<ExamType>,
}

/// Listening and Reading: grade against the answer key, convert with the
/// module's band table.
#[derive(Clone)]
pub struct ObjectiveStrategy {
    module: Module,
}

impl ObjectiveStrategy {
    pub fn listening() -> Self {
        Self {
            module: Module::Listening,
        }
    }

    pub fn reading() -> Self {
        Self {
            module: Module::Reading,
        }
    }
}

#[async_trait]
impl ScoringStrategy for ObjectiveStrategy {
    type Submission = ObjectiveSubmission;
    type Record = ObjectiveEvaluation;

    fn module(&self) -> Module {
        self.module
    }

    async fn draft(
        &self,
        store: &dyn EvaluationStore,
        user_id: Uuid,
        exam_id: Uuid,
        submission: ObjectiveSubmission,
    ) -> Result<ObjectiveEvaluation> {
        let ObjectiveSubmission {
            mut responses,
            exam_type,
        } = submission;

        let answer_key = store.answer_key(self.module, exam_id).await?;
        if answer_key.is_empty() {
            tracing::warn!(module = %self.module, exam_id = %exam_id, "No answer key found, scoring zero correct");
        }
        GradingService::complete_responses(&answer_key, &mut responses);
        let correct = GradingService::count_correct(&answer_key, &responses)?;
        let band = objective_band(self.module, exam_type, correct)?;

        let exam_type = exam_type.map(|t| t.as_str().to_string());

        Ok(ObjectiveEvaluation::new(
            user_id, exam_id, responses, correct, band, exam_type,
        ))
    }
}

/// Writing: persist the answers with placeholder scores, then score both
/// tasks with the rubric evaluator and update the row in place.
#[derive(Clone)]
pub struct WritingStrategy {
    evaluator: EvalService,
}

impl WritingStrategy {
    pub fn new(evaluator: EvalService) -> Self {
        Self { evaluator }
    }
}

#[async_trait]
impl ScoringStrategy for WritingStrategy {
    type Submission = WritingEvaluationRequest;
    type Record = WritingEvaluation;

    fn module(&self) -> Module {
        Module::Writing
    }

    fn validate(&self, submission: &WritingEvaluationRequest) -> Result<()> {
        submission.validate()?;
        Ok(())
    }

    async fn draft(
        &self,
        _store: &dyn EvaluationStore,
        user_id: Uuid,
        exam_id: Uuid,
        submission: WritingEvaluationRequest,
    ) -> Result<WritingEvaluation> {
        Ok(WritingEvaluation::placeholder(
            user_id,
            exam_id,
            submission.task_1_question,
            submission.task_2_question,
            submission.task_1_answer,
            submission.task_2_answer,
        ))
    }

    async fn finalize(
        &self,
        store: &dyn EvaluationStore,
        mut record: WritingEvaluation,
    ) -> Result<WritingEvaluation> {
        let (task_1, task_2) = tokio::join!(
            self.evaluator.evaluate_task_or_placeholder(
                WritingTask::One,
                &record.task_1_question,
                &record.task_1_answer,
            ),
            self.evaluator.evaluate_task_or_placeholder(
                WritingTask::Two,
                &record.task_2_question,
                &record.task_2_answer,
            ),
        );

        record.apply(task_1, task_2);
        store.update_writing(&record).await
    }
}

impl WritingStrategy {
    /// Scores again only the tasks still holding the placeholder; a task that
    /// already has a real evaluation keeps it.
    async fn rescore_failed(
        &self,
        store: &dyn EvaluationStore,
        mut record: WritingEvaluation,
    ) -> Result<WritingEvaluation> {
        if !record.needs_reevaluation() {
            return Ok(record);
        }

        let (task_1, task_2) = tokio::join!(
            self.rescore_task(
                WritingTask::One,
                &record.task_1_question,
                &record.task_1_answer,
                record.task_1(),
            ),
            self.rescore_task(
                WritingTask::Two,
                &record.task_2_question,
                &record.task_2_answer,
                record.task_2(),
            ),
        );

        record.apply(task_1, task_2);
        store.update_writing(&record).await
    }

    async fn rescore_task(
        &self,
        task: WritingTask,
        question: &str,
        answer: &str,
        stored: TaskEvaluation,
    ) -> TaskEvaluation {
        if !stored.is_placeholder() {
            return stored;
        }
        self.evaluator
            .evaluate_task_or_placeholder(task, question, answer)
            .await
    }
}

/// The evaluate-and-persist flow shared by every module.
#[derive(Clone)]
pub struct EvaluationRecordManager<S: ScoringStrategy> {
    strategy: S,
    store: Arc<dyn EvaluationStore>,
    attempts: AttemptService,
    summaries: SummaryService,
}

impl<S: ScoringStrategy> EvaluationRecordManager<S> {
    pub fn new(strategy: S, store: Arc<dyn EvaluationStore>, summaries: SummaryService) -> Self {
        Self {
            strategy,
            attempts: AttemptService::new(store.clone()),
            store,
            summaries,
        }
    }

    pub async fn submit(
        &self,
        user_id: Uuid,
        exam_id: Uuid,
        submission: S::Submission,
    ) -> Result<S::Record> {
        self.strategy.validate(&submission)?;
        let module = self.strategy.module();

        let draft = self
            .strategy
            .draft(self.store.as_ref(), user_id, exam_id, submission)
            .await?;
        let stored = self.attempts.insert_next(module, draft).await?;
        tracing::info!(
            module = %module,
            user_id = %user_id,
            exam_id = %exam_id,
            attempt_number = stored.attempt_number(),
            "Evaluation recorded"
        );

        let finished = self.strategy.finalize(self.store.as_ref(), stored).await?;
        tracing::info!(
            module = %module,
            user_id = %user_id,
            exam_id = %exam_id,
            attempt_number = finished.attempt_number(),
            band = finished.summary_band(),
            "Evaluation scored"
        );

        self.summaries
            .upsert_summary(user_id, exam_id, module, finished.summary_band())
            .await;
        Ok(finished)
    }

    /// Latest attempt for `(user_id, exam_id)`. Having no attempt yet is the
    /// ordinary `NotFound` outcome.
    pub async fn latest(&self, user_id: Uuid, exam_id: Uuid) -> Result<S::Record> {
        S::Record::latest(self.store.as_ref(), self.strategy.module(), user_id, exam_id)
            .await?
            .ok_or_else(|| Error::NotFound("Evaluation not found".to_string()))
    }
}

impl EvaluationRecordManager<WritingStrategy> {
    /// Retries evaluation of the latest writing attempt in place. Only tasks
    /// whose previous evaluation failed are sent to the evaluator again.
    pub async fn reevaluate_latest(&self, user_id: Uuid, exam_id: Uuid) -> Result<WritingEvaluation> {
        let record = self.latest(user_id, exam_id).await?;
        let attempt_number = record.attempt_number;
        let finished = self
            .strategy
            .rescore_failed(self.store.as_ref(), record)
            .await?;
        tracing::info!(
            user_id = %user_id,
            exam_id = %exam_id,
            attempt_number,
            band = finished.overall_band,
            "Writing attempt re-evaluated"
        );
        self.summaries
            .upsert_summary(user_id, exam_id, Module::Writing, finished.overall_band)
            .await;
        Ok(finished)
    }
}

pub type ObjectiveEvaluationManager = EvaluationRecordManager<ObjectiveStrategy>;
pub type WritingEvaluationManager = EvaluationRecordManager<WritingStrategy>;

/// Per-module entry points used by the HTTP handlers.
#[derive(Clone)]
pub struct EvaluationService {
    listening: ObjectiveEvaluationManager,
    reading: ObjectiveEvaluationManager,
    writing: WritingEvaluationManager,
}

impl EvaluationService {
    pub fn new(
        store: Arc<dyn EvaluationStore>,
        evaluator: EvalService,
        summaries: SummaryService,
    ) -> Self {
        Self {
            listening: EvaluationRecordManager::new(
                ObjectiveStrategy::listening(),
                store.clone(),
                summaries.clone(),
            ),
            reading: EvaluationRecordManager::new(
                ObjectiveStrategy::reading(),
                store.clone(),
                summaries.clone(),
            ),
            writing: EvaluationRecordManager::new(WritingStrategy::new(evaluator), store, summaries),
        }
    }

    pub async fn submit_listening(
        &self,
        user_id: Uuid,
        exam_id: Uuid,
        responses: Responses,
    ) -> Result<ListeningEvaluation> {
        let submission = ObjectiveSubmission {
            responses,
            exam_type: None,
        };
        self.listening.submit(user_id, exam_id, submission).await
    }

    pub async fn submit_reading(
        &self,
        user_id: Uuid,
        exam_id: Uuid,
        exam_type: ExamType,
        responses: Responses,
    ) -> Result<ReadingEvaluation> {
        let submission = ObjectiveSubmission {
            responses,
            exam_type: Some(exam_type),
        };
        self.reading.submit(user_id, exam_id, submission).await
    }

    pub async fn submit_writing(
        &self,
        user_id: Uuid,
        exam_id: Uuid,
        request: WritingEvaluationRequest,
    ) -> Result<WritingEvaluation> {
        self.writing.submit(user_id, exam_id, request).await
    }

    pub async fn reevaluate_writing(&self, user_id: Uuid, exam_id: Uuid) -> Result<WritingEvaluation> {
        self.writing.reevaluate_latest(user_id, exam_id).await
    }

    pub async fn latest_listening(&self, user_id: Uuid, exam_id: Uuid) -> Result<ListeningEvaluation> {
        self.listening.latest(user_id, exam_id).await
    }

    pub async fn latest_reading(&self, user_id: Uuid, exam_id: Uuid) -> Result<ReadingEvaluation> {
        self.reading.latest(user_id, exam_id).await
    }

    pub async fn latest_writing(&self, user_id: Uuid, exam_id: Uuid) -> Result<WritingEvaluation> {
        self.writing.latest(user_id, exam_id).await
    }
}
