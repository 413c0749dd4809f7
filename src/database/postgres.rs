use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::store::EvaluationStore;
use crate::error::{Error, Result};
use crate::models::evaluation::{Module, ObjectiveEvaluation, WritingEvaluation};
use crate::models::question::AnswerKeyEntry;
use crate::models::summary::{band_column, UserExamSummary};

#[derive(Clone)]
pub struct PgEvaluationStore {
    pool: PgPool,
}

impl PgEvaluationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn questions_table(module: Module) -> Result<&'static str> {
    match module {
        Module::Listening => Ok("listening_questions"),
        Module::Reading => Ok("reading_questions"),
        other => Err(Error::Internal(format!("{} has no answer key", other))),
    }
}

fn evaluations_table(module: Module) -> Result<&'static str> {
    match module {
        Module::Listening => Ok("listening_evaluations"),
        Module::Reading => Ok("reading_evaluations"),
        Module::Writing => Ok("writing_evaluations"),
        Module::Speaking => Err(Error::Internal("speaking is not scored".to_string())),
    }
}

fn objective_table(module: Module) -> Result<&'static str> {
    match module {
        Module::Listening | Module::Reading => evaluations_table(module),
        other => Err(Error::Internal(format!(
            "{} is not an objectively graded module",
            other
        ))),
    }
}

#[async_trait]
impl EvaluationStore for PgEvaluationStore {
    async fn answer_key(&self, module: Module, exam_id: Uuid) -> Result<Vec<AnswerKeyEntry>> {
        let sql = format!(
            "SELECT question_number, correct_answer FROM {} WHERE exam_id = $1 ORDER BY question_number",
            questions_table(module)?
        );
        let rows = sqlx::query_as::<_, AnswerKeyEntry>(&sql)
            .bind(exam_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn latest_attempt_number(
        &self,
        module: Module,
        user_id: Uuid,
        exam_id: Uuid,
    ) -> Result<Option<i32>> {
        let sql = format!(
            "SELECT attempt_number FROM {} WHERE user_id = $1 AND exam_id = $2 ORDER BY attempt_number DESC LIMIT 1",
            evaluations_table(module)?
        );
        let latest: Option<i32> = sqlx::query_scalar(&sql)
            .bind(user_id)
            .bind(exam_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(latest)
    }

    async fn insert_objective(
        &self,
        module: Module,
        record: &ObjectiveEvaluation,
    ) -> Result<ObjectiveEvaluation> {
        let sql = format!(
            r#"
            INSERT INTO {} (
                id, user_id, exam_id, attempt_number, responses,
                correct_count, band_score, exam_type, submitted_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
            objective_table(module)?
        );
        let inserted = sqlx::query_as::<_, ObjectiveEvaluation>(&sql)
            .bind(record.id)
            .bind(record.user_id)
            .bind(record.exam_id)
            .bind(record.attempt_number)
            .bind(&record.responses)
            .bind(record.correct_count)
            .bind(record.band_score)
            .bind(&record.exam_type)
            .bind(record.submitted_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(inserted)
    }

    async fn latest_objective(
        &self,
        module: Module,
        user_id: Uuid,
        exam_id: Uuid,
    ) -> Result<Option<ObjectiveEvaluation>> {
        let sql = format!(
            "SELECT * FROM {} WHERE user_id = $1 AND exam_id = $2 ORDER BY attempt_number DESC LIMIT 1",
            objective_table(module)?
        );
        let row = sqlx::query_as::<_, ObjectiveEvaluation>(&sql)
            .bind(user_id)
            .bind(exam_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert_writing(&self, record: &WritingEvaluation) -> Result<WritingEvaluation> {
        let inserted = sqlx::query_as::<_, WritingEvaluation>(
            r#"
            INSERT INTO writing_evaluations (
                id, user_id, exam_id, attempt_number,
                task_1_question, task_2_question, task_1_answer, task_2_answer,
                task_1_band, task_2_band, overall_band,
                task_1_feedback, task_2_feedback, task_1_rewrite, task_2_rewrite,
                submitted_at, evaluated_at
            ) VALUES (
                $1, $2, $3, $4,
                $5, $6, $7, $8,
                $9, $10, $11,
                $12, $13, $14, $15,
                $16, $17
            )
            RETURNING *
            "#,
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(record.exam_id)
        .bind(record.attempt_number)
        .bind(&record.task_1_question)
        .bind(&record.task_2_question)
        .bind(&record.task_1_answer)
        .bind(&record.task_2_answer)
        .bind(record.task_1_band)
        .bind(record.task_2_band)
        .bind(record.overall_band)
        .bind(&record.task_1_feedback)
        .bind(&record.task_2_feedback)
        .bind(&record.task_1_rewrite)
        .bind(&record.task_2_rewrite)
        .bind(record.submitted_at)
        .bind(record.evaluated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(inserted)
    }

    async fn update_writing(&self, record: &WritingEvaluation) -> Result<WritingEvaluation> {
        let updated = sqlx::query_as::<_, WritingEvaluation>(
            r#"
            UPDATE writing_evaluations
            SET task_1_band = $4, task_2_band = $5, overall_band = $6,
                task_1_feedback = $7, task_2_feedback = $8,
                task_1_rewrite = $9, task_2_rewrite = $10,
                evaluated_at = $11
            WHERE user_id = $1 AND exam_id = $2 AND attempt_number = $3
            RETURNING *
            "#,
        )
        .bind(record.user_id)
        .bind(record.exam_id)
        .bind(record.attempt_number)
        .bind(record.task_1_band)
        .bind(record.task_2_band)
        .bind(record.overall_band)
        .bind(&record.task_1_feedback)
        .bind(&record.task_2_feedback)
        .bind(&record.task_1_rewrite)
        .bind(&record.task_2_rewrite)
        .bind(record.evaluated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn latest_writing(
        &self,
        user_id: Uuid,
        exam_id: Uuid,
    ) -> Result<Option<WritingEvaluation>> {
        let row = sqlx::query_as::<_, WritingEvaluation>(
            r#"SELECT * FROM writing_evaluations
               WHERE user_id = $1 AND exam_id = $2
               ORDER BY attempt_number DESC LIMIT 1"#,
        )
        .bind(user_id)
        .bind(exam_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn upsert_summary_band(
        &self,
        user_id: Uuid,
        exam_id: Uuid,
        module: Module,
        band: f64,
        at: DateTime<Utc>,
    ) -> Result<UserExamSummary> {
        let column = band_column(module);
        let sql = format!(
            r#"
            INSERT INTO user_exam_summary (user_id, exam_id, {column}, last_attempt_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            ON CONFLICT (user_id, exam_id) DO UPDATE
            SET {column} = EXCLUDED.{column},
                last_attempt_at = EXCLUDED.last_attempt_at,
                updated_at = EXCLUDED.updated_at
            RETURNING *
            "#
        );
        let summary = sqlx::query_as::<_, UserExamSummary>(&sql)
            .bind(user_id)
            .bind(exam_id)
            .bind(band)
            .bind(at)
            .fetch_one(&self.pool)
            .await?;
        Ok(summary)
    }

    async fn list_summaries(
        &self,
        user_id: Uuid,
        exam_id: Option<Uuid>,
    ) -> Result<Vec<UserExamSummary>> {
        let rows = sqlx::query_as::<_, UserExamSummary>(
            r#"SELECT * FROM user_exam_summary
               WHERE user_id = $1 AND ($2::uuid IS NULL OR exam_id = $2)
               ORDER BY updated_at DESC"#,
        )
        .bind(user_id)
        .bind(exam_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
