use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::services::score_tables::writing_overall_band;

/// Candidate answers keyed by question number rendered as a string.
pub type Responses = BTreeMap<String, String>;

pub const EVALUATION_FAILED_FEEDBACK: &str = "Evaluation failed due to technical error.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    Listening,
    Reading,
    Writing,
    Speaking,
}

impl Module {
    pub fn as_str(&self) -> &'static str {
        match self {
            Module::Listening => "listening",
            Module::Reading => "reading",
            Module::Writing => "writing",
            Module::Speaking => "speaking",
        }
    }
}

impl std::fmt::Display for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scored Listening or Reading attempt.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ObjectiveEvaluation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub exam_id: Uuid,
    pub attempt_number: i32,
    pub responses: Json<Responses>,
    pub correct_count: i32,
    pub band_score: f64,
    pub exam_type: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

pub type ListeningEvaluation = ObjectiveEvaluation;
pub type ReadingEvaluation = ObjectiveEvaluation;

impl ObjectiveEvaluation {
    pub fn new(
        user_id: Uuid,
        exam_id: Uuid,
        responses: Responses,
        correct_count: u32,
        band_score: f64,
        exam_type: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            exam_id,
            attempt_number: 1,
            responses: Json(responses),
            correct_count: correct_count as i32,
            band_score,
            exam_type,
            submitted_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskFeedback {
    pub task_response: String,
    pub coherence_cohesion: String,
    pub grammatical_accuracy: String,
    pub lexical_resource: String,
}

impl TaskFeedback {
    pub fn failed() -> Self {
        Self {
            task_response: EVALUATION_FAILED_FEEDBACK.to_string(),
            coherence_cohesion: EVALUATION_FAILED_FEEDBACK.to_string(),
            grammatical_accuracy: EVALUATION_FAILED_FEEDBACK.to_string(),
            lexical_resource: EVALUATION_FAILED_FEEDBACK.to_string(),
        }
    }

    pub fn is_failed(&self) -> bool {
        self == &Self::failed()
    }
}

/// Rubric result for a single writing task, as returned by the evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEvaluation {
    pub band: f64,
    pub feedback: TaskFeedback,
    pub improved_response: String,
}

impl TaskEvaluation {
    /// Stand-in used when the rubric call fails: band 0, sentinel feedback,
    /// and the candidate's own answer as the rewrite.
    pub fn placeholder(answer: &str) -> Self {
        Self {
            band: 0.0,
            feedback: TaskFeedback::failed(),
            improved_response: answer.to_string(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.band == 0.0 && self.feedback.is_failed()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WritingEvaluation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub exam_id: Uuid,
    pub attempt_number: i32,
    pub task_1_question: String,
    pub task_2_question: String,
    pub task_1_answer: String,
    pub task_2_answer: String,
    pub task_1_band: f64,
    pub task_2_band: f64,
    pub overall_band: f64,
    pub task_1_feedback: Json<TaskFeedback>,
    pub task_2_feedback: Json<TaskFeedback>,
    pub task_1_rewrite: String,
    pub task_2_rewrite: String,
    pub submitted_at: DateTime<Utc>,
    pub evaluated_at: Option<DateTime<Utc>>,
}

impl WritingEvaluation {
    /// Row persisted before any rubric call is made, so the candidate's text
    /// survives even if evaluation never completes.
    pub fn placeholder(
        user_id: Uuid,
        exam_id: Uuid,
        task_1_question: String,
        task_2_question: String,
        task_1_answer: String,
        task_2_answer: String,
    ) -> Self {
        let task_1 = TaskEvaluation::placeholder(&task_1_answer);
        let task_2 = TaskEvaluation::placeholder(&task_2_answer);
        Self {
            id: Uuid::new_v4(),
            user_id,
            exam_id,
            attempt_number: 1,
            task_1_question,
            task_2_question,
            task_1_answer,
            task_2_answer,
            task_1_band: task_1.band,
            task_2_band: task_2.band,
            overall_band: 0.0,
            task_1_feedback: Json(task_1.feedback),
            task_2_feedback: Json(task_2.feedback),
            task_1_rewrite: task_1.improved_response,
            task_2_rewrite: task_2.improved_response,
            submitted_at: Utc::now(),
            evaluated_at: None,
        }
    }

    pub fn apply(&mut self, task_1: TaskEvaluation, task_2: TaskEvaluation) {
        self.overall_band = writing_overall_band(task_1.band, task_2.band);
        self.task_1_band = task_1.band;
        self.task_2_band = task_2.band;
        self.task_1_feedback = Json(task_1.feedback);
        self.task_2_feedback = Json(task_2.feedback);
        self.task_1_rewrite = task_1.improved_response;
        self.task_2_rewrite = task_2.improved_response;
        self.evaluated_at = Some(Utc::now());
    }

    /// Stored result for task 1, as it was last scored.
    pub fn task_1(&self) -> TaskEvaluation {
        TaskEvaluation {
            band: self.task_1_band,
            feedback: self.task_1_feedback.0.clone(),
            improved_response: self.task_1_rewrite.clone(),
        }
    }

    pub fn task_2(&self) -> TaskEvaluation {
        TaskEvaluation {
            band: self.task_2_band,
            feedback: self.task_2_feedback.0.clone(),
            improved_response: self.task_2_rewrite.clone(),
        }
    }

    pub fn needs_reevaluation(&self) -> bool {
        self.task_1().is_placeholder() || self.task_2().is_placeholder()
    }
}
