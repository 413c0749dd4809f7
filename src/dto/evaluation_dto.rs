use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::evaluation::{Responses, WritingEvaluation};

/// Success envelope shared by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListeningEvaluationRequest {
    /// Accepted for older clients; must match the authenticated user.
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub responses: Responses,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingEvaluationRequest {
    pub user_id: Option<Uuid>,
    pub exam_type: Option<String>,
    #[serde(default)]
    pub responses: Responses,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WritingEvaluationRequest {
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "task_1_question is required"))]
    pub task_1_question: String,
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "task_2_question is required"))]
    pub task_2_question: String,
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "task_1_answer is required"))]
    pub task_1_answer: String,
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "task_2_answer is required"))]
    pub task_2_answer: String,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WritingSubmissionResponse {
    pub success: bool,
    pub attempt_number: i32,
}

/// Stored writing attempt plus whether any task still carries the
/// evaluation-failed placeholder.
#[derive(Debug, Clone, Serialize)]
pub struct WritingEvaluationView {
    #[serde(flatten)]
    pub evaluation: WritingEvaluation,
    pub needs_reevaluation: bool,
}

impl From<WritingEvaluation> for WritingEvaluationView {
    fn from(evaluation: WritingEvaluation) -> Self {
        let needs_reevaluation = evaluation.needs_reevaluation();
        Self {
            evaluation,
            needs_reevaluation,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryQuery {
    #[serde(rename = "examId")]
    pub exam_id: Option<Uuid>,
}
