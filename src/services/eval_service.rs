use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::models::evaluation::TaskEvaluation;
use crate::services::ai_service::{GenerationRequest, TextGenerator};

const SYSTEM_PROMPT: &str = r#"You are a strict, experienced IELTS Writing examiner.
Assess the candidate's response against the official public band descriptors:
Task Response (Task Achievement for Task 1), Coherence and Cohesion,
Lexical Resource, and Grammatical Range and Accuracy.

For every criterion, point at concrete mistakes or weaknesses in the response
instead of giving generic advice. Then assign one band score between 0 and 9
in steps of 0.5, and rewrite the response so it would score higher. Separate
paragraphs of the rewrite with \n\n.

Reply with a single JSON object and nothing else: no markdown, no code fences,
no commentary."#;

/// Writing task number, 1 or 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritingTask {
    One,
    Two,
}

impl WritingTask {
    pub fn number(&self) -> u8 {
        match self {
            WritingTask::One => 1,
            WritingTask::Two => 2,
        }
    }
}

#[derive(Clone)]
pub struct EvalService {
    generator: Arc<dyn TextGenerator>,
    temperature: f32,
    timeout: Duration,
}

impl EvalService {
    pub fn new(generator: Arc<dyn TextGenerator>, temperature: f32, timeout: Duration) -> Self {
        Self {
            generator,
            temperature,
            timeout,
        }
    }

    /// Scores one writing task. Every failure (generator error, timeout,
    /// unparsable or incomplete reply, band out of range) is reported as
    /// [`Error::EvaluationFailed`].
    pub async fn evaluate_task(
        &self,
        task: WritingTask,
        question: &str,
        answer: &str,
    ) -> Result<TaskEvaluation> {
        let request = self.build_request(task, question, answer);

        let reply = tokio::time::timeout(self.timeout, self.generator.generate_json(request))
            .await
            .map_err(|_| {
                Error::EvaluationFailed(format!(
                    "Task {} evaluation timed out after {:?}",
                    task.number(),
                    self.timeout
                ))
            })?
            .map_err(|e| match e {
                Error::EvaluationFailed(msg) => Error::EvaluationFailed(msg),
                other => Error::EvaluationFailed(other.to_string()),
            })?;

        parse_task_evaluation(reply)
    }

    /// Like [`evaluate_task`](Self::evaluate_task) but never fails: the
    /// placeholder evaluation stands in for the task when scoring fails.
    pub async fn evaluate_task_or_placeholder(
        &self,
        task: WritingTask,
        question: &str,
        answer: &str,
    ) -> TaskEvaluation {
        match self.evaluate_task(task, question, answer).await {
            Ok(evaluation) => evaluation,
            Err(e) => {
                tracing::warn!(task = task.number(), error = %e, "Writing task evaluation failed, using placeholder");
                TaskEvaluation::placeholder(answer)
            }
        }
    }

    fn build_request(&self, task: WritingTask, question: &str, answer: &str) -> GenerationRequest {
        let user = serde_json::json!({
            "task": format!("IELTS Writing Task {}", task.number()),
            "question": question,
            "candidate_response": answer,
            "schema": {
                "type": "object",
                "required": ["band", "feedback", "improved_response"],
                "properties": {
                    "band": {"type": "number", "minimum": 0, "maximum": 9},
                    "feedback": {
                        "type": "object",
                        "required": [
                            "task_response",
                            "coherence_cohesion",
                            "grammatical_accuracy",
                            "lexical_resource"
                        ],
                        "properties": {
                            "task_response": {"type": "string"},
                            "coherence_cohesion": {"type": "string"},
                            "grammatical_accuracy": {"type": "string"},
                            "lexical_resource": {"type": "string"}
                        }
                    },
                    "improved_response": {"type": "string"}
                }
            }
        });

        GenerationRequest {
            system: SYSTEM_PROMPT.to_string(),
            user: user.to_string(),
            temperature: self.temperature,
        }
    }
}

/// Strict decoding of the model reply: all fields present with the right
/// types and a finite band within 0..=9.
pub fn parse_task_evaluation(reply: JsonValue) -> Result<TaskEvaluation> {
    let evaluation: TaskEvaluation = serde_json::from_value(reply)
        .map_err(|e| Error::EvaluationFailed(format!("Malformed evaluation: {}", e)))?;

    if !evaluation.band.is_finite() || !(0.0..=9.0).contains(&evaluation.band) {
        return Err(Error::EvaluationFailed(format!(
            "Band {} is outside 0-9",
            evaluation.band
        )));
    }

    Ok(evaluation)
}
