use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The part of a listening/reading question the grader needs.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AnswerKeyEntry {
    pub question_number: i32,
    pub correct_answer: Option<String>,
}

impl AnswerKeyEntry {
    pub fn new(question_number: i32, correct_answer: Option<&str>) -> Self {
        Self {
            question_number,
            correct_answer: correct_answer.map(str::to_string),
        }
    }
}
