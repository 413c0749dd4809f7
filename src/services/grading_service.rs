use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::models::evaluation::Responses;
use crate::models::question::AnswerKeyEntry;

pub struct GradingService;

impl GradingService {
    /// Counts responses that match the answer key, ignoring case and
    /// surrounding whitespace. Questions without a correct answer are not
    /// auto-gradable and are skipped; missing or blank responses are wrong.
    pub fn count_correct(answer_key: &[AnswerKeyEntry], responses: &Responses) -> Result<u32> {
        let mut seen: HashSet<i32> = HashSet::with_capacity(answer_key.len());
        let mut correct: u32 = 0;

        for entry in answer_key {
            if entry.question_number <= 0 {
                return Err(Error::Grading(format!(
                    "invalid question number {}",
                    entry.question_number
                )));
            }
            if !seen.insert(entry.question_number) {
                return Err(Error::Grading(format!(
                    "question {} appears twice in the answer key",
                    entry.question_number
                )));
            }

            let Some(expected) = entry
                .correct_answer
                .as_deref()
                .map(normalize)
                .filter(|s| !s.is_empty())
            else {
                continue;
            };

            let given = responses
                .get(&entry.question_number.to_string())
                .map(|s| normalize(s))
                .unwrap_or_default();

            if !given.is_empty() && given == expected {
                correct += 1;
            }
        }

        Ok(correct)
    }

    /// Fills in an empty answer for every question the candidate skipped so
    /// the stored responses cover the whole paper.
    pub fn complete_responses(answer_key: &[AnswerKeyEntry], responses: &mut Responses) {
        for entry in answer_key {
            responses
                .entry(entry.question_number.to_string())
                .or_default();
        }
    }
}

fn normalize(answer: &str) -> String {
    answer.trim().to_lowercase()
}
