use std::sync::Arc;

use uuid::Uuid;

use crate::database::store::{EvaluationRecord, EvaluationStore};
use crate::error::{Error, Result};
use crate::models::evaluation::Module;

/// Extra attempt numbers tried after a uniqueness conflict before giving up.
pub const MAX_CONFLICT_RETRIES: u32 = 5;

#[derive(Clone)]
pub struct AttemptService {
    store: Arc<dyn EvaluationStore>,
}

impl AttemptService {
    pub fn new(store: Arc<dyn EvaluationStore>) -> Self {
        Self { store }
    }

    /// Next attempt number for `(user_id, exam_id)`: one past the highest
    /// recorded attempt, or 1 for a first submission. Gaps are not reused.
    pub async fn next_attempt_number(
        &self,
        module: Module,
        user_id: Uuid,
        exam_id: Uuid,
    ) -> Result<i32> {
        let latest = self
            .store
            .latest_attempt_number(module, user_id, exam_id)
            .await?;
        Ok(latest.map(|n| n + 1).unwrap_or(1))
    }

    /// Inserts `record` under the next free attempt number. A concurrent
    /// submission that claimed the same number surfaces as a conflict from the
    /// store; the candidate number is bumped and the insert retried.
    pub async fn insert_next<R: EvaluationRecord>(&self, module: Module, mut record: R) -> Result<R> {
        let mut candidate = self
            .next_attempt_number(module, record.user_id(), record.exam_id())
            .await?;

        for retry in 0..=MAX_CONFLICT_RETRIES {
            record.set_attempt_number(candidate);
            match R::insert(self.store.as_ref(), module, &record).await {
                Ok(inserted) => return Ok(inserted),
                Err(Error::Conflict(msg)) => {
                    tracing::warn!(
                        module = %module,
                        user_id = %record.user_id(),
                        exam_id = %record.exam_id(),
                        attempt_number = candidate,
                        retry,
                        "Attempt number already taken: {}",
                        msg
                    );
                    candidate += 1;
                }
                Err(e) => return Err(e),
            }
        }

        Err(Error::Conflict(format!(
            "Could not assign an attempt number for {} after {} retries",
            module, MAX_CONFLICT_RETRIES
        )))
    }
}
