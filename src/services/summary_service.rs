use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::database::store::EvaluationStore;
use crate::error::{Error, Result};
use crate::models::evaluation::Module;
use crate::models::summary::UserExamSummary;

#[derive(Clone)]
pub struct SummaryService {
    store: Arc<dyn EvaluationStore>,
}

impl SummaryService {
    pub fn new(store: Arc<dyn EvaluationStore>) -> Self {
        Self { store }
    }

    /// Records `band` in the module's slot of the (user, exam) summary. The
    /// summary is a cache over the evaluation tables, so failures are logged
    /// and never propagated to the submission.
    pub async fn upsert_summary(&self, user_id: Uuid, exam_id: Uuid, module: Module, band: f64) {
        match self
            .store
            .upsert_summary_band(user_id, exam_id, module, band, Utc::now())
            .await
        {
            Ok(_) => tracing::debug!(
                user_id = %user_id,
                exam_id = %exam_id,
                module = %module,
                band,
                "Exam summary updated"
            ),
            Err(e) => tracing::error!(
                user_id = %user_id,
                exam_id = %exam_id,
                module = %module,
                error = %e,
                "Failed to update exam summary"
            ),
        }
    }

    pub async fn list_summaries(
        &self,
        user_id: Uuid,
        exam_id: Option<Uuid>,
    ) -> Result<Vec<UserExamSummary>> {
        let rows = self.store.list_summaries(user_id, exam_id).await?;
        if rows.is_empty() {
            return Err(Error::NotFound("No summary records found".to_string()));
        }
        Ok(rows)
    }
}
