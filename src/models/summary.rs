use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::evaluation::Module;

/// Latest band per module for one (user, exam). Written only by the summary
/// aggregator; the evaluation tables remain authoritative.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserExamSummary {
    pub user_id: Uuid,
    pub exam_id: Uuid,
    pub listening_band_score: Option<f64>,
    pub reading_band_score: Option<f64>,
    pub writing_band_score: Option<f64>,
    pub speaking_band_score: Option<f64>,
    pub last_attempt_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Column name of a module's band in `user_exam_summary`.
pub fn band_column(module: Module) -> &'static str {
    match module {
        Module::Listening => "listening_band_score",
        Module::Reading => "reading_band_score",
        Module::Writing => "writing_band_score",
        Module::Speaking => "speaking_band_score",
    }
}
