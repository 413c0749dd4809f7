use serde::{Deserialize, Serialize};

/// Selects the reading conversion table. Only the literal `"Academic"` picks
/// the academic table; every other label scores as General Training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExamType {
    Academic,
    General,
}

impl ExamType {
    pub fn from_label(label: Option<&str>) -> Self {
        match label {
            Some("Academic") => ExamType::Academic,
            _ => ExamType::General,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExamType::Academic => "Academic",
            ExamType::General => "General",
        }
    }
}

