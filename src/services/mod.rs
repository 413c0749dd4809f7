pub mod ai_service;
pub mod attempt_service;
pub mod eval_service;
pub mod evaluation_service;
pub mod grading_service;
pub mod score_tables;
pub mod summary_service;
