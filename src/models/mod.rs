pub mod evaluation;
pub mod exam;
pub mod question;
pub mod summary;
