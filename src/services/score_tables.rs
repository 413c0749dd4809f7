//! Raw-score to band conversion for the IELTS modules.

use crate::error::{Error, Result};
use crate::models::evaluation::Module;
use crate::models::exam::ExamType;

/// Number of questions in a Listening or Reading paper.
pub const MAX_CORRECT: u32 = 40;

/// `(minimum correct answers, band)`, highest tier first.
const ACADEMIC_TABLE: [(u32, f64); 14] = [
    (39, 9.0),
    (37, 8.5),
    (35, 8.0),
    (33, 7.5),
    (30, 7.0),
    (27, 6.5),
    (23, 6.0),
    (19, 5.5),
    (15, 5.0),
    (13, 4.5),
    (10, 4.0),
    (8, 3.5),
    (6, 3.0),
    (4, 2.5),
];

const FLOOR_BAND: f64 = 2.0;

fn check_domain(correct: u32) -> Result<()> {
    if correct > MAX_CORRECT {
        return Err(Error::Grading(format!(
            "correct count {} exceeds the {} question paper",
            correct, MAX_CORRECT
        )));
    }
    Ok(())
}

fn lookup(table: &[(u32, f64)], correct: u32) -> f64 {
    table
        .iter()
        .find(|(min, _)| correct >= *min)
        .map(|(_, band)| *band)
        .unwrap_or(FLOOR_BAND)
}

pub fn listening_band(correct: u32) -> Result<f64> {
    check_domain(correct)?;
    Ok(lookup(&ACADEMIC_TABLE, correct))
}

pub fn academic_reading_band(correct: u32) -> Result<f64> {
    check_domain(correct)?;
    Ok(lookup(&ACADEMIC_TABLE, correct))
}

/// General Training reading pins 40, 39 and 36 to exact bands; the rest are
/// threshold tiers.
pub fn general_reading_band(correct: u32) -> Result<f64> {
    check_domain(correct)?;
    let band = match correct {
        40 => 9.0,
        39 => 8.5,
        37..=38 => 8.0,
        36 => 7.5,
        34..=35 => 7.0,
        32..=33 => 6.5,
        30..=31 => 6.0,
        27..=29 => 5.5,
        23..=26 => 5.0,
        19..=22 => 4.5,
        15..=18 => 4.0,
        12..=14 => 3.5,
        9..=11 => 3.0,
        6..=8 => 2.5,
        _ => FLOOR_BAND,
    };
    Ok(band)
}

pub fn reading_band(exam_type: ExamType, correct: u32) -> Result<f64> {
    match exam_type {
        ExamType::Academic => academic_reading_band(correct),
        ExamType::General => general_reading_band(correct),
    }
}

/// Band for an objectively graded module. Reading without an exam type
/// scores as General Training; listening ignores it.
pub fn objective_band(module: Module, exam_type: Option<ExamType>, correct: u32) -> Result<f64> {
    match module {
        Module::Listening => listening_band(correct),
        Module::Reading => reading_band(exam_type.unwrap_or(ExamType::General), correct),
        other => Err(Error::Internal(format!(
            "{} is not scored from a correct count",
            other
        ))),
    }
}

/// Task 2 counts double; the result is rounded to the nearest half band.
pub fn writing_overall_band(task_1: f64, task_2: f64) -> f64 {
    let task_1 = clamp_band(task_1);
    let task_2 = clamp_band(task_2);
    (((task_1 + 2.0 * task_2) / 3.0) * 2.0).round() / 2.0
}

fn clamp_band(band: f64) -> f64 {
    if band.is_finite() {
        band.clamp(0.0, 9.0)
    } else {
        0.0
    }
}
