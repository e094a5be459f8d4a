//! Dropout risk scoring
//!
//! Financial stress carries 60% of the score; academic standing (20%),
//! scholarship success (10%) and year of study (10%) make up the rest.

use serde::{Deserialize, Serialize};

use crate::models::{ScholarshipApplication, StudentProfile};

pub const FINANCIAL_WEIGHT: f64 = 0.6;
pub const ACADEMIC_WEIGHT: f64 = 0.2;
pub const SCHOLARSHIP_WEIGHT: f64 = 0.1;
pub const YEAR_WEIGHT: f64 = 0.1;

/// Neutral scholarship score when nothing has been decided or submitted
pub const NEUTRAL_SCHOLARSHIP: f64 = 50.0;

/// Weighted contributions behind a dropout score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DropoutBreakdown {
    pub financial: f64,
    pub academic: f64,
    pub scholarship: f64,
    pub year: f64,
    pub score: f64,
}

/// Raw academic risk from CGPA, before weighting
pub fn academic_risk(student: &StudentProfile) -> f64 {
    match student.known_cgpa() {
        Some(cgpa) if cgpa < 6.0 => 80.0,
        Some(cgpa) if cgpa < 7.0 => 40.0,
        Some(_) => 10.0,
        None => 30.0,
    }
}

/// `100 - success_rate%` over considered applications
pub fn scholarship_success_score(applications: &[ScholarshipApplication]) -> f64 {
    let considered = applications
        .iter()
        .filter(|a| a.status.is_considered())
        .count();
    if considered == 0 {
        return NEUTRAL_SCHOLARSHIP;
    }

    let successful = applications
        .iter()
        .filter(|a| a.status.is_successful())
        .count();
    100.0 - successful as f64 / considered as f64 * 100.0
}

/// First-year adjustment and final-year pressure score highest
pub fn year_risk(year_of_study: u8) -> f64 {
    match year_of_study {
        1 => 70.0,
        y if y >= 4 => 60.0,
        _ => 40.0,
    }
}

/// Combine a stress score with the student's academic signals
pub fn dropout_risk(
    financial_stress: f64,
    student: &StudentProfile,
    applications: &[ScholarshipApplication],
) -> DropoutBreakdown {
    let financial = financial_stress.clamp(0.0, 100.0) * FINANCIAL_WEIGHT;
    let academic = academic_risk(student) * ACADEMIC_WEIGHT;
    let scholarship = scholarship_success_score(applications) * SCHOLARSHIP_WEIGHT;
    let year = year_risk(student.year_of_study) * YEAR_WEIGHT;

    DropoutBreakdown {
        financial,
        academic,
        scholarship,
        year,
        score: (financial + academic + scholarship + year).clamp(0.0, 100.0),
    }
}
