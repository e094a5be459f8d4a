//! Risk assessment: both scores, explainability factors and recommendations

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ai::RiskInsights;
use crate::models::{RiskScoreSnapshot, StudentProfile};

use super::dropout::DropoutBreakdown;
use super::stress::{expense_ratio_score, StressBreakdown};

pub const MAX_RECOMMENDATIONS: usize = 5;

const EMERGENCY_SCHOLARSHIPS: &str =
    "High financial stress detected. Consider applying for emergency scholarships.";
const REDUCE_DISCRETIONARY: &str = "Review and reduce discretionary spending.";
const FINANCIAL_AID_OFFICE: &str =
    "Elevated dropout risk. Speak with college financial aid office.";
const PART_TIME_WORK: &str = "Explore part-time work opportunities on campus.";
const LOAN_RESTRUCTURING: &str = "High debt burden. Consider loan restructuring options.";
const SPENDING_ALERTS: &str =
    "Poor budget compliance. Set up spending alerts and track expenses daily.";
const EMERGENCY_FUND: &str = "Financial health is good. Consider building an emergency fund.";
const MONITOR_EXPENSES: &str = "Monitor expenses and explore scholarship opportunities.";

/// Everything known about a student's risk at a point in time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub student_id: i64,
    /// Rounded to one decimal
    pub financial_stress_score: f64,
    /// Rounded to one decimal
    pub dropout_risk_score: f64,
    pub stress: StressBreakdown,
    pub dropout: DropoutBreakdown,
    pub factors: BTreeMap<String, f64>,
    pub recommendations: Vec<String>,
    pub ai_enriched: bool,
    pub assessed_at: DateTime<Utc>,
}

impl RiskAssessment {
    /// Build the rule-based assessment
    pub fn new(
        student: &StudentProfile,
        stress: StressBreakdown,
        dropout: DropoutBreakdown,
        scholarship_success: f64,
        assessed_at: DateTime<Utc>,
    ) -> Self {
        let factors = explain(student, &stress, scholarship_success);
        let recommendations = rule_recommendations(stress.score, dropout.score, &factors);

        Self {
            student_id: student.id,
            financial_stress_score: round1(stress.score),
            dropout_risk_score: round1(dropout.score),
            stress,
            dropout,
            factors,
            recommendations,
            ai_enriched: false,
            assessed_at,
        }
    }

    /// Append AI interventions and merge AI key factors over the rule factors
    pub fn enrich(&mut self, insights: RiskInsights) {
        self.recommendations.extend(
            insights
                .interventions
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        );
        self.factors.extend(
            insights
                .key_factors
                .into_iter()
                .filter(|(_, v)| v.is_finite()),
        );
        self.ai_enriched = true;
    }

    /// Fill in a generic recommendation if none apply, then cap the list
    pub fn finalize(&mut self) {
        if self.recommendations.is_empty() {
            let text = if self.stress.score < 30.0 {
                EMERGENCY_FUND
            } else {
                MONITOR_EXPENSES
            };
            self.recommendations.push(text.to_string());
        }
        self.recommendations.truncate(MAX_RECOMMENDATIONS);
    }

    /// Snapshot persisted on the student record
    pub fn snapshot(&self) -> RiskScoreSnapshot {
        RiskScoreSnapshot {
            financial_stress_score: self.stress.score,
            dropout_risk_score: self.dropout.score,
            factors: self.factors.clone(),
            computed_at: self.assessed_at,
        }
    }
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Debt as a percentage of annual family income, capped at 100
pub fn debt_burden_percent(student: &StudentProfile) -> f64 {
    match student.loan_amount() {
        Some(loan) if student.family_annual_income > 0.0 => {
            (loan / student.family_annual_income * 100.0).min(100.0)
        }
        _ => 0.0,
    }
}

/// Academic factor on a finer scale than the dropout sub-score
pub fn academic_performance(student: &StudentProfile) -> f64 {
    match student.known_cgpa() {
        Some(cgpa) if cgpa >= 8.0 => 10.0,
        Some(cgpa) if cgpa >= 7.0 => 30.0,
        Some(cgpa) if cgpa >= 6.0 => 60.0,
        Some(_) => 90.0,
        None => 50.0,
    }
}

fn explain(
    student: &StudentProfile,
    stress: &StressBreakdown,
    scholarship_success: f64,
) -> BTreeMap<String, f64> {
    BTreeMap::from([
        (
            "expense_to_income_ratio".to_string(),
            expense_ratio_score(stress.monthly_expenses, stress.monthly_income),
        ),
        ("debt_burden".to_string(), debt_burden_percent(student)),
        ("budget_compliance".to_string(), stress.budget_compliance),
        ("scholarship_success".to_string(), scholarship_success),
        (
            "academic_performance".to_string(),
            academic_performance(student),
        ),
    ])
}

fn rule_recommendations(stress: f64, dropout: f64, factors: &BTreeMap<String, f64>) -> Vec<String> {
    let factor = |name: &str| factors.get(name).copied().unwrap_or(0.0);
    let mut out = Vec::new();

    if stress > 70.0 {
        out.push(EMERGENCY_SCHOLARSHIPS.to_string());
        out.push(REDUCE_DISCRETIONARY.to_string());
    }
    if dropout > 60.0 {
        out.push(FINANCIAL_AID_OFFICE.to_string());
        out.push(PART_TIME_WORK.to_string());
    }
    if factor("debt_burden") > 50.0 {
        out.push(LOAN_RESTRUCTURING.to_string());
    }
    if factor("budget_compliance") > 70.0 {
        out.push(SPENDING_ALERTS.to_string());
    }
    out
}
