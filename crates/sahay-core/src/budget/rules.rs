//! Deterministic rule-based budget generation
//!
//! The availability fallback for every AI budget request. Never fails and
//! never calls out.

use std::collections::BTreeMap;

use crate::city::city_cost_index;
use crate::models::{Category, StudentProfile};

use super::types::{BudgetRecommendation, CategoryAllocation, RecommendationSource};

/// Monthly base used when the student has no income data
pub const DEFAULT_MONTHLY_BASE: f64 = 10_000.0;

/// Confidence reported for rule-based output
pub const RULE_CONFIDENCE: f64 = 0.7;

/// Standard allocation (percent of the adjusted amount); sums to 100
const ALLOCATION_TABLE: [(Category, f64, &str); 8] = [
    (Category::TuitionFee, 40.0, "Academic fees and college expenses"),
    (Category::HostelFee, 25.0, "Accommodation and utilities"),
    (Category::Food, 20.0, "Food and groceries"),
    (Category::Transport, 5.0, "Local transportation"),
    (Category::Books, 5.0, "Study materials and books"),
    (Category::Medical, 2.0, "Healthcare and insurance"),
    (Category::Entertainment, 2.0, "Recreation and social activities"),
    (Category::Savings, 1.0, "Emergency fund and savings"),
];

const RULE_RECOMMENDATIONS: [&str; 4] = [
    "Consider applying for scholarships to reduce financial burden",
    "Track expenses weekly to stay within budget",
    "Look for student discounts on transportation and entertainment",
    "Build an emergency fund of at least 3 months' expenses",
];

const RULE_WARNINGS: [&str; 3] = [
    "Based on rule-based allocation due to AI service limitation",
    "Adjust percentages based on actual spending patterns",
    "Monitor spending closely during initial months",
];

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Monthly base before the city adjustment
pub fn base_amount(student: &StudentProfile) -> f64 {
    let income = student.monthly_income();
    if income > 0.0 {
        income
    } else {
        DEFAULT_MONTHLY_BASE
    }
}

/// Generate the standard allocation for a student
pub fn rule_based_budget(student: &StudentProfile) -> BudgetRecommendation {
    let adjusted = round2(base_amount(student) * city_cost_index(&student.city));

    let mut categories = BTreeMap::new();
    for (category, percentage, rationale) in ALLOCATION_TABLE {
        categories.insert(
            category,
            CategoryAllocation {
                amount: round2(adjusted * percentage / 100.0),
                percentage,
                rationale: rationale.to_string(),
            },
        );
    }

    // Fold rounding residue into the largest share so amounts sum to the total
    let residual = round2(adjusted - categories.values().map(|c| c.amount).sum::<f64>());
    if residual != 0.0 {
        if let Some(tuition) = categories.get_mut(&Category::TuitionFee) {
            tuition.amount = round2(tuition.amount + residual);
        }
    }

    BudgetRecommendation {
        total_monthly_budget: adjusted,
        categories,
        confidence_score: RULE_CONFIDENCE,
        recommendations: RULE_RECOMMENDATIONS.iter().map(|s| s.to_string()).collect(),
        warnings: RULE_WARNINGS.iter().map(|s| s.to_string()).collect(),
        source: RecommendationSource::RuleBased,
    }
}
