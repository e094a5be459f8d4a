//! Business rules applied to every parsed AI budget
//!
//! 1. Cap the total at 120% of monthly income, scaling every category.
//! 2. Floor each essential category at 10% of the (capped) total.
//! 3. Recompute percentages from the final amounts so they sum to 100.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::ai::parsing::AiBudgetResponse;
use crate::ai::AiError;
use crate::models::Category;

use super::rules::round2;
use super::types::{BudgetRecommendation, CategoryAllocation, RecommendationSource};

/// Allowed total as a multiple of monthly income
pub const INCOME_CAP_FACTOR: f64 = 1.2;

/// Minimum share of the total for essential categories
pub const ESSENTIAL_FLOOR: f64 = 0.10;

/// Confidence assumed when the model omits one
pub const DEFAULT_AI_CONFIDENCE: f64 = 0.8;

pub const CAP_WARNING: &str = "Budget capped to 120% of monthly allowance for sustainability";

const ADJUSTED_SUFFIX: &str = " (Adjusted to minimum)";

fn typed_categories(
    response: &AiBudgetResponse,
) -> Result<BTreeMap<Category, CategoryAllocation>, AiError> {
    let mut categories = BTreeMap::new();
    for (key, alloc) in &response.categories {
        let category: Category = match key.parse() {
            Ok(c) => c,
            Err(_) => {
                warn!(category = %key, "Skipping unknown category in AI budget");
                continue;
            }
        };
        if !alloc.amount.is_finite() || alloc.amount < 0.0 {
            return Err(AiError::Validation(format!(
                "Category {} has invalid amount {}",
                key, alloc.amount
            )));
        }
        let entry = categories.entry(category).or_insert(CategoryAllocation {
            amount: 0.0,
            percentage: 0.0,
            rationale: alloc.rationale.clone(),
        });
        entry.amount += alloc.amount;
    }
    Ok(categories)
}

/// Apply the business rules to a parsed AI budget
pub fn apply_business_rules(
    response: AiBudgetResponse,
    monthly_income: f64,
) -> Result<BudgetRecommendation, AiError> {
    let mut categories = typed_categories(&response)?;
    let mut warnings = response.risk_warnings;

    // An understated claimed total must not let the allocation slip past the cap
    let allocated: f64 = categories.values().map(|c| c.amount).sum();
    let claimed = response.total_monthly_budget;
    let mut total = if claimed.is_finite() && claimed > allocated {
        claimed
    } else {
        allocated
    };
    if total <= 0.0 {
        return Err(AiError::Validation("AI budget has no positive total".into()));
    }

    let cap = monthly_income * INCOME_CAP_FACTOR;
    if cap > 0.0 && total > cap {
        let scale = cap / total;
        debug!(total, cap, scale, "Capping AI budget to income");
        for alloc in categories.values_mut() {
            alloc.amount *= scale;
        }
        total = cap;
        warnings.push(CAP_WARNING.to_string());
    }

    let floor = total * ESSENTIAL_FLOOR;
    for essential in Category::essentials() {
        match categories.get_mut(essential) {
            Some(alloc) if alloc.amount < floor => {
                alloc.amount = floor;
                alloc.rationale.push_str(ADJUSTED_SUFFIX);
            }
            Some(_) => {}
            None => {
                categories.insert(
                    *essential,
                    CategoryAllocation {
                        amount: floor,
                        percentage: 0.0,
                        rationale: format!("Minimum essential allocation{}", ADJUSTED_SUFFIX),
                    },
                );
            }
        }
    }

    for alloc in categories.values_mut() {
        alloc.amount = round2(alloc.amount);
    }
    let final_total: f64 = categories.values().map(|c| c.amount).sum();
    for alloc in categories.values_mut() {
        alloc.percentage = alloc.amount / final_total * 100.0;
    }

    Ok(BudgetRecommendation {
        total_monthly_budget: final_total,
        categories,
        confidence_score: response
            .ai_confidence_score
            .filter(|c| c.is_finite())
            .unwrap_or(DEFAULT_AI_CONFIDENCE)
            .clamp(0.0, 1.0),
        recommendations: response.key_recommendations,
        warnings,
        source: RecommendationSource::Ai,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::parsing::parse_budget_response;

    fn response(total: f64, amounts: &[(&str, f64)]) -> AiBudgetResponse {
        let categories: serde_json::Map<String, serde_json::Value> = amounts
            .iter()
            .map(|(k, a)| {
                (
                    k.to_string(),
                    serde_json::json!({"amount": a, "percentage": 0, "rationale": "ai"}),
                )
            })
            .collect();
        let raw = serde_json::json!({
            "total_monthly_budget": total,
            "categories": categories,
            "ai_confidence_score": 0.9,
        });
        parse_budget_response(&raw.to_string()).unwrap()
    }

    fn standard(total: f64) -> AiBudgetResponse {
        response(
            total,
            &[
                ("tuition_fee", total * 0.4),
                ("hostel_fee", total * 0.25),
                ("food", total * 0.2),
                ("transport", total * 0.05),
                ("books", total * 0.05),
                ("medical", total * 0.02),
                ("entertainment", total * 0.02),
                ("savings", total * 0.01),
            ],
        )
    }

    #[test]
    fn test_within_cap_untouched() {
        let rec = apply_business_rules(standard(10_000.0), 10_000.0).unwrap();
        assert_eq!(rec.total_monthly_budget, 10_000.0);
        assert_eq!(rec.amount_for(Category::TuitionFee), 4_000.0);
        assert!(rec.warnings.is_empty());
        assert_eq!(rec.source, RecommendationSource::Ai);
        assert!(rec.validate_allocation().is_ok());
    }

    #[test]
    fn test_cap_scales_categories() {
        let rec = apply_business_rules(standard(30_000.0), 10_000.0).unwrap();
        assert!((rec.total_monthly_budget - 12_000.0).abs() < 0.01);
        assert!((rec.amount_for(Category::TuitionFee) - 4_800.0).abs() < 0.01);
        assert!(rec.warnings.iter().any(|w| w == CAP_WARNING));
        assert!(rec.validate_allocation().is_ok());
    }

    #[test]
    fn test_cap_uses_allocated_sum_when_claimed_total_is_low() {
        let rec = apply_business_rules(
            response(
                10_000.0,
                &[
                    ("tuition_fee", 12_000.0),
                    ("hostel_fee", 9_000.0),
                    ("food", 9_000.0),
                ],
            ),
            10_000.0,
        )
        .unwrap();
        assert!((rec.total_monthly_budget - 12_000.0).abs() < 0.01);
        assert!((rec.amount_for(Category::TuitionFee) - 4_800.0).abs() < 0.01);
        assert!(rec.warnings.iter().any(|w| w == CAP_WARNING));
        assert!(rec.validate_allocation().is_ok());
    }

    #[test]
    fn test_zero_income_skips_cap() {
        let rec = apply_business_rules(standard(30_000.0), 0.0).unwrap();
        assert_eq!(rec.total_monthly_budget, 30_000.0);
        assert!(rec.warnings.is_empty());
    }

    #[test]
    fn test_essential_floor() {
        let rec = apply_business_rules(
            response(
                10_000.0,
                &[
                    ("tuition_fee", 5_000.0),
                    ("hostel_fee", 3_500.0),
                    ("food", 500.0),
                    ("entertainment", 1_000.0),
                ],
            ),
            50_000.0,
        )
        .unwrap();

        let food = &rec.categories[&Category::Food];
        assert_eq!(food.amount, 1_000.0);
        assert!(food.rationale.ends_with("(Adjusted to minimum)"));
        // Renormalised against the new sum
        assert_eq!(rec.total_monthly_budget, 10_500.0);
        assert!((rec.percentage_total() - 100.0).abs() < 0.01);
        assert!(rec.validate_allocation().is_ok());
    }

    #[test]
    fn test_missing_essential_inserted() {
        let rec = apply_business_rules(
            response(8_000.0, &[("tuition_fee", 4_000.0), ("food", 4_000.0)]),
            50_000.0,
        )
        .unwrap();
        assert_eq!(rec.amount_for(Category::HostelFee), 800.0);
        assert!(rec.validate_allocation().is_ok());
    }

    #[test]
    fn test_unknown_category_skipped() {
        let rec = apply_business_rules(
            response(
                9_000.0,
                &[
                    ("tuition_fee", 3_000.0),
                    ("hostel_fee", 3_000.0),
                    ("food", 3_000.0),
                    ("crypto", 1_000.0),
                ],
            ),
            50_000.0,
        )
        .unwrap();
        assert_eq!(rec.categories.len(), 3);
        assert_eq!(rec.total_monthly_budget, 9_000.0);
    }

    #[test]
    fn test_negative_amount_rejected() {
        let err = apply_business_rules(
            response(1_000.0, &[("food", -10.0)]),
            50_000.0,
        )
        .unwrap_err();
        assert!(matches!(err, AiError::Validation(_)));
    }

    #[test]
    fn test_empty_budget_rejected() {
        let err = apply_business_rules(response(0.0, &[]), 50_000.0).unwrap_err();
        assert!(matches!(err, AiError::Validation(_)));
    }

    #[test]
    fn test_confidence_clamped() {
        let mut raw = standard(10_000.0);
        raw.ai_confidence_score = Some(4.0);
        let rec = apply_business_rules(raw, 10_000.0).unwrap();
        assert_eq!(rec.confidence_score, 1.0);

        let mut raw = standard(10_000.0);
        raw.ai_confidence_score = None;
        let rec = apply_business_rules(raw, 10_000.0).unwrap();
        assert_eq!(rec.confidence_score, DEFAULT_AI_CONFIDENCE);
    }
}
