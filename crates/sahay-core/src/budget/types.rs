//! Budget recommendation types

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{default_alert_threshold, BudgetPlan, BudgetStatus, Category, AMOUNT_TOLERANCE};

/// Where a recommendation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    Ai,
    RuleBased,
}

impl RecommendationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ai => "ai",
            Self::RuleBased => "rule_based",
        }
    }
}

impl std::fmt::Display for RecommendationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Allocation for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAllocation {
    pub amount: f64,
    pub percentage: f64,
    pub rationale: String,
}

/// A monthly budget recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetRecommendation {
    pub total_monthly_budget: f64,
    pub categories: BTreeMap<Category, CategoryAllocation>,
    /// Confidence in [0, 1]
    pub confidence_score: f64,
    pub recommendations: Vec<String>,
    pub warnings: Vec<String>,
    pub source: RecommendationSource,
}

impl BudgetRecommendation {
    pub fn allocated_total(&self) -> f64 {
        self.categories.values().map(|c| c.amount).sum()
    }

    pub fn percentage_total(&self) -> f64 {
        self.categories.values().map(|c| c.percentage).sum()
    }

    pub fn amount_for(&self, category: Category) -> f64 {
        self.categories.get(&category).map(|c| c.amount).unwrap_or(0.0)
    }

    /// Check that amounts sum to the total and percentages to 100
    pub fn validate_allocation(&self) -> Result<()> {
        let allocated = self.allocated_total();
        if (allocated - self.total_monthly_budget).abs() > AMOUNT_TOLERANCE {
            return Err(Error::Validation(format!(
                "Category amounts sum to {:.2}, expected {:.2}",
                allocated, self.total_monthly_budget
            )));
        }

        let percentages = self.percentage_total();
        if (percentages - 100.0).abs() > AMOUNT_TOLERANCE {
            return Err(Error::Validation(format!(
                "Category percentages sum to {:.4}, expected 100",
                percentages
            )));
        }

        if let Some((category, _)) = self.categories.iter().find(|(_, c)| c.amount < 0.0) {
            return Err(Error::Validation(format!(
                "Category {} has a negative allocation",
                category
            )));
        }

        Ok(())
    }

    /// Turn the recommendation into an active budget plan over a window
    pub fn to_budget_plan(
        &self,
        id: i64,
        student_id: i64,
        name: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<BudgetPlan> {
        let plan = BudgetPlan {
            id,
            student_id,
            name: name.to_string(),
            total_amount: self.total_monthly_budget,
            spent_amount: 0.0,
            remaining_amount: self.total_monthly_budget,
            categories: self
                .categories
                .iter()
                .map(|(category, alloc)| (*category, alloc.amount))
                .collect(),
            start_date,
            end_date,
            status: BudgetStatus::Active,
            alert_threshold: default_alert_threshold(),
            ai_generated: self.source == RecommendationSource::Ai,
            last_alert_at: None,
        };
        plan.validate()?;
        Ok(plan)
    }
}
