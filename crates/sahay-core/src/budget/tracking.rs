//! Budget plan lifecycle and analytics

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::alerts::{budget_alerts, AlertPayload};
use crate::error::{Error, Result};
use crate::models::{BudgetPlan, BudgetStatus, Category, ExpenseRecord, AMOUNT_TOLERANCE};
use crate::spending::{daily_trend, DailyTotal};

impl BudgetPlan {
    /// Reject malformed plans before any scoring runs
    pub fn validate(&self) -> Result<()> {
        if !self.total_amount.is_finite() || self.total_amount <= 0.0 {
            return Err(Error::Validation(format!(
                "Budget {} total must be positive",
                self.id
            )));
        }
        if self.end_date <= self.start_date {
            return Err(Error::Validation(format!(
                "Budget {} end date {} must be after start date {}",
                self.id, self.end_date, self.start_date
            )));
        }
        if let Some((category, amount)) = self.categories.iter().find(|(_, a)| **a < 0.0) {
            return Err(Error::Validation(format!(
                "Budget {} category {} has negative amount {}",
                self.id, category, amount
            )));
        }
        let allocated: f64 = self.categories.values().sum();
        if (allocated - self.total_amount).abs() > AMOUNT_TOLERANCE {
            return Err(Error::Validation(format!(
                "Budget {} categories sum to {:.2}, expected {:.2}",
                self.id, allocated, self.total_amount
            )));
        }
        if !(self.alert_threshold > 0.0 && self.alert_threshold <= 1.0) {
            return Err(Error::Validation(format!(
                "Budget {} alert threshold {} must be in (0, 1]",
                self.id, self.alert_threshold
            )));
        }
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.status == BudgetStatus::Active
    }

    /// Fraction of the total spent (0 for a zero-total budget)
    pub fn utilization(&self) -> f64 {
        if self.total_amount > 0.0 {
            self.spent_amount / self.total_amount
        } else {
            0.0
        }
    }

    /// Days in the window, counting both ends
    pub fn total_days(&self) -> i64 {
        ((self.end_date - self.start_date).num_days() + 1).max(1)
    }

    /// Days elapsed including today, clamped to the window
    pub fn days_passed(&self, today: NaiveDate) -> i64 {
        ((today - self.start_date).num_days() + 1).clamp(0, self.total_days())
    }

    /// Set the spent amount, keeping remaining and status consistent
    pub fn record_spending(&mut self, spent: f64, today: NaiveDate) -> Result<()> {
        if !spent.is_finite() || spent < 0.0 {
            return Err(Error::Validation(format!(
                "Budget {} spent amount must be non-negative, got {}",
                self.id, spent
            )));
        }
        self.spent_amount = spent;
        self.remaining_amount = self.total_amount - spent;

        if self.is_active() {
            if self.spent_amount >= self.total_amount {
                self.status = BudgetStatus::Exceeded;
            } else if self.end_date < today {
                self.status = BudgetStatus::Completed;
            }
        }
        Ok(())
    }

    /// Recompute spending from the expenses linked to this budget
    pub fn recompute_spending(&mut self, expenses: &[ExpenseRecord], today: NaiveDate) -> Result<()> {
        let spent = self.linked_expenses(expenses).map(|e| e.amount).sum();
        self.record_spending(spent, today)
    }

    pub fn cancel(&mut self) -> Result<()> {
        match self.status {
            BudgetStatus::Cancelled | BudgetStatus::Archived => Err(Error::Validation(format!(
                "Budget {} is already {}",
                self.id, self.status
            ))),
            _ => {
                self.status = BudgetStatus::Cancelled;
                Ok(())
            }
        }
    }

    pub fn archive(&mut self) -> Result<()> {
        if self.status == BudgetStatus::Archived {
            return Err(Error::Validation(format!(
                "Budget {} is already archived",
                self.id
            )));
        }
        self.status = BudgetStatus::Archived;
        Ok(())
    }

    fn linked_expenses<'e>(
        &self,
        expenses: &'e [ExpenseRecord],
    ) -> impl Iterator<Item = &'e ExpenseRecord> {
        let (id, start, end) = (self.id, self.start_date, self.end_date);
        expenses
            .iter()
            .filter(move |e| e.budget_id == Some(id) && e.date >= start && e.date <= end)
    }
}

/// Detailed view of one budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetAnalytics {
    pub budget_id: i64,
    pub total_amount: f64,
    pub spent_amount: f64,
    pub remaining_amount: f64,
    pub utilization: f64,
    pub category_spending: BTreeMap<Category, f64>,
    /// Spent / allocated, for categories with an allocation
    pub category_utilization: BTreeMap<Category, f64>,
    pub daily_trend: Vec<DailyTotal>,
    pub days_passed: i64,
    pub total_days: i64,
    /// None before the window starts
    pub projected_end_balance: Option<f64>,
    pub recommendations: Vec<String>,
    pub alerts: Vec<AlertPayload>,
}

/// Analytics for a budget over its linked expenses
pub fn budget_analytics(
    plan: &BudgetPlan,
    expenses: &[ExpenseRecord],
    today: NaiveDate,
    now: DateTime<Utc>,
) -> BudgetAnalytics {
    let linked: Vec<ExpenseRecord> = plan.linked_expenses(expenses).cloned().collect();

    let mut category_spending: BTreeMap<Category, f64> = BTreeMap::new();
    for expense in &linked {
        *category_spending.entry(expense.category).or_insert(0.0) += expense.amount;
    }

    let category_utilization = category_spending
        .iter()
        .filter_map(|(category, spent)| {
            plan.categories
                .get(category)
                .filter(|allocated| **allocated > 0.0)
                .map(|allocated| (*category, spent / allocated))
        })
        .collect();

    let days_passed = plan.days_passed(today);
    let total_days = plan.total_days();
    let projected_end_balance = (days_passed > 0).then(|| {
        plan.total_amount - plan.spent_amount / days_passed as f64 * total_days as f64
    });

    let mut recommendations = Vec::new();
    if plan.spent_amount > plan.total_amount * 0.8 {
        recommendations.push("Consider reducing discretionary spending".to_string());
    }
    for (category, spent) in &category_spending {
        let allocated = plan.categories.get(category).copied().unwrap_or(0.0);
        if allocated > 0.0 && *spent > allocated * 1.1 {
            recommendations.push(format!("Reduce spending in {}", category));
        }
    }

    BudgetAnalytics {
        budget_id: plan.id,
        total_amount: plan.total_amount,
        spent_amount: plan.spent_amount,
        remaining_amount: plan.remaining_amount,
        utilization: plan.utilization(),
        category_spending,
        category_utilization,
        daily_trend: daily_trend(&linked),
        days_passed,
        total_days,
        projected_end_balance,
        recommendations,
        alerts: budget_alerts(plan, today, now),
    }
}
