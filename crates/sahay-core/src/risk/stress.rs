//! Financial stress scoring
//!
//! Weighted composite of four sub-scores, each clamped to [0, 100]:
//! expense ratio (40%), debt burden (25%), savings buffer (20%) and budget
//! compliance (15%).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{BudgetPlan, ExpenseRecord, StudentProfile};
use crate::spending::{total_in_window, DateWindow};

pub const EXPENSE_RATIO_WEIGHT: f64 = 0.40;
pub const DEBT_BURDEN_WEIGHT: f64 = 0.25;
pub const SAVINGS_BUFFER_WEIGHT: f64 = 0.20;
pub const BUDGET_COMPLIANCE_WEIGHT: f64 = 0.15;

/// Trailing window of expenses treated as "this month"
pub const STRESS_WINDOW_DAYS: u32 = 30;

/// Compliance score when no active budget can be judged
pub const NEUTRAL_COMPLIANCE: f64 = 50.0;

/// Sub-scores behind a stress score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressBreakdown {
    pub monthly_expenses: f64,
    pub monthly_income: f64,
    pub expense_ratio: f64,
    pub debt_burden: f64,
    pub savings_buffer: f64,
    pub budget_compliance: f64,
    pub score: f64,
}

/// Spend as a percentage of income, saturating at 100 (and at no income)
pub fn expense_ratio_score(monthly_expenses: f64, monthly_income: f64) -> f64 {
    if monthly_income > 0.0 {
        (monthly_expenses / monthly_income * 100.0).clamp(0.0, 100.0)
    } else {
        100.0
    }
}

/// A loan worth half of annual family income counts as maximal burden
pub fn debt_burden_score(student: &StudentProfile) -> f64 {
    match student.loan_amount() {
        Some(loan) if student.family_annual_income > 0.0 => {
            (loan / student.family_annual_income * 200.0).clamp(0.0, 100.0)
        }
        _ => 0.0,
    }
}

/// Savings heuristic. Spending between 80% and 100% of income scores 0.
pub fn savings_buffer_score(monthly_expenses: f64, monthly_income: f64) -> f64 {
    if monthly_income <= 0.0 {
        0.0
    } else if monthly_expenses < monthly_income * 0.8 {
        20.0
    } else if monthly_expenses >= monthly_income {
        100.0
    } else {
        0.0
    }
}

/// Penalty for one budget: 0 inside the 80-90% band, 100 when overspent
pub fn budget_penalty(utilization: f64) -> f64 {
    if (0.8..=0.9).contains(&utilization) {
        0.0
    } else if utilization > 1.0 {
        100.0
    } else {
        ((utilization - 0.85).abs() * 200.0).clamp(0.0, 100.0)
    }
}

/// Average penalty across active budgets with a positive total
pub fn budget_compliance_score(budgets: &[BudgetPlan]) -> f64 {
    let penalties: Vec<f64> = budgets
        .iter()
        .filter(|b| b.is_active() && b.total_amount > 0.0)
        .map(|b| budget_penalty(b.utilization()))
        .collect();

    if penalties.is_empty() {
        NEUTRAL_COMPLIANCE
    } else {
        penalties.iter().sum::<f64>() / penalties.len() as f64
    }
}

/// Score stress from an already-summed monthly spend
pub fn stress_from_monthly(
    student: &StudentProfile,
    monthly_expenses: f64,
    budgets: &[BudgetPlan],
) -> StressBreakdown {
    let monthly_income = student.monthly_income();
    let expense_ratio = expense_ratio_score(monthly_expenses, monthly_income);
    let debt_burden = debt_burden_score(student);
    let savings_buffer = savings_buffer_score(monthly_expenses, monthly_income);
    let budget_compliance = budget_compliance_score(budgets);

    let score = (expense_ratio * EXPENSE_RATIO_WEIGHT
        + debt_burden * DEBT_BURDEN_WEIGHT
        + savings_buffer * SAVINGS_BUFFER_WEIGHT
        + budget_compliance * BUDGET_COMPLIANCE_WEIGHT)
        .clamp(0.0, 100.0);

    StressBreakdown {
        monthly_expenses,
        monthly_income,
        expense_ratio,
        debt_burden,
        savings_buffer,
        budget_compliance,
        score,
    }
}

/// Score stress from the expenses in the trailing window ending `today`
pub fn financial_stress(
    student: &StudentProfile,
    expenses: &[ExpenseRecord],
    budgets: &[BudgetPlan],
    today: NaiveDate,
) -> StressBreakdown {
    let window = DateWindow::trailing(today, STRESS_WINDOW_DAYS);
    stress_from_monthly(student, total_in_window(expenses, window), budgets)
}
