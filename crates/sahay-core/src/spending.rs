//! Spending aggregation
//!
//! Reduces raw expense records into totals, per-category statistics and daily
//! averages over an inclusive date window. Feeds the budget generators and the
//! financial stress scorer.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{Category, ExpenseRecord};

/// Inclusive date window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(Error::Validation(format!(
                "Window end {} is before start {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    /// The last `days` days ending on (and including) `today`
    pub fn trailing(today: NaiveDate, days: u32) -> Self {
        let days = days.max(1);
        Self {
            start: today - Duration::days(i64::from(days) - 1),
            end: today,
        }
    }

    /// Number of days covered, counting both ends
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Per-category statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category: Category,
    pub total: f64,
    pub average: f64,
    pub count: usize,
}

/// Aggregated view of expenses in a window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingSummary {
    pub window: DateWindow,
    pub total_spent: f64,
    pub daily_average: f64,
    /// Categories with spend, ordered by total descending
    pub categories: Vec<CategoryStats>,
    pub most_frequent_category: Option<Category>,
    pub most_expensive_category: Option<Category>,
    pub highest_expense: f64,
    pub lowest_expense: f64,
    pub expense_count: usize,
}

impl SpendingSummary {
    /// Per-category totals (zero-spend categories are absent)
    pub fn category_totals(&self) -> BTreeMap<Category, f64> {
        self.categories.iter().map(|c| (c.category, c.total)).collect()
    }

    pub fn total_for(&self, category: Category) -> f64 {
        self.categories
            .iter()
            .find(|c| c.category == category)
            .map(|c| c.total)
            .unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.expense_count == 0
    }

    /// Text block for AI prompts, one line per category
    pub fn prompt_summary(&self) -> String {
        if self.categories.is_empty() {
            return "No expense data available".to_string();
        }
        self.categories
            .iter()
            .map(|c| format!("- {}: ₹{:.2}", c.category, c.total))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Summarize expenses dated inside `window`
pub fn summarize(expenses: &[ExpenseRecord], window: DateWindow) -> SpendingSummary {
    let mut buckets: BTreeMap<Category, (f64, usize)> = BTreeMap::new();
    let mut total = 0.0;
    let mut count = 0usize;
    let mut highest: Option<f64> = None;
    let mut lowest: Option<f64> = None;

    for expense in expenses.iter().filter(|e| window.contains(e.date)) {
        let entry = buckets.entry(expense.category).or_insert((0.0, 0));
        entry.0 += expense.amount;
        entry.1 += 1;
        total += expense.amount;
        count += 1;
        highest = Some(highest.map_or(expense.amount, |h| h.max(expense.amount)));
        lowest = Some(lowest.map_or(expense.amount, |l| l.min(expense.amount)));
    }

    let mut categories: Vec<CategoryStats> = buckets
        .into_iter()
        .filter(|(_, (sum, _))| *sum > 0.0)
        .map(|(category, (sum, n))| CategoryStats {
            category,
            total: sum,
            average: sum / n as f64,
            count: n,
        })
        .collect();

    // Stable sort keeps category order for equal totals
    categories.sort_by(|a, b| {
        b.total
            .partial_cmp(&a.total)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // First strictly-greater entry in total-descending order wins ties
    let mut most_frequent = None;
    let mut max_count = 0;
    let mut most_expensive = None;
    let mut max_total = 0.0;
    for stats in &categories {
        if stats.count > max_count {
            max_count = stats.count;
            most_frequent = Some(stats.category);
        }
        if stats.total > max_total {
            max_total = stats.total;
            most_expensive = Some(stats.category);
        }
    }

    let days = window.days();
    SpendingSummary {
        window,
        total_spent: total,
        daily_average: if days > 0 { total / days as f64 } else { 0.0 },
        categories,
        most_frequent_category: most_frequent,
        most_expensive_category: most_expensive,
        highest_expense: highest.unwrap_or(0.0),
        lowest_expense: lowest.unwrap_or(0.0),
        expense_count: count,
    }
}

/// Total of expenses dated inside `window`
pub fn total_in_window(expenses: &[ExpenseRecord], window: DateWindow) -> f64 {
    expenses
        .iter()
        .filter(|e| window.contains(e.date))
        .map(|e| e.amount)
        .sum()
}

/// A day's total spend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub amount: f64,
}

/// Per-date totals ordered by date
pub fn daily_trend(expenses: &[ExpenseRecord]) -> Vec<DailyTotal> {
    let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for expense in expenses {
        *by_day.entry(expense.date).or_insert(0.0) += expense.amount;
    }
    by_day
        .into_iter()
        .map(|(date, amount)| DailyTotal { date, amount })
        .collect()
}
