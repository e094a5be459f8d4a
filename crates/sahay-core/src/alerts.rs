//! Alert payloads for budgets and scholarship deadlines
//!
//! The core only builds payloads. Delivery belongs to the notification sink.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::models::{BudgetPlan, BudgetStatus, Scholarship};

/// Minimum gap between two threshold alerts for the same budget
pub const ALERT_COOLDOWN_HOURS: i64 = 24;

/// Spending more than this multiple of the pro-rata plan raises a rate alert
pub const SPENDING_RATE_FACTOR: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    BudgetThreshold,
    SpendingRate,
    BudgetNotification,
    ScholarshipDeadline,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BudgetThreshold => "budget_threshold",
            Self::SpendingRate => "spending_rate",
            Self::BudgetNotification => "budget_notification",
            Self::ScholarshipDeadline => "scholarship_deadline",
        }
    }
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Alert priority (ordered low to critical)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl std::str::FromStr for AlertPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(format!("Unknown priority: {}", s)),
        }
    }
}

impl std::fmt::Display for AlertPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An alert ready for the notification sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPayload {
    pub alert_type: AlertType,
    pub title: String,
    pub message: String,
    pub priority: AlertPriority,
    pub data: serde_json::Value,
}

fn cooled_down(plan: &BudgetPlan, now: DateTime<Utc>) -> bool {
    plan.last_alert_at
        .map(|last| now - last > Duration::hours(ALERT_COOLDOWN_HOURS))
        .unwrap_or(true)
}

/// Alerts due for a budget right now, without marking them sent
pub fn budget_alerts(plan: &BudgetPlan, today: NaiveDate, now: DateTime<Utc>) -> Vec<AlertPayload> {
    let mut alerts = Vec::new();
    if plan.status != BudgetStatus::Active || plan.total_amount <= 0.0 {
        return alerts;
    }

    let utilization = plan.utilization();
    if utilization >= plan.alert_threshold && cooled_down(plan, now) {
        alerts.push(AlertPayload {
            alert_type: AlertType::BudgetThreshold,
            title: "Budget threshold reached".to_string(),
            message: format!("Budget '{}' is {:.0}% spent", plan.name, utilization * 100.0),
            priority: if utilization >= 0.9 {
                AlertPriority::High
            } else {
                AlertPriority::Medium
            },
            data: json!({
                "budget_id": plan.id,
                "utilization": utilization,
                "alert_threshold": plan.alert_threshold,
            }),
        });
    }

    let days_passed = plan.days_passed(today);
    if days_passed > 0 {
        let expected = plan.total_amount / plan.total_days() as f64 * days_passed as f64;
        if plan.spent_amount > expected * SPENDING_RATE_FACTOR {
            alerts.push(AlertPayload {
                alert_type: AlertType::SpendingRate,
                title: "Spending pace".to_string(),
                message: "You're spending faster than planned".to_string(),
                priority: AlertPriority::Medium,
                data: json!({
                    "budget_id": plan.id,
                    "expected_spending": expected,
                    "spent_amount": plan.spent_amount,
                }),
            });
        }
    }

    alerts
}

/// Evaluate alerts and record the threshold alert as sent
pub fn check_budget_alerts(
    plan: &mut BudgetPlan,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Vec<AlertPayload> {
    let alerts = budget_alerts(plan, today, now);
    if alerts
        .iter()
        .any(|a| a.alert_type == AlertType::BudgetThreshold)
    {
        plan.last_alert_at = Some(now);
    }
    alerts
}

/// Status notification for a budget, tiered by fraction spent
pub fn budget_notification(plan: &BudgetPlan, today: NaiveDate) -> AlertPayload {
    let spent = plan.utilization();
    let remaining_days = (plan.end_date - today).num_days().max(0);
    let percent = spent * 100.0;

    let (title, message, priority) = if spent >= 0.9 {
        (
            "Budget Critical Alert",
            format!(
                "Your budget '{}' is {:.0}% spent! You have {} days remaining.",
                plan.name, percent, remaining_days
            ),
            AlertPriority::Critical,
        )
    } else if spent >= 0.8 {
        (
            "Budget Alert",
            format!(
                "Your budget '{}' is {:.0}% spent. {} days remaining.",
                plan.name, percent, remaining_days
            ),
            AlertPriority::High,
        )
    } else {
        (
            "Budget Update",
            format!("Your budget '{}' is on track: {:.0}% spent.", plan.name, percent),
            AlertPriority::Medium,
        )
    };

    AlertPayload {
        alert_type: AlertType::BudgetNotification,
        title: title.to_string(),
        message,
        priority,
        data: json!({
            "budget_id": plan.id,
            "budget_name": plan.name,
            "spent_percentage": spent,
            "remaining_days": remaining_days,
        }),
    }
}

/// Deadline reminder for a scholarship; None once the deadline has passed
pub fn scholarship_deadline_alert(
    scholarship: &Scholarship,
    today: NaiveDate,
) -> Option<AlertPayload> {
    let days = (scholarship.application_end_date - today).num_days();
    if days < 0 {
        return None;
    }
    let name = &scholarship.name;

    let (title, message, priority) = if days <= 1 {
        (
            "Scholarship Deadline Today!",
            format!("Apply for '{}' before it closes today!", name),
            AlertPriority::Critical,
        )
    } else if days <= 3 {
        (
            "Scholarship Deadline Soon",
            format!("'{}' closes in {} days!", name, days),
            AlertPriority::High,
        )
    } else if days <= 7 {
        (
            "Scholarship Reminder",
            format!("'{}' application due in {} days.", name, days),
            AlertPriority::Medium,
        )
    } else {
        (
            "Scholarship Opportunity",
            format!("New scholarship match: '{}'", name),
            AlertPriority::Low,
        )
    };

    Some(AlertPayload {
        alert_type: AlertType::ScholarshipDeadline,
        title: title.to_string(),
        message,
        priority,
        data: json!({
            "scholarship_id": scholarship.id,
            "scholarship_name": name,
            "days_until_deadline": days,
        }),
    })
}
