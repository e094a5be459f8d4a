//! Budget command implementations

use anyhow::{Context, Result};
use sahay_core::alerts::{budget_notification, check_budget_alerts, scholarship_deadline_alert};
use sahay_core::budget::{budget_analytics, generator::PROMPT_HISTORY_DAYS};
use sahay_core::spending::summarize;
use sahay_core::{
    city_cost_index, AlertPayload, AlertPriority, DateWindow, ScholarshipMatcher,
    StudentDataSource,
};

use super::{rupees, Session};

/// Recommend a monthly budget for a student
pub async fn cmd_budget(session: &Session, student_id: i64, json: bool) -> Result<()> {
    let student = session.store.student(student_id).await?;
    let window = DateWindow::trailing(session.today(), PROMPT_HISTORY_DAYS);
    let expenses = session
        .store
        .expenses_between(student_id, window.start, window.end)
        .await?;
    let history = session.store.budgets(student_id).await?;

    let recommendation = session
        .budget_generator()
        .generate(&student, &expenses, &history, session.today())
        .await;

    if json {
        println!("{}", serde_json::to_string_pretty(&recommendation)?);
        return Ok(());
    }

    println!(
        "💰 Budget for {} ({}, cost factor {:.2})\n",
        student.full_name,
        student.city,
        city_cost_index(&student.city)
    );
    println!(
        "   Source: {}  |  Confidence: {:.0}%",
        recommendation.source,
        recommendation.confidence_score * 100.0
    );
    println!(
        "   Total:  {}/month\n",
        rupees(recommendation.total_monthly_budget)
    );

    println!("   {:<16} {:>12} {:>7}  {}", "CATEGORY", "AMOUNT", "SHARE", "RATIONALE");
    println!("   {}", "-".repeat(70));
    for (category, allocation) in &recommendation.categories {
        println!(
            "   {:<16} {:>12} {:>6.1}%  {}",
            category.as_str(),
            rupees(allocation.amount),
            allocation.percentage,
            allocation.rationale
        );
    }

    let summary = summarize(&expenses, DateWindow::trailing(session.today(), 30));
    if !summary.is_empty() {
        println!();
        println!(
            "📊 Last 30 days: {} across {} expenses ({}/day)",
            rupees(summary.total_spent),
            summary.expense_count,
            rupees(summary.daily_average)
        );
    }

    if !recommendation.recommendations.is_empty() {
        println!("\n💡 Recommendations:");
        for rec in &recommendation.recommendations {
            println!("   - {}", rec);
        }
    }
    if !recommendation.warnings.is_empty() {
        println!("\n⚠️  Warnings:");
        for warning in &recommendation.warnings {
            println!("   - {}", warning);
        }
    }

    Ok(())
}

/// Show analytics for one budget
pub async fn cmd_analytics(session: &Session, budget_id: i64) -> Result<()> {
    let plan = session.store.budget(budget_id).await?;
    let expenses = session
        .store
        .expenses_between(plan.student_id, plan.start_date, plan.end_date)
        .await?;
    let analytics = budget_analytics(&plan, &expenses, session.today(), session.now);

    println!(
        "📈 {} ({} to {}, {})\n",
        plan.name, plan.start_date, plan.end_date, plan.status
    );
    println!(
        "   Spent {} of {} ({:.0}%), {} remaining",
        rupees(analytics.spent_amount),
        rupees(analytics.total_amount),
        analytics.utilization * 100.0,
        rupees(analytics.remaining_amount)
    );
    println!(
        "   Day {} of {}",
        analytics.days_passed, analytics.total_days
    );
    if let Some(balance) = analytics.projected_end_balance {
        println!("   Projected end balance: {}", rupees(balance));
    }

    if !analytics.category_spending.is_empty() {
        println!();
        println!("   {:<16} {:>12} {:>12} {:>7}", "CATEGORY", "SPENT", "ALLOCATED", "USED");
        println!("   {}", "-".repeat(52));
        for (category, spent) in &analytics.category_spending {
            let allocated = plan.categories.get(category).copied().unwrap_or(0.0);
            let used = analytics
                .category_utilization
                .get(category)
                .map(|u| format!("{:.0}%", u * 100.0))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "   {:<16} {:>12} {:>12} {:>7}",
                category.as_str(),
                rupees(*spent),
                rupees(allocated),
                used
            );
        }
    }

    for rec in &analytics.recommendations {
        println!("   💡 {}", rec);
    }
    print_alerts(&analytics.alerts);

    Ok(())
}

/// Evaluate budget alerts (recording them as sent) and upcoming deadlines,
/// showing those at or above `min_priority`
pub async fn cmd_alerts(
    session: &Session,
    student_id: i64,
    min_priority: AlertPriority,
) -> Result<()> {
    let student = session.store.student(student_id).await?;
    let mut alerts = Vec::new();

    for mut plan in session.store.budgets(student_id).await? {
        if !plan.is_active() {
            continue;
        }
        alerts.push(budget_notification(&plan, session.today()));

        let due = check_budget_alerts(&mut plan, session.today(), session.now);
        if !due.is_empty() {
            session
                .store
                .save_budget(plan)
                .await
                .context("Failed to record alert time")?;
            alerts.extend(due);
        }
    }

    let scholarships = session.store.scholarships().await?;
    let applications = session.store.applications(student_id).await?;
    for matched in
        ScholarshipMatcher::new().match_for(&student, &scholarships, &applications, session.today())
    {
        let Some(scholarship) = scholarships.iter().find(|s| s.id == matched.scholarship_id) else {
            continue;
        };
        alerts.extend(scholarship_deadline_alert(scholarship, session.today()));
    }

    alerts.retain(|a| a.priority >= min_priority);
    alerts.sort_by(|a, b| b.priority.cmp(&a.priority));

    println!("🔔 Alerts for {}\n", student.full_name);
    if alerts.is_empty() {
        println!("   No alerts");
    } else {
        print_alerts(&alerts);
    }
    Ok(())
}

fn print_alerts(alerts: &[AlertPayload]) {
    for alert in alerts {
        let icon = match alert.priority {
            AlertPriority::Critical => "🚨",
            AlertPriority::High => "⚠️ ",
            AlertPriority::Medium => "🔸",
            AlertPriority::Low => "ℹ️ ",
        };
        println!(
            "   {} [{}] {}: {}",
            icon,
            alert.priority.as_str(),
            alert.title,
            alert.message
        );
    }
}
