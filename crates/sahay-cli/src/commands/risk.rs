//! Risk command implementations

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use sahay_core::StudentDataSource;

use super::{truncate, Session};

/// Full risk assessment for one student
pub async fn cmd_risk(session: &Session, student_id: i64, json: bool) -> Result<()> {
    let student = session.store.student(student_id).await?;
    let assessment = session
        .engine()
        .assess(student_id, session.ai.is_some(), session.now)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&assessment)?);
        return Ok(());
    }

    println!("🎯 Risk assessment for {}\n", student.full_name);
    println!(
        "   Financial stress: {:>5.1}/100",
        assessment.financial_stress_score
    );
    println!(
        "   Dropout risk:     {:>5.1}/100",
        assessment.dropout_risk_score
    );
    if assessment.ai_enriched {
        println!("   (enriched by AI analysis)");
    }

    println!();
    println!("   {:<24} {:>8}", "FACTOR", "VALUE");
    println!("   {}", "-".repeat(33));
    for (name, value) in &assessment.factors {
        println!("   {:<24} {:>8.1}", truncate(name, 24), value);
    }

    let stress = &assessment.stress;
    println!();
    println!(
        "   Last 30 days: ₹{:.2} spent against ₹{:.2} monthly income",
        stress.monthly_expenses, stress.monthly_income
    );

    if !assessment.recommendations.is_empty() {
        println!("\n💡 Recommendations:");
        for rec in &assessment.recommendations {
            println!("   - {}", rec);
        }
    }

    Ok(())
}

/// List students at or above a stress threshold
pub async fn cmd_at_risk(session: &Session, threshold: f64, limit: usize) -> Result<()> {
    let students = session
        .engine()
        .at_risk_students(threshold, limit, session.now)
        .await?;

    if students.is_empty() {
        println!("✅ No students at or above stress {:.0}", threshold);
        return Ok(());
    }

    println!(
        "⚠️  {} student(s) at or above stress {:.0}\n",
        students.len(),
        threshold
    );
    println!(
        "{:<6} {:<14} {:<24} {:<20} {:>7} {:>8} {:>5}",
        "ID", "ENROLLMENT", "NAME", "COURSE", "STRESS", "DROPOUT", "LOAN"
    );
    println!("{}", "-".repeat(90));
    for s in &students {
        println!(
            "{:<6} {:<14} {:<24} {:<20} {:>7.1} {:>8.1} {:>5}",
            s.student_id,
            truncate(s.enrollment_number.as_deref().unwrap_or("-"), 14),
            truncate(&s.full_name, 24),
            truncate(&s.course, 20),
            s.financial_stress_score,
            s.dropout_risk_score,
            if s.has_education_loan { "yes" } else { "no" }
        );
    }

    Ok(())
}

/// Recompute every student's snapshot, optionally writing the dataset back
pub async fn cmd_recompute(session: &Session, target: Option<&Path>) -> Result<()> {
    let report = session.engine().recompute_all(session.now).await?;

    println!("🔄 Updated {} student(s)", report.updated);
    if !report.failed.is_empty() {
        let ids: Vec<String> = report.failed.iter().map(|id| id.to_string()).collect();
        println!("   ❌ Failed: {}", ids.join(", "));
    }

    if let Some(path) = target {
        let dataset = session.store.to_dataset().await;
        let json = serde_json::to_string_pretty(&dataset)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write dataset {}", path.display()))?;
        println!("   💾 Saved to {}", path.display());
    }

    Ok(())
}
