//! Scholarship matching command

use anyhow::Result;
use sahay_core::{ScholarshipMatcher, StudentDataSource};

use super::{truncate, Session};

pub async fn cmd_scholarships(session: &Session, student_id: i64, limit: usize) -> Result<()> {
    let student = session.store.student(student_id).await?;
    let scholarships = session.store.scholarships().await?;
    let applications = session.store.applications(student_id).await?;

    let matches = ScholarshipMatcher::new().with_limit(limit).match_for(
        &student,
        &scholarships,
        &applications,
        session.today(),
    );

    if matches.is_empty() {
        println!("No matching scholarships for {}", student.full_name);
        return Ok(());
    }

    println!("🎓 Scholarships for {}\n", student.full_name);
    for (i, m) in matches.iter().enumerate() {
        println!(
            "{}. {} ({})",
            i + 1,
            m.name,
            m.provider.as_deref().unwrap_or("unknown provider")
        );
        println!(
            "   Match: {:.0}%  Eligibility: {:.0}%  Deadline: {} days  Status: {}",
            m.match_score * 100.0,
            m.eligibility_score * 100.0,
            m.days_to_deadline,
            m.application_status
        );
        for reason in &m.reasons {
            println!("   - {}", reason);
        }
        if !m.documents_required.is_empty() {
            println!(
                "   📄 {}",
                truncate(&m.documents_required.join(", "), 80)
            );
        }
        println!();
    }

    Ok(())
}
