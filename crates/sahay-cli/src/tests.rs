//! CLI command tests
//!
//! Commands run against a small in-memory cohort with a fixed as-of date.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sahay_core::{AIClient, AlertPriority, Dataset, StudentDataSource};

use crate::commands::{self, resolve_now, rupees, truncate, Session};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 20, 12, 0, 0).unwrap()
}

fn dataset() -> Dataset {
    Dataset::from_json(
        r#"{
  "students": [
    {
      "id": 1, "full_name": "Neha Kulkarni", "enrollment_number": "PU2022CS014",
      "family_annual_income": 300000, "monthly_allowance": 9000,
      "has_education_loan": true, "education_loan_amount": 250000,
      "state": "Maharashtra", "city": "Pune", "course": "B.E. Computer",
      "year_of_study": 1, "current_cgpa": 5.8, "caste_category": "sc", "gender": "female"
    },
    {
      "id": 2, "full_name": "Rahul Verma", "family_annual_income": 900000,
      "state": "Delhi", "city": "Delhi", "course": "B.Com", "year_of_study": 2,
      "is_active": false
    }
  ],
  "expenses": [
    {"id": 1, "student_id": 1, "amount": 7000, "category": "food", "date": "2024-07-08", "budget_id": 5},
    {"id": 2, "student_id": 1, "amount": 2500, "category": "transport", "date": "2024-07-15", "budget_id": 5}
  ],
  "budgets": [
    {
      "id": 5, "student_id": 1, "name": "July", "total_amount": 10000,
      "spent_amount": 9500, "remaining_amount": 500,
      "categories": {"tuition_fee": 3000, "hostel_fee": 2500, "food": 3500, "transport": 1000},
      "start_date": "2024-07-01", "end_date": "2024-07-31"
    }
  ],
  "scholarships": [
    {
      "id": 7, "name": "State Merit-cum-Means", "provider": "Government of Maharashtra",
      "amount": 25000, "max_income": 450000, "eligible_states": ["Maharashtra"],
      "application_end_date": "2024-07-25", "documents_required": ["Income certificate"]
    }
  ],
  "applications": []
}"#,
    )
    .unwrap()
}

fn session() -> Session {
    Session::new(dataset(), None, now()).unwrap()
}

// ========== Helper Tests ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("a long student name", 10), "a long ...");
    assert_eq!(truncate("₹₹₹₹₹₹", 5), "₹₹...");
}

#[test]
fn test_rupees() {
    assert_eq!(rupees(1234.5), "₹1234.50");
}

#[test]
fn test_resolve_now_uses_noon_of_date() {
    let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let resolved = resolve_now(Some(date));
    assert_eq!(resolved.date_naive(), date);
    assert_eq!(resolved, Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
}

#[test]
fn test_session_rejects_invalid_dataset() {
    let mut data = dataset();
    data.expenses[0].student_id = 99;
    assert!(Session::new(data, None, now()).is_err());
}

// ========== Budget Command Tests ==========

#[tokio::test]
async fn test_cmd_budget() {
    let session = session();
    assert!(commands::cmd_budget(&session, 1, false).await.is_ok());
    assert!(commands::cmd_budget(&session, 1, true).await.is_ok());
}

#[tokio::test]
async fn test_cmd_budget_with_mock_ai() {
    let session = Session::new(dataset(), Some(AIClient::mock()), now()).unwrap();
    assert!(commands::cmd_budget(&session, 1, false).await.is_ok());
}

#[tokio::test]
async fn test_cmd_budget_unknown_student() {
    let session = session();
    assert!(commands::cmd_budget(&session, 42, false).await.is_err());
}

#[tokio::test]
async fn test_cmd_analytics() {
    let session = session();
    assert!(commands::cmd_analytics(&session, 5).await.is_ok());
    assert!(commands::cmd_analytics(&session, 6).await.is_err());
}

#[tokio::test]
async fn test_cmd_alerts_records_alert_time() {
    let session = session();
    assert!(commands::cmd_alerts(&session, 1, AlertPriority::Medium)
        .await
        .is_ok());

    let plan = session.store.budget(5).await.unwrap();
    assert_eq!(plan.last_alert_at, Some(now()));
}

#[tokio::test]
async fn test_cmd_alerts_records_alert_time_even_when_filtered_out() {
    let session = session();
    assert!(commands::cmd_alerts(&session, 1, AlertPriority::Critical)
        .await
        .is_ok());

    let plan = session.store.budget(5).await.unwrap();
    assert_eq!(plan.last_alert_at, Some(now()));
}

#[test]
fn test_alerts_min_priority_flag() {
    use clap::Parser;

    use crate::cli::{Cli, Commands};

    let cli = Cli::parse_from(["sahay", "alerts", "1", "--min-priority", "HIGH"]);
    match cli.command {
        Commands::Alerts { min_priority, .. } => assert_eq!(min_priority, AlertPriority::High),
        _ => panic!("expected alerts command"),
    }

    let cli = Cli::parse_from(["sahay", "alerts", "1"]);
    match cli.command {
        Commands::Alerts { min_priority, .. } => assert_eq!(min_priority, AlertPriority::Medium),
        _ => panic!("expected alerts command"),
    }

    assert!(Cli::try_parse_from(["sahay", "alerts", "1", "-p", "urgent"]).is_err());
}

// ========== Risk Command Tests ==========

#[tokio::test]
async fn test_cmd_risk() {
    let session = session();
    assert!(commands::cmd_risk(&session, 1, false).await.is_ok());
    assert!(commands::cmd_risk(&session, 1, true).await.is_ok());
}

#[tokio::test]
async fn test_cmd_risk_with_mock_ai() {
    let session = Session::new(dataset(), Some(AIClient::mock()), now()).unwrap();
    assert!(commands::cmd_risk(&session, 1, false).await.is_ok());
}

#[tokio::test]
async fn test_cmd_at_risk() {
    let session = session();
    assert!(commands::cmd_at_risk(&session, 70.0, 10).await.is_ok());
    assert!(commands::cmd_at_risk(&session, 101.0, 10).await.is_ok());
}

#[tokio::test]
async fn test_cmd_recompute_without_write() {
    let session = session();
    assert!(commands::cmd_recompute(&session, None).await.is_ok());

    let student = session.store.student(1).await.unwrap();
    let snapshot = student.latest_risk.expect("snapshot saved");
    assert_eq!(snapshot.computed_at, now());
}

#[tokio::test]
async fn test_cmd_recompute_writes_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cohort.json");

    let session = session();
    commands::cmd_recompute(&session, Some(&path)).await.unwrap();

    let reloaded = Dataset::load(&path).unwrap();
    assert_eq!(reloaded.students.len(), 2);
    assert!(reloaded.students.iter().all(|s| s.latest_risk.is_some()));

    // The written file opens as a new session
    let reopened = Session::open(&path, true, Some(now().date_naive())).unwrap();
    assert_eq!(reopened.now, now());
}

// ========== Scholarship Command Tests ==========

#[tokio::test]
async fn test_cmd_scholarships() {
    let session = session();
    assert!(commands::cmd_scholarships(&session, 1, 20).await.is_ok());
    assert!(commands::cmd_scholarships(&session, 2, 20).await.is_ok());
    assert!(commands::cmd_scholarships(&session, 3, 20).await.is_err());
}

// ========== Prompt Command Tests ==========

#[test]
fn test_cmd_prompts_list() {
    assert!(commands::cmd_prompts_list().is_ok());
}

#[test]
fn test_cmd_prompts_show() {
    assert!(commands::cmd_prompts_show("budget_recommendation").is_ok());
    assert!(commands::cmd_prompts_show("risk_analysis").is_ok());
    assert!(commands::cmd_prompts_show("classify_merchant").is_err());
}
