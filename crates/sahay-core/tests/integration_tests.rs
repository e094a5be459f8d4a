//! Integration tests for sahay-core
//!
//! These tests exercise the load → score → recommend workflow against an
//! in-memory dataset, and the HTTP AI backend against a mock Ollama server
//! (with the `test-utils` feature).

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sahay_core::{
    alerts::{budget_alerts, scholarship_deadline_alert},
    budget::{budget_analytics, rule_based_budget},
    AIClient, AiConfig, AlertPriority, AlertType, BudgetGenerator, Category, Dataset,
    InMemoryStore, MockBackend, MockResponse, PromptLibrary, RecommendationSource, RiskEngine,
    ScholarshipMatcher, StudentDataSource,
};

/// Three students:
/// - 1: Mumbai, no allowance, 600000 family income, light spending
/// - 2: Patna, no income data at all
/// - 3: Pune, heavy loan, overspent budget, low CGPA
fn cohort_json() -> &'static str {
    r#"{
  "students": [
    {
      "id": 1, "full_name": "Meera Iyer", "enrollment_number": "MU2022EC101",
      "family_annual_income": 600000, "state": "Maharashtra", "city": "mumbai",
      "course": "B.E. Electronics", "year_of_study": 3, "current_cgpa": 8.4,
      "caste_category": "general", "gender": "female"
    },
    {
      "id": 2, "full_name": "Arjun Singh", "enrollment_number": "PT2024BS007",
      "family_annual_income": 0, "monthly_allowance": 0, "state": "Bihar", "city": "Patna",
      "course": "B.Sc Physics", "year_of_study": 1
    },
    {
      "id": 3, "full_name": "Kiran Patil", "enrollment_number": "PU2021ME033",
      "family_annual_income": 400000, "monthly_allowance": 8000,
      "has_education_loan": true, "education_loan_amount": 300000,
      "state": "Maharashtra", "city": "Pune", "course": "B.Tech Mechanical",
      "year_of_study": 4, "current_cgpa": 6.5, "last_semester_percentage": 64,
      "caste_category": "obc", "gender": "male"
    }
  ],
  "expenses": [
    {"id": 1, "student_id": 1, "amount": 3000, "category": "food", "date": "2024-07-10"},
    {"id": 2, "student_id": 1, "amount": 2000, "category": "transport", "date": "2024-07-12"},
    {"id": 3, "student_id": 3, "amount": 6000, "category": "food", "date": "2024-07-05", "budget_id": 11},
    {"id": 4, "student_id": 3, "amount": 5000, "category": "books", "date": "2024-07-12", "budget_id": 11}
  ],
  "budgets": [
    {
      "id": 11, "student_id": 3, "name": "July essentials", "total_amount": 10000,
      "spent_amount": 11000, "remaining_amount": -1000,
      "categories": {"tuition_fee": 4000, "hostel_fee": 2500, "food": 2500, "books": 1000},
      "start_date": "2024-07-01", "end_date": "2024-07-31"
    }
  ],
  "scholarships": [
    {
      "id": 1, "name": "Post-Matric Scholarship", "amount": 20000,
      "max_income": 250000, "eligible_castes": ["sc", "st"],
      "application_end_date": "2024-07-25", "popularity_score": 0.5,
      "documents_required": ["Caste certificate", "Income certificate"]
    },
    {
      "id": 2, "name": "Merit Scholarship", "amount": 30000, "min_cgpa": 8.0,
      "application_end_date": "2024-08-30", "popularity_score": 0.8
    },
    {
      "id": 3, "name": "Closed Fellowship", "status": "closed", "amount": 90000,
      "application_end_date": "2024-08-30"
    }
  ],
  "applications": [
    {"id": 1, "student_id": 3, "scholarship_id": 2, "status": "under_review"}
  ]
}"#
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 20, 9, 30, 0).unwrap()
}

fn today() -> NaiveDate {
    now().date_naive()
}

fn load_store() -> InMemoryStore {
    let dataset = Dataset::from_json(cohort_json()).expect("Failed to parse dataset");
    InMemoryStore::from_dataset(dataset).expect("Dataset should validate")
}

fn fixtures() -> (PromptLibrary, AiConfig) {
    (
        PromptLibrary::embedded_only(),
        AiConfig::embedded().expect("Embedded config should parse"),
    )
}

// =============================================================================
// Budget Recommendation Tests
// =============================================================================

#[tokio::test]
async fn test_rule_budget_for_mumbai_student() {
    let store = load_store();
    let student = store.student(1).await.unwrap();

    let recommendation = rule_based_budget(&student);
    assert!((recommendation.total_monthly_budget - 75_000.0).abs() < 0.01);
    assert!((recommendation.amount_for(Category::TuitionFee) - 30_000.0).abs() < 0.01);
    assert_eq!(recommendation.source, RecommendationSource::RuleBased);
    recommendation.validate_allocation().unwrap();

    // Identical input, identical output
    assert_eq!(recommendation, rule_based_budget(&student));
}

#[tokio::test]
async fn test_rule_budget_without_income_uses_floor() {
    let store = load_store();
    let student = store.student(2).await.unwrap();

    let recommendation = rule_based_budget(&student);
    // Default base 10000 scaled by the Patna factor
    assert!((recommendation.total_monthly_budget - 8_000.0).abs() < 0.01);
    recommendation.validate_allocation().unwrap();
}

#[tokio::test]
async fn test_failed_ai_generation_equals_rule_based() {
    let store = load_store();
    let student = store.student(1).await.unwrap();
    let expenses = store
        .expenses_between(1, NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(), today())
        .await
        .unwrap();
    let (prompts, config) = fixtures();

    for response in [
        MockResponse::Fail,
        MockResponse::Fixed("I'd suggest spending less on snacks.".to_string()),
    ] {
        let ai = AIClient::Mock(MockBackend::with_response(response));
        let generator = BudgetGenerator::new(Some(&ai), &prompts, &config);
        let recommendation = generator.generate(&student, &expenses, &[], today()).await;
        assert_eq!(recommendation, rule_based_budget(&student));
    }
}

#[tokio::test]
async fn test_ai_budget_saved_as_plan() {
    let store = load_store();
    let student = store.student(1).await.unwrap();
    let (prompts, config) = fixtures();
    let ai = AIClient::mock();

    let recommendation = BudgetGenerator::new(Some(&ai), &prompts, &config)
        .generate(&student, &[], &[], today())
        .await;
    assert_eq!(recommendation.source, RecommendationSource::Ai);
    recommendation.validate_allocation().unwrap();

    let plan = recommendation
        .to_budget_plan(
            21,
            1,
            "August plan",
            NaiveDate::from_ymd_opt(2024, 8, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 8, 31).unwrap(),
        )
        .unwrap();
    assert!(plan.ai_generated);
    store.save_budget(plan).await.unwrap();
    assert_eq!(store.budget(21).await.unwrap().student_id, 1);
}

// =============================================================================
// Risk Scoring Tests
// =============================================================================

#[tokio::test]
async fn test_risk_flow_with_ai_failure() {
    let store = load_store();
    let (prompts, config) = fixtures();
    let ai = AIClient::Mock(MockBackend::unhealthy());
    let engine = RiskEngine::new(&store, Some(&ai), &prompts, &config);

    let assessment = engine.assess(3, true, now()).await.unwrap();
    // Every stress sub-score saturates for student 3
    assert_eq!(assessment.financial_stress_score, 100.0);
    assert_eq!(assessment.stress.debt_burden, 100.0);
    assert_eq!(assessment.stress.budget_compliance, 100.0);
    // 60 + 40*0.2 + 100*0.1 (one undecided application) + 60*0.1
    assert_eq!(assessment.dropout_risk_score, 84.0);
    assert!(!assessment.ai_enriched);
    assert_eq!(assessment.recommendations.len(), 5);
    assert!(assessment.recommendations[0].contains("emergency scholarships"));
    assert_eq!(assessment.factors["debt_burden"], 75.0);
}

#[tokio::test]
async fn test_student_without_income_scores_saturated_not_error() {
    let store = load_store();
    let (prompts, config) = fixtures();
    let engine = RiskEngine::new(&store, None, &prompts, &config);

    let stress = engine.financial_stress(2, now()).await.unwrap();
    assert_eq!(stress.expense_ratio, 100.0);
    assert_eq!(stress.savings_buffer, 0.0);
    assert_eq!(stress.budget_compliance, 50.0);
    assert!((stress.score - 47.5).abs() < 1e-9);
}

#[tokio::test]
async fn test_at_risk_scan_and_recompute() {
    let store = load_store();
    let (prompts, config) = fixtures();
    let engine = RiskEngine::new(&store, None, &prompts, &config);

    let at_risk = engine.at_risk_students(70.0, 100, now()).await.unwrap();
    assert_eq!(at_risk.len(), 1);
    assert_eq!(at_risk[0].student_id, 3);
    assert_eq!(at_risk[0].enrollment_number.as_deref(), Some("PU2021ME033"));

    let report = engine.recompute_all(now()).await.unwrap();
    assert_eq!(report.updated, 3);
    assert!(report.failed.is_empty());

    for id in 1..=3 {
        let snapshot = store.student(id).await.unwrap().latest_risk.unwrap();
        assert!((0.0..=100.0).contains(&snapshot.financial_stress_score));
        assert!((0.0..=100.0).contains(&snapshot.dropout_risk_score));
        assert_eq!(snapshot.computed_at, now());
    }
}

#[tokio::test]
async fn test_unknown_student_is_not_found() {
    let store = load_store();
    let (prompts, config) = fixtures();
    let engine = RiskEngine::new(&store, None, &prompts, &config);
    let err = engine.update_snapshot(99, now()).await.unwrap_err();
    assert!(matches!(err, sahay_core::Error::NotFound(_)));
}

// =============================================================================
// Scholarship and Alert Tests
// =============================================================================

#[tokio::test]
async fn test_scholarship_matching_from_store() {
    let store = load_store();
    let student = store.student(3).await.unwrap();
    let scholarships = store.scholarships().await.unwrap();
    let applications = store.applications(3).await.unwrap();

    let matches = ScholarshipMatcher::new().match_for(&student, &scholarships, &applications, today());
    let ids: Vec<i64> = matches.iter().map(|m| m.scholarship_id).collect();
    assert_eq!(ids, vec![2, 1]);

    assert!((matches[0].match_score - 0.66).abs() < 1e-9);
    assert_eq!(matches[0].application_status, "under_review");
    assert_eq!(matches[0].reasons[0], "Good match for your profile");

    assert!((matches[1].eligibility_score - 0.5).abs() < 1e-9);
    assert_eq!(matches[1].reasons[0], "Partial match - check eligibility criteria");
    assert_eq!(matches[1].days_to_deadline, 5);
    assert_eq!(matches[1].documents_required.len(), 2);
}

#[tokio::test]
async fn test_alerts_for_overspent_budget() {
    let store = load_store();
    let plan = store.budget(11).await.unwrap();

    let alerts = budget_alerts(&plan, today(), now());
    let threshold = alerts
        .iter()
        .find(|a| a.alert_type == AlertType::BudgetThreshold)
        .expect("threshold alert");
    assert_eq!(threshold.priority, AlertPriority::High);
    assert!(alerts.iter().any(|a| a.alert_type == AlertType::SpendingRate));

    let expenses = store
        .expenses_between(3, plan.start_date, plan.end_date)
        .await
        .unwrap();
    let analytics = budget_analytics(&plan, &expenses, today(), now());
    assert_eq!(analytics.category_spending[&Category::Books], 5_000.0);
    assert!(analytics
        .recommendations
        .contains(&"Reduce spending in books".to_string()));

    let scholarship = &store.scholarships().await.unwrap()[0];
    let deadline = scholarship_deadline_alert(scholarship, today()).unwrap();
    assert_eq!(deadline.priority, AlertPriority::Medium);
}

// =============================================================================
// HTTP Backend Tests (mock Ollama server)
// =============================================================================

#[cfg(feature = "test-utils")]
mod http_backend {
    use super::*;
    use sahay_core::test_utils::MockOllamaServer;
    use sahay_core::TextGenerator;

    #[tokio::test]
    async fn test_budget_over_http() {
        let server = MockOllamaServer::start().await;
        let ai = AIClient::ollama(&server.url(), "llama3.2");
        assert!(ai.health_check().await);

        let store = load_store();
        let student = store.student(1).await.unwrap();
        let (prompts, config) = fixtures();
        let recommendation = BudgetGenerator::new(Some(&ai), &prompts, &config)
            .generate(&student, &[], &[], today())
            .await;

        assert_eq!(recommendation.source, RecommendationSource::Ai);
        assert!(recommendation
            .recommendations
            .iter()
            .any(|r| r.contains("roommates")));
    }

    #[tokio::test]
    async fn test_garbage_over_http_falls_back() {
        let server = MockOllamaServer::start_with_response("Sorry, I can't help with that.").await;
        let ai = AIClient::ollama(&server.url(), "llama3.2");

        let store = load_store();
        let student = store.student(1).await.unwrap();
        let (prompts, config) = fixtures();
        let recommendation = BudgetGenerator::new(Some(&ai), &prompts, &config)
            .generate(&student, &[], &[], today())
            .await;

        assert_eq!(recommendation, rule_based_budget(&student));
    }

    #[tokio::test]
    async fn test_risk_insights_over_http() {
        let server = MockOllamaServer::start().await;
        let ai = AIClient::ollama(&server.url(), "llama3.2");

        let store = load_store();
        let (prompts, config) = fixtures();
        let engine = RiskEngine::new(&store, Some(&ai), &prompts, &config);
        let assessment = engine.assess(1, true, now()).await.unwrap();

        assert!(assessment.ai_enriched);
        assert_eq!(assessment.factors["academic_pressure"], 30.0);
    }

    #[tokio::test]
    async fn test_unreachable_server_falls_back() {
        let ai = AIClient::ollama("http://127.0.0.1:9", "llama3.2");
        assert!(!ai.health_check().await);

        let store = load_store();
        let student = store.student(1).await.unwrap();
        let (prompts, config) = fixtures();
        let recommendation = BudgetGenerator::new(Some(&ai), &prompts, &config)
            .generate(&student, &[], &[], today())
            .await;
        assert_eq!(recommendation.source, RecommendationSource::RuleBased);
    }
}
