//! Test utilities for sahay-core
//!
//! A mock Ollama server for exercising the HTTP backend, plus small fixture
//! builders shared by unit and integration tests.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Json, State},
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::ai::canned_response;
use crate::models::{
    BudgetPlan, BudgetStatus, CasteCategory, Category, ExpenseRecord, Gender, Scholarship,
    ScholarshipStatus, StudentProfile,
};

/// Mock Ollama server for testing and development
pub struct MockOllamaServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockOllamaServer {
    /// Start the mock server with canned budget/risk responses
    pub async fn start() -> Self {
        Self::serve(None).await
    }

    /// Start the mock server returning `response` for every generate call
    pub async fn start_with_response(response: &str) -> Self {
        Self::serve(Some(response.to_string())).await
    }

    async fn serve(fixed: Option<String>) -> Self {
        let app = Router::new()
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_generate))
            .with_state(Arc::new(fixed));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockOllamaServer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Debug, Serialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Debug, Serialize)]
struct ModelInfo {
    name: String,
    modified_at: String,
    size: u64,
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    #[allow(dead_code)]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    model: String,
    response: String,
    done: bool,
}

/// Ollama tags endpoint response (health check)
async fn handle_tags() -> Json<TagsResponse> {
    Json(TagsResponse {
        models: vec![ModelInfo {
            name: "llama3.2:latest".to_string(),
            modified_at: "2024-01-01T00:00:00Z".to_string(),
            size: 2_000_000_000,
        }],
    })
}

/// Ollama generate endpoint
async fn handle_generate(
    State(fixed): State<Arc<Option<String>>>,
    Json(request): Json<GenerateRequest>,
) -> Json<GenerateResponse> {
    let response = match fixed.as_ref() {
        Some(text) => text.clone(),
        None => canned_response(&request.prompt).to_string(),
    };

    Json(GenerateResponse {
        model: request.model,
        response,
        done: true,
    })
}

/// A second-year engineering student in Pune on a 15000 allowance
pub fn student() -> StudentProfile {
    StudentProfile {
        id: 1,
        full_name: "Asha Rao".to_string(),
        enrollment_number: Some("PU2023CS014".to_string()),
        family_annual_income: 360_000.0,
        monthly_allowance: Some(15_000.0),
        has_education_loan: false,
        education_loan_amount: None,
        current_cgpa: Some(7.5),
        last_semester_percentage: Some(78.0),
        caste_category: CasteCategory::General,
        gender: Gender::Female,
        state: "Maharashtra".to_string(),
        city: "Pune".to_string(),
        course: "B.Tech Computer Science".to_string(),
        year_of_study: 2,
        course_duration: 4,
        college: Some("College of Engineering Pune".to_string()),
        is_active: true,
        latest_risk: None,
    }
}

pub fn expense(id: i64, amount: f64, category: Category, date: NaiveDate) -> ExpenseRecord {
    ExpenseRecord {
        id,
        student_id: 1,
        amount,
        category,
        date,
        title: None,
        budget_id: None,
    }
}

/// Active July 2024 budget for student 1 (tuition 40%, hostel 25%, food 25%, books 10%)
pub fn budget_plan(id: i64, total: f64, spent: f64) -> BudgetPlan {
    let categories: BTreeMap<Category, f64> = [
        (Category::TuitionFee, 0.40),
        (Category::HostelFee, 0.25),
        (Category::Food, 0.25),
        (Category::Books, 0.10),
    ]
    .into_iter()
    .map(|(c, share)| (c, total * share))
    .collect();

    BudgetPlan {
        id,
        student_id: 1,
        name: "July budget".to_string(),
        total_amount: total,
        spent_amount: spent,
        remaining_amount: total - spent,
        categories,
        start_date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2024, 7, 31).unwrap(),
        status: BudgetStatus::Active,
        alert_threshold: 0.8,
        ai_generated: false,
        last_alert_at: None,
    }
}

/// An unrestricted active scholarship worth 50000
pub fn scholarship(id: i64, deadline: NaiveDate) -> Scholarship {
    Scholarship {
        id,
        name: format!("Scholarship {}", id),
        provider: Some("State Education Trust".to_string()),
        status: ScholarshipStatus::Active,
        amount: Some(50_000.0),
        min_amount: None,
        max_amount: None,
        min_income: None,
        max_income: None,
        eligible_castes: None,
        eligible_genders: None,
        eligible_courses: None,
        eligible_states: None,
        min_cgpa: None,
        min_percentage: None,
        application_start_date: None,
        application_end_date: deadline,
        documents_required: vec!["Income certificate".to_string()],
        popularity_score: 0.5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{GenerationOptions, OllamaBackend, TextGenerator};

    #[tokio::test]
    async fn test_mock_server_health_check() {
        let server = MockOllamaServer::start().await;
        let client = OllamaBackend::new(&server.url(), "test-model");
        assert!(client.health_check().await);
    }

    #[tokio::test]
    async fn test_mock_server_fixed_response() {
        let server = MockOllamaServer::start_with_response("not json at all").await;
        let client = OllamaBackend::new(&server.url(), "test-model");
        let text = client
            .generate("anything", &GenerationOptions::default())
            .await
            .unwrap();
        assert_eq!(text, "not json at all");
    }

    #[test]
    fn test_fixture_budget_is_valid() {
        assert!(budget_plan(1, 10_000.0, 0.0).validate().is_ok());
    }
}
