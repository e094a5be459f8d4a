//! Mock backend for testing
//!
//! Returns canned JSON for the budget and risk prompts, or a scripted
//! response for fallback tests. Useful for unit tests and development
//! without a running LLM server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{AiError, GenerationOptions, TextGenerator};

/// Scripted behaviour for the mock backend
#[derive(Debug, Clone, Default)]
pub enum MockResponse {
    /// Pattern-based canned responses keyed on prompt content
    #[default]
    Canned,
    /// Always return this text
    Fixed(String),
    /// Always fail as if the service were down
    Fail,
    /// Never complete (exercises caller timeouts)
    Hang,
}

/// Mock AI backend for testing
#[derive(Clone)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    response: MockResponse,
    calls: Arc<AtomicUsize>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a new mock backend (healthy, canned responses)
    pub fn new() -> Self {
        Self::with_response(MockResponse::Canned)
    }

    pub fn with_response(response: MockResponse) -> Self {
        Self {
            healthy: true,
            response,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create an unhealthy mock backend that fails every call
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::with_response(MockResponse::Fail)
        }
    }

    /// Number of generate calls made (shared across clones)
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

const CANNED_BUDGET: &str = r#"Here is the budget you asked for:
{
  "total_monthly_budget": 20000,
  "categories": {
    "tuition_fee": {"amount": 7000, "percentage": 35, "rationale": "Semester fees spread monthly"},
    "hostel_fee": {"amount": 5000, "percentage": 25, "rationale": "Shared hostel room"},
    "food": {"amount": 4000, "percentage": 20, "rationale": "Mess plus occasional outside meals"},
    "transport": {"amount": 1200, "percentage": 6, "rationale": "Student bus pass"},
    "books": {"amount": 1000, "percentage": 5, "rationale": "Second-hand textbooks"},
    "medical": {"amount": 600, "percentage": 3, "rationale": "Basic medicines"},
    "entertainment": {"amount": 600, "percentage": 3, "rationale": "Weekend outings"},
    "savings": {"amount": 600, "percentage": 3, "rationale": "Emergency buffer"}
  },
  "ai_confidence_score": 0.85,
  "key_recommendations": ["Cook with roommates to cut food costs", "Use student discounts on transport"],
  "risk_warnings": ["Exam months raise book spending"]
}"#;

const CANNED_RISK: &str = r#"{
  "key_factors": {"fee_pressure": 55, "academic_pressure": 30, "family_support": 40},
  "interventions": ["Apply for the state merit-cum-means scholarship", "Meet the campus financial counsellor"],
  "confidence_level": 0.75
}"#;

/// Canned reply for a prompt, keyed on its output schema
pub fn canned_response(prompt: &str) -> &'static str {
    if prompt.contains("total_monthly_budget") {
        CANNED_BUDGET
    } else if prompt.contains("interventions") {
        CANNED_RISK
    } else {
        "{}"
    }
}

#[async_trait]
impl TextGenerator for MockBackend {
    async fn generate(
        &self,
        prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<String, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match &self.response {
            MockResponse::Fixed(text) => Ok(text.clone()),
            MockResponse::Fail => Err(AiError::Unavailable("mock backend failure".into())),
            MockResponse::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(AiError::Unavailable("mock backend hung".into()))
            }
            MockResponse::Canned => Ok(canned_response(prompt).to_string()),
        }
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
