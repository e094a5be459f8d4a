//! Sahay Core Library
//!
//! Scoring and recommendation engine for the Sahay student aid platform:
//! - Spending aggregation over expense windows
//! - City cost-of-living index
//! - Rule-based and AI-assisted monthly budget recommendations
//! - Financial stress and dropout risk scoring
//! - Scholarship eligibility and match scoring
//! - Alert payloads for budgets and scholarship deadlines
//! - Pluggable AI text-generation backends (Ollama, OpenAI-compatible, mock)

pub mod ai;
pub mod alerts;
pub mod budget;
pub mod city;
pub mod config;
pub mod error;
pub mod models;
pub mod prompts;
pub mod risk;
pub mod scholarship;
pub mod spending;
pub mod store;

/// Test utilities including mock Ollama server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{
    AIClient, GenerationOptions, MockBackend, MockResponse, OllamaBackend,
    OpenAICompatibleBackend, TextGenerator,
};
pub use alerts::{AlertPayload, AlertPriority, AlertType};
pub use budget::{
    BudgetAnalytics, BudgetGenerator, BudgetRecommendation, CategoryAllocation,
    RecommendationSource,
};
pub use city::city_cost_index;
pub use config::{AiConfig, TaskConfig, TaskKind};
pub use error::{AiError, Error, Result};
pub use models::{
    ApplicationStatus, BudgetPlan, BudgetStatus, CasteCategory, Category, ExpenseRecord, Gender,
    RiskScoreSnapshot, Scholarship, ScholarshipApplication, ScholarshipStatus, StudentProfile,
};
pub use prompts::{Prompt, PromptId, PromptLibrary};
pub use risk::{
    AtRiskStudent, BatchReport, DropoutBreakdown, RiskAssessment, RiskEngine, StressBreakdown,
};
pub use scholarship::{ScholarshipMatch, ScholarshipMatcher};
pub use spending::{DateWindow, SpendingSummary};
pub use store::{Dataset, InMemoryStore, StudentDataSource};
