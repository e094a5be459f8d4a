//! Budget recommendations and budget plan tracking
//!
//! - `rules`: deterministic allocation from income and city factor
//! - `generator`: AI recommendation with business-rule validation, falling
//!   back to `rules` on any failure
//! - `tracking`: plan validation, spending updates, analytics

pub mod generator;
pub mod rules;
pub mod tracking;
pub mod types;
pub mod validation;

pub use generator::BudgetGenerator;
pub use rules::{rule_based_budget, DEFAULT_MONTHLY_BASE, RULE_CONFIDENCE};
pub use tracking::{budget_analytics, BudgetAnalytics};
pub use types::{BudgetRecommendation, CategoryAllocation, RecommendationSource};
pub use validation::apply_business_rules;
