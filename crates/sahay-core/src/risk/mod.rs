//! Financial stress and dropout risk
//!
//! - `stress`: weighted financial stress score
//! - `dropout`: dropout risk composed from stress and academic signals
//! - `assessment`: explainability factors and recommendations
//! - `engine`: data-source driven scoring, snapshots and batch scans

pub mod assessment;
pub mod dropout;
pub mod engine;
pub mod stress;

pub use assessment::RiskAssessment;
pub use dropout::{dropout_risk, DropoutBreakdown};
pub use engine::{
    AtRiskStudent, BatchReport, RiskEngine, DEFAULT_AT_RISK_LIMIT, DEFAULT_AT_RISK_THRESHOLD,
};
pub use stress::{financial_stress, StressBreakdown};
