//! Domain models for Sahay

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Tolerance for comparing currency sums
pub const AMOUNT_TOLERANCE: f64 = 0.01;

/// Reservation category of a student
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CasteCategory {
    #[default]
    General,
    Obc,
    Sc,
    St,
    Other,
}

impl CasteCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Obc => "obc",
            Self::Sc => "sc",
            Self::St => "st",
            Self::Other => "other",
        }
    }
}

impl std::str::FromStr for CasteCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "general" => Ok(Self::General),
            "obc" => Ok(Self::Obc),
            "sc" => Ok(Self::Sc),
            "st" => Ok(Self::St),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown caste category: {}", s)),
        }
    }
}

impl std::fmt::Display for CasteCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
    #[default]
    PreferNotToSay,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
            Self::PreferNotToSay => "prefer_not_to_say",
        }
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            "other" => Ok(Self::Other),
            "prefer_not_to_say" => Ok(Self::PreferNotToSay),
            _ => Err(format!("Unknown gender: {}", s)),
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Spending / allocation category shared by expenses and budgets
///
/// Declaration order is the canonical allocation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[serde(alias = "tuition_fees", alias = "tuition")]
    TuitionFee,
    #[serde(alias = "hostel_fees", alias = "hostel")]
    HostelFee,
    Food,
    Transport,
    Books,
    Medical,
    Entertainment,
    Savings,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TuitionFee => "tuition_fee",
            Self::HostelFee => "hostel_fee",
            Self::Food => "food",
            Self::Transport => "transport",
            Self::Books => "books",
            Self::Medical => "medical",
            Self::Entertainment => "entertainment",
            Self::Savings => "savings",
            Self::Other => "other",
        }
    }

    /// Human-readable label used in prompts
    pub fn label(&self) -> &'static str {
        match self {
            Self::TuitionFee => "Tuition & Academic Fees",
            Self::HostelFee => "Accommodation & Hostel",
            Self::Food => "Food & Groceries",
            Self::Transport => "Transportation",
            Self::Books => "Books & Study Materials",
            Self::Medical => "Medical & Healthcare",
            Self::Entertainment => "Personal & Entertainment",
            Self::Savings => "Savings & Emergency Fund",
            Self::Other => "Other",
        }
    }

    /// Categories every budget recommendation allocates
    pub fn budget_categories() -> &'static [Category] {
        &[
            Self::TuitionFee,
            Self::HostelFee,
            Self::Food,
            Self::Transport,
            Self::Books,
            Self::Medical,
            Self::Entertainment,
            Self::Savings,
        ]
    }

    /// Categories guaranteed a minimum share of any budget
    pub fn essentials() -> &'static [Category] {
        &[Self::TuitionFee, Self::HostelFee, Self::Food]
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tuition_fee" | "tuition_fees" | "tuition" => Ok(Self::TuitionFee),
            "hostel_fee" | "hostel_fees" | "hostel" => Ok(Self::HostelFee),
            "food" => Ok(Self::Food),
            "transport" => Ok(Self::Transport),
            "books" => Ok(Self::Books),
            "medical" => Ok(Self::Medical),
            "entertainment" => Ok(Self::Entertainment),
            "savings" => Ok(Self::Savings),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A student's profile as read by the scoring engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentProfile {
    pub id: i64,
    pub full_name: String,
    #[serde(default)]
    pub enrollment_number: Option<String>,
    pub family_annual_income: f64,
    #[serde(default)]
    pub monthly_allowance: Option<f64>,
    #[serde(default)]
    pub has_education_loan: bool,
    #[serde(default)]
    pub education_loan_amount: Option<f64>,
    #[serde(default)]
    pub current_cgpa: Option<f64>,
    #[serde(default)]
    pub last_semester_percentage: Option<f64>,
    #[serde(default)]
    pub caste_category: CasteCategory,
    #[serde(default)]
    pub gender: Gender,
    pub state: String,
    pub city: String,
    pub course: String,
    /// 1-based year of study
    pub year_of_study: u8,
    #[serde(default = "default_course_duration")]
    pub course_duration: u8,
    #[serde(default)]
    pub college: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Latest risk snapshot (overwritten on every recompute)
    #[serde(default)]
    pub latest_risk: Option<RiskScoreSnapshot>,
}

fn default_course_duration() -> u8 {
    4
}

fn default_true() -> bool {
    true
}

impl StudentProfile {
    /// Monthly income: the allowance when one is set, else a twelfth of
    /// family income (never negative)
    pub fn monthly_income(&self) -> f64 {
        match self.monthly_allowance {
            Some(allowance) if allowance > 0.0 => allowance,
            _ => (self.family_annual_income / 12.0).max(0.0),
        }
    }

    /// Outstanding education loan, if the loan flag is set
    pub fn loan_amount(&self) -> Option<f64> {
        if self.has_education_loan {
            self.education_loan_amount.filter(|a| *a > 0.0)
        } else {
            None
        }
    }

    /// CGPA when known (a zero CGPA is treated as not reported)
    pub fn known_cgpa(&self) -> Option<f64> {
        self.current_cgpa.filter(|c| *c > 0.0)
    }

    pub fn known_percentage(&self) -> Option<f64> {
        self.last_semester_percentage.filter(|p| *p > 0.0)
    }
}

/// A single expense
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub id: i64,
    pub student_id: i64,
    pub amount: f64,
    pub category: Category,
    pub date: NaiveDate,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub budget_id: Option<i64>,
}

impl ExpenseRecord {
    pub fn validate(&self) -> Result<()> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(Error::Validation(format!(
                "Expense {} amount must be positive, got {}",
                self.id, self.amount
            )));
        }
        Ok(())
    }
}

/// Budget lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    #[default]
    Active,
    Completed,
    Exceeded,
    Cancelled,
    Archived,
}

impl BudgetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Exceeded => "exceeded",
            Self::Cancelled => "cancelled",
            Self::Archived => "archived",
        }
    }
}

impl std::fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A budget plan over a date window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetPlan {
    pub id: i64,
    pub student_id: i64,
    pub name: String,
    pub total_amount: f64,
    #[serde(default)]
    pub spent_amount: f64,
    #[serde(default)]
    pub remaining_amount: f64,
    pub categories: BTreeMap<Category, f64>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub status: BudgetStatus,
    /// Fraction of total spent that triggers an alert
    #[serde(default = "default_alert_threshold")]
    pub alert_threshold: f64,
    #[serde(default)]
    pub ai_generated: bool,
    #[serde(default)]
    pub last_alert_at: Option<DateTime<Utc>>,
}

pub fn default_alert_threshold() -> f64 {
    0.8
}

/// Status of a scholarship listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScholarshipStatus {
    Draft,
    #[default]
    Active,
    Closed,
    Archived,
}

/// A scholarship and its eligibility criteria
///
/// Absent restriction sets mean "no restriction".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scholarship {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub status: ScholarshipStatus,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub min_amount: Option<f64>,
    #[serde(default)]
    pub max_amount: Option<f64>,
    #[serde(default)]
    pub min_income: Option<f64>,
    #[serde(default)]
    pub max_income: Option<f64>,
    #[serde(default)]
    pub eligible_castes: Option<Vec<String>>,
    #[serde(default)]
    pub eligible_genders: Option<Vec<String>>,
    #[serde(default)]
    pub eligible_courses: Option<Vec<String>>,
    #[serde(default)]
    pub eligible_states: Option<Vec<String>>,
    #[serde(default)]
    pub min_cgpa: Option<f64>,
    #[serde(default)]
    pub min_percentage: Option<f64>,
    #[serde(default)]
    pub application_start_date: Option<NaiveDate>,
    pub application_end_date: NaiveDate,
    #[serde(default)]
    pub documents_required: Vec<String>,
    /// Stored popularity in [0, 1]
    #[serde(default)]
    pub popularity_score: f64,
}

impl Scholarship {
    /// Award amount used for need estimation (fixed amount, else the top of the range)
    pub fn award_amount(&self) -> Option<f64> {
        self.amount.or(self.max_amount).filter(|a| *a > 0.0)
    }

    /// Whether applications are accepted on `today`
    pub fn is_open(&self, today: NaiveDate) -> bool {
        self.status == ScholarshipStatus::Active
            && self.application_start_date.map_or(true, |start| start <= today)
            && self.application_end_date >= today
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(start) = self.application_start_date {
            if self.application_end_date <= start {
                return Err(Error::Validation(format!(
                    "Scholarship {} end date {} must be after start date {}",
                    self.id, self.application_end_date, start
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.popularity_score) {
            return Err(Error::Validation(format!(
                "Scholarship {} popularity score {} must be in [0, 1]",
                self.id, self.popularity_score
            )));
        }
        Ok(())
    }
}

/// Status of a student's scholarship application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Draft,
    Submitted,
    UnderReview,
    Approved,
    Rejected,
    Awarded,
    Disbursed,
    Withdrawn,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::UnderReview => "under_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Awarded => "awarded",
            Self::Disbursed => "disbursed",
            Self::Withdrawn => "withdrawn",
        }
    }

    pub fn is_successful(&self) -> bool {
        matches!(self, Self::Approved | Self::Awarded | Self::Disbursed)
    }

    /// Whether the application counts toward the success rate
    pub fn is_considered(&self) -> bool {
        self.is_successful() || matches!(self, Self::Rejected | Self::Submitted | Self::UnderReview)
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScholarshipApplication {
    pub id: i64,
    pub student_id: i64,
    pub scholarship_id: i64,
    pub status: ApplicationStatus,
}

/// Latest persisted risk scores for a student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskScoreSnapshot {
    pub financial_stress_score: f64,
    pub dropout_risk_score: f64,
    #[serde(default)]
    pub factors: BTreeMap<String, f64>,
    pub computed_at: DateTime<Utc>,
}
