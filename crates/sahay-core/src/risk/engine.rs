//! Risk engine: loads a student's records and runs the scorers
//!
//! Batch operations score students independently; one student's failure is
//! logged and skipped.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::ai::parsing::parse_risk_insights;
use crate::ai::{AIClient, AiError, RiskInsights, TextGenerator};
use crate::config::{AiConfig, TaskKind};
use crate::error::Result;
use crate::models::{
    BudgetPlan, ExpenseRecord, RiskScoreSnapshot, ScholarshipApplication, StudentProfile,
};
use crate::prompts::{PromptId, PromptLibrary};
use crate::spending::{summarize, DateWindow};
use crate::store::StudentDataSource;

use super::assessment::{round1, RiskAssessment};
use super::dropout::{dropout_risk, scholarship_success_score, DropoutBreakdown};
use super::stress::{financial_stress, StressBreakdown, STRESS_WINDOW_DAYS};

/// Days of expense history embedded in the risk prompt
pub const RISK_PROMPT_DAYS: u32 = 90;

pub const DEFAULT_AT_RISK_THRESHOLD: f64 = 70.0;
pub const DEFAULT_AT_RISK_LIMIT: usize = 100;

/// A student whose stress score crossed the at-risk threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtRiskStudent {
    pub student_id: i64,
    pub enrollment_number: Option<String>,
    pub full_name: String,
    pub college: Option<String>,
    pub course: String,
    pub financial_stress_score: f64,
    pub dropout_risk_score: f64,
    pub family_income: f64,
    pub has_education_loan: bool,
    pub last_updated: DateTime<Utc>,
}

/// Outcome of a batch snapshot recompute
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub updated: usize,
    pub failed: Vec<i64>,
}

/// Records needed to score one student
struct Inputs {
    student: StudentProfile,
    expenses: Vec<ExpenseRecord>,
    budgets: Vec<BudgetPlan>,
    applications: Vec<ScholarshipApplication>,
}

/// Scores students against a data source, optionally enriched by an AI backend
pub struct RiskEngine<'a> {
    data: &'a dyn StudentDataSource,
    ai: Option<&'a AIClient>,
    prompts: &'a PromptLibrary,
    config: &'a AiConfig,
}

impl<'a> RiskEngine<'a> {
    pub fn new(
        data: &'a dyn StudentDataSource,
        ai: Option<&'a AIClient>,
        prompts: &'a PromptLibrary,
        config: &'a AiConfig,
    ) -> Self {
        Self {
            data,
            ai,
            prompts,
            config,
        }
    }

    async fn load(&self, student_id: i64, now: DateTime<Utc>, days: u32) -> Result<Inputs> {
        let student = self.data.student(student_id).await?;
        let window = DateWindow::trailing(now.date_naive(), days);
        let expenses = self
            .data
            .expenses_between(student_id, window.start, window.end)
            .await?;
        let budgets = self.data.budgets(student_id).await?;
        let applications = self.data.applications(student_id).await?;

        Ok(Inputs {
            student,
            expenses,
            budgets,
            applications,
        })
    }

    fn score(inputs: &Inputs, now: DateTime<Utc>) -> (StressBreakdown, DropoutBreakdown) {
        let stress = financial_stress(
            &inputs.student,
            &inputs.expenses,
            &inputs.budgets,
            now.date_naive(),
        );
        let dropout = dropout_risk(stress.score, &inputs.student, &inputs.applications);

        debug!(
            student_id = inputs.student.id,
            expense_ratio = stress.expense_ratio,
            debt_burden = stress.debt_burden,
            savings_buffer = stress.savings_buffer,
            budget_compliance = stress.budget_compliance,
            stress = stress.score,
            dropout = dropout.score,
            "Scored student"
        );
        (stress, dropout)
    }

    /// Financial stress score with its sub-scores
    pub async fn financial_stress(
        &self,
        student_id: i64,
        now: DateTime<Utc>,
    ) -> Result<StressBreakdown> {
        let inputs = self.load(student_id, now, STRESS_WINDOW_DAYS).await?;
        Ok(Self::score(&inputs, now).0)
    }

    /// Dropout risk score with its weighted contributions
    pub async fn dropout_risk(
        &self,
        student_id: i64,
        now: DateTime<Utc>,
    ) -> Result<DropoutBreakdown> {
        let inputs = self.load(student_id, now, STRESS_WINDOW_DAYS).await?;
        Ok(Self::score(&inputs, now).1)
    }

    /// Full assessment. The rule-based result is always built first; AI
    /// insights are merged only when `use_ai` is set and the call succeeds.
    pub async fn assess(
        &self,
        student_id: i64,
        use_ai: bool,
        now: DateTime<Utc>,
    ) -> Result<RiskAssessment> {
        let inputs = self.load(student_id, now, RISK_PROMPT_DAYS).await?;
        let (stress, dropout) = Self::score(&inputs, now);
        let mut assessment = RiskAssessment::new(
            &inputs.student,
            stress,
            dropout,
            scholarship_success_score(&inputs.applications),
            now,
        );

        if use_ai {
            if let Some(ai) = self.ai {
                match self.ai_insights(ai, &inputs, &assessment, now).await {
                    Ok(insights) => {
                        info!(
                            student_id,
                            interventions = insights.interventions.len(),
                            "AI risk insights merged"
                        );
                        assessment.enrich(insights);
                    }
                    Err(e) => {
                        warn!(student_id, error = %e, "AI risk analysis failed, using rule-based assessment");
                    }
                }
            }
        }

        assessment.finalize();
        Ok(assessment)
    }

    async fn ai_insights(
        &self,
        ai: &AIClient,
        inputs: &Inputs,
        assessment: &RiskAssessment,
        now: DateTime<Utc>,
    ) -> std::result::Result<RiskInsights, AiError> {
        let prompt = self.build_prompt(inputs, assessment, now)?;
        let task = self.config.for_task(TaskKind::RiskAnalysis);

        debug!(
            student_id = inputs.student.id,
            prompt_len = prompt.len(),
            "Requesting AI risk analysis"
        );

        let raw = tokio::time::timeout(task.timeout, ai.generate(&prompt, &task.generation_options()))
            .await
            .map_err(|_| AiError::Timeout(task.timeout))??;
        parse_risk_insights(&raw)
    }

    fn build_prompt(
        &self,
        inputs: &Inputs,
        assessment: &RiskAssessment,
        now: DateTime<Utc>,
    ) -> std::result::Result<String, AiError> {
        let template = self
            .prompts
            .get(PromptId::RiskAnalysis)
            .map_err(|e| AiError::Unavailable(format!("risk prompt: {}", e)))?;

        let student = &inputs.student;
        let summary = summarize(
            &inputs.expenses,
            DateWindow::trailing(now.date_naive(), RISK_PROMPT_DAYS),
        );

        let mut vars: HashMap<&str, String> = HashMap::new();
        vars.insert("course", student.course.clone());
        vars.insert("year_of_study", student.year_of_study.to_string());
        vars.insert("city", student.city.clone());
        vars.insert("state", student.state.clone());
        vars.insert(
            "family_annual_income",
            format!("{:.0}", student.family_annual_income),
        );
        vars.insert(
            "monthly_allowance",
            format!("{:.0}", student.monthly_allowance.unwrap_or(0.0)),
        );
        vars.insert(
            "has_education_loan",
            if student.has_education_loan { "Yes" } else { "No" }.to_string(),
        );
        vars.insert(
            "loan_amount",
            format!("{:.0}", student.loan_amount().unwrap_or(0.0)),
        );
        vars.insert("caste_category", student.caste_category.as_str().to_string());
        vars.insert(
            "cgpa",
            student
                .known_cgpa()
                .map(|c| format!("{:.2}", c))
                .unwrap_or_else(|| "N/A".to_string()),
        );
        vars.insert(
            "stress_score",
            format!("{:.1}", assessment.financial_stress_score),
        );
        vars.insert(
            "dropout_score",
            format!("{:.1}", assessment.dropout_risk_score),
        );
        vars.insert("expense_summary", summary.prompt_summary());

        Ok(template.render(&vars))
    }

    /// Recompute both scores and persist them on the student record
    pub async fn update_snapshot(
        &self,
        student_id: i64,
        now: DateTime<Utc>,
    ) -> Result<RiskScoreSnapshot> {
        let inputs = self.load(student_id, now, STRESS_WINDOW_DAYS).await?;
        let (stress, dropout) = Self::score(&inputs, now);
        let snapshot = RiskAssessment::new(
            &inputs.student,
            stress,
            dropout,
            scholarship_success_score(&inputs.applications),
            now,
        )
        .snapshot();

        self.data.save_snapshot(student_id, snapshot.clone()).await?;
        info!(
            student_id,
            enrollment = inputs.student.enrollment_number.as_deref().unwrap_or("-"),
            stress = round1(snapshot.financial_stress_score),
            dropout = round1(snapshot.dropout_risk_score),
            "Updated risk scores"
        );
        Ok(snapshot)
    }

    /// Active students with stress at or above `threshold`, most stressed first
    pub async fn at_risk_students(
        &self,
        threshold: f64,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<AtRiskStudent>> {
        let students = self.data.list_students().await?;
        let mut at_risk = Vec::new();

        for student in students.iter().filter(|s| s.is_active) {
            let (stress, dropout) = match self.load(student.id, now, STRESS_WINDOW_DAYS).await {
                Ok(inputs) => Self::score(&inputs, now),
                Err(e) => {
                    warn!(student_id = student.id, error = %e, "Skipping student in at-risk scan");
                    continue;
                }
            };
            if stress.score < threshold {
                continue;
            }

            at_risk.push(AtRiskStudent {
                student_id: student.id,
                enrollment_number: student.enrollment_number.clone(),
                full_name: student.full_name.clone(),
                college: student.college.clone(),
                course: student.course.clone(),
                financial_stress_score: round1(stress.score),
                dropout_risk_score: round1(dropout.score),
                family_income: student.family_annual_income,
                has_education_loan: student.has_education_loan,
                last_updated: now,
            });
        }

        at_risk.sort_by(|a, b| {
            b.financial_stress_score
                .total_cmp(&a.financial_stress_score)
                .then(a.student_id.cmp(&b.student_id))
        });
        at_risk.truncate(limit);
        Ok(at_risk)
    }

    /// Update every student's snapshot, collecting failures instead of aborting
    pub async fn recompute_all(&self, now: DateTime<Utc>) -> Result<BatchReport> {
        let students = self.data.list_students().await?;
        let mut report = BatchReport::default();

        for student in &students {
            match self.update_snapshot(student.id, now).await {
                Ok(_) => report.updated += 1,
                Err(e) => {
                    warn!(student_id = student.id, error = %e, "Risk recompute failed");
                    report.failed.push(student.id);
                }
            }
        }

        info!(
            updated = report.updated,
            failed = report.failed.len(),
            "Risk recompute finished"
        );
        Ok(report)
    }
}
