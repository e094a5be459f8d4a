//! AI budget generation with rule-based fallback

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::ai::parsing::parse_budget_response;
use crate::ai::{AIClient, AiError, TextGenerator};
use crate::city::city_cost_index;
use crate::config::{AiConfig, TaskKind};
use crate::models::{BudgetPlan, Category, ExpenseRecord, StudentProfile};
use crate::prompts::{PromptId, PromptLibrary};
use crate::spending::{summarize, DateWindow};

use super::rules::rule_based_budget;
use super::types::BudgetRecommendation;
use super::validation::apply_business_rules;

/// Days of expense history embedded in the prompt
pub const PROMPT_HISTORY_DAYS: u32 = 90;

/// Produces budget recommendations, preferring the AI path when available
pub struct BudgetGenerator<'a> {
    ai: Option<&'a AIClient>,
    prompts: &'a PromptLibrary,
    config: &'a AiConfig,
}

impl<'a> BudgetGenerator<'a> {
    pub fn new(ai: Option<&'a AIClient>, prompts: &'a PromptLibrary, config: &'a AiConfig) -> Self {
        Self {
            ai,
            prompts,
            config,
        }
    }

    pub fn rule_based(&self, student: &StudentProfile) -> BudgetRecommendation {
        rule_based_budget(student)
    }

    /// Generate a recommendation. Any AI failure yields the rule-based output.
    pub async fn generate(
        &self,
        student: &StudentProfile,
        expenses: &[ExpenseRecord],
        history: &[BudgetPlan],
        today: NaiveDate,
    ) -> BudgetRecommendation {
        let Some(ai) = self.ai else {
            debug!(student_id = student.id, "No AI backend configured, using rule-based budget");
            return rule_based_budget(student);
        };

        match self.generate_with_ai(ai, student, expenses, history, today).await {
            Ok(recommendation) => {
                info!(
                    student_id = student.id,
                    model = ai.model(),
                    total = recommendation.total_monthly_budget,
                    "AI budget recommendation accepted"
                );
                recommendation
            }
            Err(e) => {
                warn!(
                    student_id = student.id,
                    error = %e,
                    "AI budget generation failed, falling back to rule-based allocation"
                );
                rule_based_budget(student)
            }
        }
    }

    async fn generate_with_ai(
        &self,
        ai: &AIClient,
        student: &StudentProfile,
        expenses: &[ExpenseRecord],
        history: &[BudgetPlan],
        today: NaiveDate,
    ) -> Result<BudgetRecommendation, AiError> {
        let prompt = self.build_prompt(student, expenses, history, today)?;
        let task = self.config.for_task(TaskKind::BudgetRecommendation);

        debug!(
            student_id = student.id,
            prompt_len = prompt.len(),
            timeout_secs = task.timeout.as_secs(),
            "Requesting AI budget"
        );

        let raw = tokio::time::timeout(task.timeout, ai.generate(&prompt, &task.generation_options()))
            .await
            .map_err(|_| AiError::Timeout(task.timeout))??;

        let parsed = parse_budget_response(&raw)?;
        apply_business_rules(parsed, student.monthly_income())
    }

    /// Render the budget prompt for a student
    pub fn build_prompt(
        &self,
        student: &StudentProfile,
        expenses: &[ExpenseRecord],
        history: &[BudgetPlan],
        today: NaiveDate,
    ) -> Result<String, AiError> {
        let template = self
            .prompts
            .get(PromptId::BudgetRecommendation)
            .map_err(|e| AiError::Unavailable(format!("budget prompt: {}", e)))?;

        let summary = summarize(expenses, DateWindow::trailing(today, PROMPT_HISTORY_DAYS));

        let mut vars: HashMap<&str, String> = HashMap::new();
        vars.insert("course", student.course.clone());
        vars.insert("year_of_study", student.year_of_study.to_string());
        vars.insert("course_duration", student.course_duration.to_string());
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
        vars.insert(
            "cgpa",
            student
                .known_cgpa()
                .map(|c| format!("{:.2}", c))
                .unwrap_or_else(|| "N/A".to_string()),
        );
        vars.insert("expense_summary", summary.prompt_summary());
        vars.insert("budget_history", budget_history(history));
        vars.insert("category_list", category_list());
        vars.insert("city_factor", format!("{:.2}", city_cost_index(&student.city)));

        Ok(template.render(&vars))
    }
}

fn budget_history(history: &[BudgetPlan]) -> String {
    if history.is_empty() {
        return "No previous budgets".to_string();
    }
    history
        .iter()
        .map(|plan| {
            format!(
                "- {}: ₹{:.2} planned, ₹{:.2} spent ({:.0}% used, {})",
                plan.name,
                plan.total_amount,
                plan.spent_amount,
                plan.utilization() * 100.0,
                plan.status
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn category_list() -> String {
    Category::budget_categories()
        .iter()
        .map(|c| format!("- {} ({})", c.as_str(), c.label()))
        .collect::<Vec<_>>()
        .join("\n")
}
