//! JSON parsing helpers for AI backend responses
//!
//! Models often wrap the JSON payload in prose or code fences. These
//! functions locate the first well-formed JSON object and deserialize it.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::AiError;

/// Budget payload as returned by the model, before business rules
#[derive(Debug, Clone, Deserialize)]
pub struct AiBudgetResponse {
    pub total_monthly_budget: f64,
    #[serde(default)]
    pub categories: BTreeMap<String, AiCategoryAllocation>,
    #[serde(default)]
    pub ai_confidence_score: Option<f64>,
    #[serde(default)]
    pub key_recommendations: Vec<String>,
    #[serde(default)]
    pub risk_warnings: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiCategoryAllocation {
    pub amount: f64,
    #[serde(default)]
    pub percentage: f64,
    #[serde(default)]
    pub rationale: String,
}

/// Risk insights returned by the model
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RiskInsights {
    #[serde(default)]
    pub interventions: Vec<String>,
    #[serde(default)]
    pub key_factors: BTreeMap<String, f64>,
    #[serde(default)]
    pub confidence_level: Option<f64>,
}

fn truncate(raw: &str) -> String {
    if raw.chars().count() > 200 {
        format!("{}...", raw.chars().take(200).collect::<String>())
    } else {
        raw.to_string()
    }
}

/// Find the end (inclusive byte index) of the object starting at `start`
fn matching_brace(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Extract the first well-formed JSON object from a model response
pub fn extract_json_object(response: &str) -> Result<serde_json::Value, AiError> {
    let response = response.trim();

    for (start, _) in response.match_indices('{') {
        let Some(end) = matching_brace(response, start) else {
            continue;
        };
        if let Ok(value @ serde_json::Value::Object(_)) =
            serde_json::from_str::<serde_json::Value>(&response[start..=end])
        {
            return Ok(value);
        }
    }

    Err(AiError::Parse(format!(
        "No JSON object found in AI response | Raw: {}",
        truncate(response)
    )))
}

fn parse_object<T: DeserializeOwned>(response: &str, what: &str) -> Result<T, AiError> {
    let value = extract_json_object(response)?;
    serde_json::from_value(value).map_err(|e| {
        AiError::Parse(format!(
            "Invalid {} JSON from AI: {} | Raw: {}",
            what,
            e,
            truncate(response)
        ))
    })
}

/// Parse a budget recommendation response
pub fn parse_budget_response(response: &str) -> Result<AiBudgetResponse, AiError> {
    parse_object(response, "budget")
}

/// Parse a risk insights response
pub fn parse_risk_insights(response: &str) -> Result<RiskInsights, AiError> {
    parse_object(response, "risk insights")
}
