//! Prompt Library for AI budget and risk requests
//!
//! Prompts are loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/sahay/prompts/overrides/)
//! 2. Fall back to embedded defaults (compiled into binary)

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Embedded default prompts (compiled into binary)
mod defaults {
    pub const BUDGET_RECOMMENDATION: &str =
        include_str!("../../../prompts/budget_recommendation.md");
    pub const RISK_ANALYSIS: &str = include_str!("../../../prompts/risk_analysis.md");
}

/// Known prompt IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptId {
    BudgetRecommendation,
    RiskAnalysis,
}

impl PromptId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BudgetRecommendation => "budget_recommendation",
            Self::RiskAnalysis => "risk_analysis",
        }
    }

    pub fn all() -> &'static [PromptId] {
        &[Self::BudgetRecommendation, Self::RiskAnalysis]
    }

    fn default_content(&self) -> &'static str {
        match self {
            Self::BudgetRecommendation => defaults::BUDGET_RECOMMENDATION,
            Self::RiskAnalysis => defaults::RISK_ANALYSIS,
        }
    }
}

/// Prompt frontmatter metadata
#[derive(Debug, Clone, Deserialize)]
pub struct PromptMetadata {
    pub id: String,
    pub version: u32,
    /// AI task this prompt is configured under
    pub task: String,
}

/// A loaded prompt with metadata and content
#[derive(Debug, Clone)]
pub struct Prompt {
    pub metadata: PromptMetadata,
    pub content: String,
    pub is_override: bool,
    pub override_path: Option<PathBuf>,
}

impl Prompt {
    pub fn system_section(&self) -> Option<&str> {
        extract_section(&self.content, "# System")
    }

    pub fn user_section(&self) -> Option<&str> {
        extract_section(&self.content, "# User")
    }

    /// Render system and user sections as a single completion prompt
    pub fn render(&self, vars: &HashMap<&str, String>) -> String {
        let body = match (self.system_section(), self.user_section()) {
            (Some(system), Some(user)) => format!("{}\n\n{}", system, user),
            (None, Some(user)) => user.to_string(),
            _ => self.content.clone(),
        };
        substitute(&body, vars)
    }
}

/// Prompt library for loading prompts
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    override_dir: Option<PathBuf>,
}

impl PromptLibrary {
    /// Create a prompt library with the default override directory
    pub fn new() -> Self {
        Self {
            override_dir: default_prompts_dir(),
        }
    }

    pub fn with_override_dir(path: PathBuf) -> Self {
        Self {
            override_dir: Some(path),
        }
    }

    /// Create a prompt library with no override directory (embedded only)
    pub fn embedded_only() -> Self {
        Self { override_dir: None }
    }

    /// Load a prompt (checking override first, then default)
    pub fn get(&self, id: PromptId) -> Result<Prompt> {
        if let Some(override_path) = self.override_path(id) {
            if override_path.exists() {
                let content = fs::read_to_string(&override_path).map_err(|e| {
                    Error::Config(format!("Failed to read prompt override: {}", e))
                })?;
                let (metadata, body) = parse_prompt(&content)?;
                return Ok(Prompt {
                    metadata,
                    content: body,
                    is_override: true,
                    override_path: Some(override_path),
                });
            }
        }

        let (metadata, body) = parse_prompt(id.default_content())?;
        Ok(Prompt {
            metadata,
            content: body,
            is_override: false,
            override_path: None,
        })
    }

    pub fn has_override(&self, id: PromptId) -> bool {
        self.override_path(id).is_some_and(|p| p.exists())
    }

    pub fn override_dir(&self) -> Option<&PathBuf> {
        self.override_dir.as_ref()
    }

    fn override_path(&self, id: PromptId) -> Option<PathBuf> {
        self.override_dir
            .as_ref()
            .map(|d| d.join(format!("{}.md", id.as_str())))
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::new()
    }
}

/// Default prompts override directory
pub fn default_prompts_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("sahay").join("prompts").join("overrides"))
}

/// Parse a prompt file into metadata and body
fn parse_prompt(content: &str) -> Result<(PromptMetadata, String)> {
    let content = content.trim();

    if !content.starts_with("---") {
        return Err(Error::Config(
            "Prompt must start with YAML frontmatter (---)".into(),
        ));
    }

    let rest = &content[3..];
    let end = rest.find("---").ok_or_else(|| {
        Error::Config("Prompt frontmatter not closed (missing second ---)".into())
    })?;

    let frontmatter = rest[..end].trim();
    let body = rest[end + 3..].trim();

    let metadata: PromptMetadata = serde_yaml::from_str(frontmatter)
        .map_err(|e| Error::Config(format!("Invalid prompt frontmatter: {}", e)))?;

    Ok((metadata, body.to_string()))
}

fn extract_section<'a>(content: &'a str, header: &str) -> Option<&'a str> {
    let start = content.find(header)?;
    let after_header = &content[start + header.len()..];
    let end = after_header.find("\n# ").unwrap_or(after_header.len());
    Some(after_header[..end].trim())
}

/// Replace `{{var}}` placeholders and resolve `{{#if var}}...{{/if}}` blocks
fn substitute(template: &str, vars: &HashMap<&str, String>) -> String {
    let mut result = remove_unmatched_conditionals(template, vars);
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

fn remove_unmatched_conditionals(content: &str, vars: &HashMap<&str, String>) -> String {
    let mut result = content.to_string();

    while let Some(if_start) = result.find("{{#if ") {
        let var_start = if_start + 6;
        let Some(var_end) = result[var_start..].find("}}") else {
            break;
        };
        let var_name = result[var_start..var_start + var_end].to_string();
        let block_start = var_start + var_end + 2;
        let Some(endif_pos) = result[block_start..].find("{{/if}}") else {
            break;
        };
        let full_end = block_start + endif_pos + 7;
        let keep = vars.get(var_name.as_str()).is_some_and(|v| !v.is_empty());

        result = if keep {
            format!(
                "{}{}{}",
                &result[..if_start],
                &result[block_start..block_start + endif_pos],
                &result[full_end..]
            )
        } else {
            format!("{}{}", &result[..if_start], &result[full_end..])
        };
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prompt() {
        let content = r#"---
id: test_prompt
version: 2
task: risk_analysis
---

# System
Be terse.

# User
Student {{name}}.
"#;
        let (metadata, body) = parse_prompt(content).unwrap();
        assert_eq!(metadata.id, "test_prompt");
        assert_eq!(metadata.version, 2);
        assert_eq!(metadata.task, "risk_analysis");
        assert!(body.contains("# User"));
    }

    #[test]
    fn test_missing_frontmatter() {
        assert!(parse_prompt("# User\nhello").is_err());
        assert!(parse_prompt("---\nid: x\n# User").is_err());
    }

    #[test]
    fn test_render_joins_sections() {
        let (metadata, body) =
            parse_prompt("---\nid: t\nversion: 1\ntask: t\n---\n# System\nSys {{a}}\n\n# User\nUser {{b}}")
                .unwrap();
        let prompt = Prompt {
            metadata,
            content: body,
            is_override: false,
            override_path: None,
        };
        let mut vars = HashMap::new();
        vars.insert("a", "one".to_string());
        vars.insert("b", "two".to_string());
        assert_eq!(prompt.render(&vars), "Sys one\n\nUser two");
    }

    #[test]
    fn test_conditional_blocks() {
        let template = "Start{{#if loan}} Loan: {{loan}}{{/if}} End";
        let mut vars = HashMap::new();
        vars.insert("loan", "50000".to_string());
        assert_eq!(substitute(template, &vars), "Start Loan: 50000 End");

        let empty: HashMap<&str, String> = HashMap::new();
        assert_eq!(substitute(template, &empty), "Start End");
    }

    #[test]
    fn test_default_prompts_parse() {
        let lib = PromptLibrary::embedded_only();
        for id in PromptId::all() {
            let prompt = lib.get(*id).unwrap();
            assert_eq!(prompt.metadata.id, id.as_str());
            assert!(!prompt.is_override);
            assert!(prompt.user_section().is_some());
        }
    }

    #[test]
    fn test_override_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("risk_analysis.md"),
            "---\nid: risk_analysis\nversion: 9\ntask: risk_analysis\n---\n# User\nCustom {{city}}",
        )
        .unwrap();

        let lib = PromptLibrary::with_override_dir(dir.path().to_path_buf());
        assert!(lib.has_override(PromptId::RiskAnalysis));
        assert!(!lib.has_override(PromptId::BudgetRecommendation));

        let prompt = lib.get(PromptId::RiskAnalysis).unwrap();
        assert!(prompt.is_override);
        assert_eq!(prompt.metadata.version, 9);

        let mut vars = HashMap::new();
        vars.insert("city", "Pune".to_string());
        assert_eq!(prompt.render(&vars), "Custom Pune");
    }
}
