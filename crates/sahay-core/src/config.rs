//! AI task configuration
//!
//! Config is loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/sahay/config/ai.toml)
//! 2. Fall back to embedded defaults (compiled into binary)

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::ai::GenerationOptions;
use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/ai.toml");

/// Kinds of AI work the engine requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Structured monthly budget generation
    BudgetRecommendation,
    /// Interventions and key factors for a risk assessment
    RiskAnalysis,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BudgetRecommendation => "budget_recommendation",
            Self::RiskAnalysis => "risk_analysis",
        }
    }

    pub fn all() -> &'static [TaskKind] {
        &[Self::BudgetRecommendation, Self::RiskAnalysis]
    }
}

/// Settings for one task
#[derive(Debug, Clone, PartialEq)]
pub struct TaskConfig {
    pub model: Option<String>,
    pub timeout: Duration,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            model: None,
            timeout: Duration::from_secs(30),
            temperature: 0.2,
            max_tokens: Some(2048),
            top_p: None,
        }
    }
}

impl TaskConfig {
    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            top_p: self.top_p,
        }
    }
}

/// Resolved AI configuration
#[derive(Debug, Clone, Default)]
pub struct AiConfig {
    pub defaults: TaskConfig,
    pub tasks: HashMap<TaskKind, TaskConfig>,
}

impl AiConfig {
    /// Load from the default override location, else embedded defaults
    pub fn load() -> Result<Self> {
        load_config(default_config_path().as_deref())
    }

    /// Load from an explicit override path (embedded defaults if it is missing)
    pub fn load_from(path: &Path) -> Result<Self> {
        load_config(Some(path))
    }

    /// Embedded defaults only
    pub fn embedded() -> Result<Self> {
        parse_config(DEFAULT_CONFIG)
    }

    pub fn for_task(&self, task: TaskKind) -> &TaskConfig {
        self.tasks.get(&task).unwrap_or(&self.defaults)
    }

    pub fn timeout_for(&self, task: TaskKind) -> Duration {
        self.for_task(task).timeout
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("sahay").join("config").join("ai.toml"))
}

fn load_config(override_path: Option<&Path>) -> Result<AiConfig> {
    let content = match override_path {
        Some(path) if path.exists() => fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?,
        _ => DEFAULT_CONFIG.to_string(),
    };
    parse_config(&content)
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    defaults: Option<RawTaskConfig>,
    tasks: Option<HashMap<String, RawTaskConfig>>,
}

#[derive(Debug, Deserialize)]
struct RawTaskConfig {
    model: Option<String>,
    timeout_secs: Option<u64>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    top_p: Option<f32>,
}

fn apply(raw: RawTaskConfig, base: &TaskConfig) -> TaskConfig {
    TaskConfig {
        model: raw.model.or_else(|| base.model.clone()),
        timeout: raw
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(base.timeout),
        temperature: raw.temperature.unwrap_or(base.temperature),
        max_tokens: raw.max_tokens.or(base.max_tokens),
        top_p: raw.top_p.or(base.top_p),
    }
}

fn parse_config(content: &str) -> Result<AiConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let defaults = raw
        .defaults
        .map(|d| apply(d, &TaskConfig::default()))
        .unwrap_or_default();

    let mut tasks = HashMap::new();
    for (name, task_raw) in raw.tasks.unwrap_or_default() {
        let task = match name.as_str() {
            "budget_recommendation" => TaskKind::BudgetRecommendation,
            "risk_analysis" => TaskKind::RiskAnalysis,
            other => {
                tracing::warn!(task = other, "Ignoring unknown AI task in config");
                continue;
            }
        };
        tasks.insert(task, apply(task_raw, &defaults));
    }

    Ok(AiConfig { defaults, tasks })
}
