//! Shared session setup and status command
//!
//! This module contains:
//! - `Session` - Loaded dataset plus AI client, prompts and config
//! - `resolve_now` - As-of timestamp from `--date`
//! - `cmd_status` - AI backend status

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sahay_core::{
    AIClient, AiConfig, BudgetGenerator, Dataset, InMemoryStore, PromptLibrary, RiskEngine,
    TaskKind, TextGenerator,
};

/// Everything a data command needs
pub struct Session {
    pub store: InMemoryStore,
    pub ai: Option<AIClient>,
    pub prompts: PromptLibrary,
    pub config: AiConfig,
    pub now: DateTime<Utc>,
}

impl Session {
    /// Load a dataset file and configure the AI backend from the environment
    pub fn open(path: &Path, no_ai: bool, date: Option<NaiveDate>) -> Result<Self> {
        let dataset = Dataset::load(path)
            .with_context(|| format!("Failed to load dataset {}", path.display()))?;
        Self::new(dataset, ai_client(no_ai), resolve_now(date))
    }

    pub fn new(dataset: Dataset, ai: Option<AIClient>, now: DateTime<Utc>) -> Result<Self> {
        let store = InMemoryStore::from_dataset(dataset).context("Invalid dataset")?;
        let config = AiConfig::load().context("Failed to load AI config")?;

        Ok(Self {
            store,
            ai,
            prompts: PromptLibrary::new(),
            config,
            now,
        })
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    pub fn engine(&self) -> RiskEngine<'_> {
        RiskEngine::new(&self.store, self.ai.as_ref(), &self.prompts, &self.config)
    }

    pub fn budget_generator(&self) -> BudgetGenerator<'_> {
        BudgetGenerator::new(self.ai.as_ref(), &self.prompts, &self.config)
    }
}

/// Noon UTC on `date`, or the current time
pub fn resolve_now(date: Option<NaiveDate>) -> DateTime<Utc> {
    date.and_then(|d| d.and_hms_opt(12, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or_else(Utc::now)
}

/// AI client from the environment unless disabled
pub fn ai_client(no_ai: bool) -> Option<AIClient> {
    if no_ai {
        None
    } else {
        AIClient::from_env()
    }
}

pub async fn cmd_status(no_ai: bool) -> Result<()> {
    println!("🤖 AI backend\n");

    let Some(ai) = ai_client(no_ai) else {
        if no_ai {
            println!("   Disabled (--no-ai)");
        } else {
            println!("   Not configured (set AI_BACKEND / OLLAMA_HOST)");
        }
        println!("   Budgets and risk use rule-based scoring only.");
        return Ok(());
    };

    println!("   Host:  {}", ai.host());
    println!("   Model: {}", ai.model());
    if ai.health_check().await {
        println!("   ✅ Reachable");
    } else {
        println!("   ❌ Unreachable (rule-based fallback will be used)");
    }

    let config = AiConfig::load().context("Failed to load AI config")?;
    println!();
    println!("{:<25} {:>8}  {}", "TASK", "TIMEOUT", "MODEL");
    println!("{}", "-".repeat(50));
    for task in TaskKind::all() {
        let task_config = config.for_task(*task);
        println!(
            "{:<25} {:>7}s  {}",
            task.as_str(),
            task_config.timeout.as_secs(),
            task_config.model.as_deref().unwrap_or(ai.model())
        );
    }

    Ok(())
}
