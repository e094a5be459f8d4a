//! Sahay CLI - Student budget and risk engine
//!
//! Usage:
//!   sahay --data cohort.json budget 12          Recommend a monthly budget
//!   sahay --data cohort.json risk 12            Risk assessment for a student
//!   sahay --data cohort.json at-risk            Students above the stress threshold
//!   sahay --data cohort.json scholarships 12    Scholarship matches

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;
use commands::Session;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let open = || Session::open(&cli.data, cli.no_ai, cli.date);

    match cli.command {
        Commands::Budget { student, json } => commands::cmd_budget(&open()?, student, json).await,
        Commands::Risk { student, json } => commands::cmd_risk(&open()?, student, json).await,
        Commands::AtRisk { threshold, limit } => {
            commands::cmd_at_risk(&open()?, threshold, limit).await
        }
        Commands::Recompute { write } => {
            let target = write.then_some(cli.data.as_path());
            commands::cmd_recompute(&open()?, target).await
        }
        Commands::Scholarships { student, limit } => {
            commands::cmd_scholarships(&open()?, student, limit).await
        }
        Commands::Alerts {
            student,
            min_priority,
        } => commands::cmd_alerts(&open()?, student, min_priority).await,
        Commands::Analytics { budget } => commands::cmd_analytics(&open()?, budget).await,
        Commands::Status => commands::cmd_status(cli.no_ai).await,
        Commands::Prompts { action } => match action {
            PromptsAction::List => commands::cmd_prompts_list(),
            PromptsAction::Show { id } => commands::cmd_prompts_show(&id),
            PromptsAction::Path => commands::cmd_prompts_path(),
        },
    }
}
