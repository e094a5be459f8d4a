//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use sahay_core::AlertPriority;

/// Sahay - Budgets, risk scores and scholarship matches for students
#[derive(Parser)]
#[command(name = "sahay")]
#[command(about = "Student financial aid scoring and budgeting engine", long_about = None)]
#[command(version)]
pub struct Cli {
    /// JSON dataset with students, expenses, budgets and scholarships
    #[arg(long, default_value = "sahay.json", global = true)]
    pub data: PathBuf,

    /// Evaluate as of this date (YYYY-MM-DD) instead of today
    #[arg(long, global = true)]
    pub date: Option<NaiveDate>,

    /// Skip the AI backend even if one is configured
    #[arg(long, global = true)]
    pub no_ai: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Recommend a monthly budget for a student
    Budget {
        /// Student ID
        student: i64,

        /// Print the recommendation as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a full risk assessment for a student
    Risk {
        /// Student ID
        student: i64,

        /// Print the assessment as JSON
        #[arg(long)]
        json: bool,
    },

    /// List students whose financial stress is at or above a threshold
    AtRisk {
        /// Stress threshold (0-100)
        #[arg(short, long, default_value = "70")]
        threshold: f64,

        /// Maximum students to list
        #[arg(short, long, default_value = "100")]
        limit: usize,
    },

    /// Recompute risk snapshots for every student
    Recompute {
        /// Write the updated snapshots back to the dataset file
        #[arg(long)]
        write: bool,
    },

    /// Match open scholarships to a student
    Scholarships {
        /// Student ID
        student: i64,

        /// Maximum matches to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show budget and scholarship deadline alerts for a student
    Alerts {
        /// Student ID
        student: i64,

        /// Lowest priority to show (low, medium, high, critical)
        #[arg(short = 'p', long, default_value = "medium")]
        min_priority: AlertPriority,
    },

    /// Show analytics for a budget
    Analytics {
        /// Budget ID
        budget: i64,
    },

    /// Show AI backend status
    Status,

    /// Manage prompt templates
    Prompts {
        #[command(subcommand)]
        action: PromptsAction,
    },
}

#[derive(Subcommand)]
pub enum PromptsAction {
    /// List all prompts and their override status
    List,

    /// Show the content of a prompt
    Show {
        /// Prompt ID (budget_recommendation, risk_analysis)
        id: String,
    },

    /// Show the override directory path
    Path,
}
