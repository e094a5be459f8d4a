//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Dataset session, as-of date resolution, AI status
//! - `budget` - Budget recommendation, analytics and alerts
//! - `risk` - Risk assessment, at-risk scan, snapshot recompute
//! - `scholarships` - Scholarship matching
//! - `prompts` - Prompt library management commands

pub mod budget;
pub mod core;
pub mod prompts;
pub mod risk;
pub mod scholarships;

// Re-export command functions for main.rs
pub use budget::*;
pub use core::*;
pub use prompts::*;
pub use risk::*;
pub use scholarships::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Format a rupee amount with two decimals
pub fn rupees(amount: f64) -> String {
    format!("₹{:.2}", amount)
}
