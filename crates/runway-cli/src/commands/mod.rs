//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `input` - Shared loaders for transaction and scenario files
//! - `forecast` - Full pipeline run with text or JSON output
//! - `patterns` - Pattern analysis report
//! - `backtest` - Back-test report
//! - `settings` - Effective configuration display

pub mod backtest;
pub mod forecast;
pub mod input;
pub mod patterns;
pub mod settings;

// Re-export command functions for main.rs
pub use backtest::*;
pub use forecast::*;
pub use input::*;
pub use patterns::*;
pub use settings::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Format a signed dollar amount
pub fn money(amount: f64) -> String {
    if amount < 0.0 {
        format!("-${:.2}", amount.abs())
    } else {
        format!("${:.2}", amount)
    }
}
