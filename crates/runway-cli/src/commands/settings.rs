//! Config command implementation

use std::path::Path;

use anyhow::Result;
use runway_core::config::default_config_path;
use runway_core::ForecastConfig;

/// Describe where the effective configuration came from
pub fn config_source(explicit: Option<&Path>) -> String {
    if let Some(path) = explicit {
        return path.display().to_string();
    }
    if let Ok(path) = std::env::var("RUNWAY_CONFIG") {
        return format!("{} (RUNWAY_CONFIG)", path);
    }
    match default_config_path() {
        Some(path) if path.exists() => path.display().to_string(),
        _ => "built-in defaults".to_string(),
    }
}

pub fn cmd_config(config: &ForecastConfig, explicit: Option<&Path>) -> Result<()> {
    println!("# Source: {}", config_source(explicit));
    println!("{}", config.to_toml()?);
    Ok(())
}
