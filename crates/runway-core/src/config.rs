//! Forecast configuration
//!
//! Config is loaded with a layered resolution:
//! 1. Explicit path (CLI `--config`)
//! 2. `RUNWAY_CONFIG` environment variable
//! 3. Override in the user config dir (~/.config/runway/forecast.toml)
//! 4. Embedded defaults (compiled into binary)
//!
//! Override files may be partial; missing keys keep their defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../../../config/forecast.toml");

/// Top-level pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Forecast horizons in months
    pub horizons: Vec<u32>,
    /// Monte Carlo draws per horizon
    pub monte_carlo_samples: usize,
    /// Two-sided confidence level for trend intervals
    pub confidence_level: f64,
    /// Horizon used for the percentile scenario variants
    pub scenario_horizon: u32,
    /// Fixed RNG seed; entropy when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub seasonality: SeasonalityConfig,
    pub recurring: RecurringConfig,
    pub projection: ProjectionConfig,
    pub backtest: BacktestConfig,
    pub insights: InsightsConfig,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizons: vec![3, 6, 12, 24, 36],
            monte_carlo_samples: 500,
            confidence_level: 0.95,
            scenario_horizon: 12,
            seed: None,
            seasonality: SeasonalityConfig::default(),
            recurring: RecurringConfig::default(),
            projection: ProjectionConfig::default(),
            backtest: BacktestConfig::default(),
            insights: InsightsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonalityConfig {
    /// Allowed deviation of a monthly index from 1.0
    pub threshold: f64,
}

impl Default for SeasonalityConfig {
    fn default() -> Self {
        Self { threshold: 0.2 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecurringConfig {
    pub min_occurrences: usize,
    pub interval_cv_tolerance: f64,
    pub amount_cv_tolerance: f64,
    pub amount_bucket_width: f64,
    /// Words of the normalized description kept in the group key
    pub description_words: usize,
}

impl Default for RecurringConfig {
    fn default() -> Self {
        Self {
            min_occurrences: 3,
            interval_cv_tolerance: 0.30,
            amount_cv_tolerance: 0.05,
            amount_bucket_width: 50.0,
            description_words: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Largest relative trend shift applied to a single month
    pub max_monthly_trend_shift: f64,
    pub base_volatility: f64,
    pub volatility_per_month: f64,
    pub base_confidence: f64,
    pub confidence_decay_per_month: f64,
    pub pattern_confidence_bonus: f64,
    pub pattern_confidence_cap: f64,
    pub seasonality_bonus: f64,
    pub trend_bonus: f64,
    pub trend_strength_threshold: f64,
    pub min_confidence: f64,
    pub max_confidence: f64,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            max_monthly_trend_shift: 0.10,
            base_volatility: 0.15,
            volatility_per_month: 0.01,
            base_confidence: 0.7,
            confidence_decay_per_month: 0.05,
            pattern_confidence_bonus: 0.03,
            pattern_confidence_cap: 0.15,
            seasonality_bonus: 0.1,
            trend_bonus: 0.1,
            trend_strength_threshold: 2.0,
            min_confidence: 0.3,
            max_confidence: 0.95,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Number of most recent one-month periods to test
    pub periods: u32,
    pub min_train: usize,
    pub min_test: usize,
    /// Mean percentage error below which the model counts as reliable
    pub reliability_threshold_pct: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            periods: 3,
            min_train: 10,
            min_test: 5,
            reliability_threshold_pct: 25.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightsConfig {
    /// none, ollama, heuristic or mock
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            backend: "none".to_string(),
            host: None,
            model: "llama3.2".to_string(),
            timeout_secs: 30,
        }
    }
}

impl InsightsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ForecastConfig {
    /// Load configuration, preferring `path` when given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = load_config(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.horizons.is_empty() {
            return Err(Error::Config("at least one horizon is required".into()));
        }
        if self.horizons.contains(&0) {
            return Err(Error::Config("horizons must be at least one month".into()));
        }
        if self.monte_carlo_samples == 0 {
            return Err(Error::Config("monte_carlo_samples must be positive".into()));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(Error::Config(format!(
                "confidence_level must be in (0, 1), got {}",
                self.confidence_level
            )));
        }
        if self.recurring.min_occurrences < 3 {
            return Err(Error::Config(
                "recurring.min_occurrences must be at least 3".into(),
            ));
        }
        if self.recurring.amount_bucket_width <= 0.0 {
            return Err(Error::Config(
                "recurring.amount_bucket_width must be positive".into(),
            ));
        }
        let p = &self.projection;
        if p.min_confidence > p.max_confidence {
            return Err(Error::Config(
                "projection.min_confidence exceeds max_confidence".into(),
            ));
        }
        Ok(())
    }

    /// Horizon used for scenario variants: the configured one if present,
    /// else the closest configured horizon
    pub fn effective_scenario_horizon(&self) -> u32 {
        if self.horizons.contains(&self.scenario_horizon) {
            return self.scenario_horizon;
        }
        let mut horizons = self.horizons.clone();
        horizons.sort_unstable();
        horizons
            .into_iter()
            .min_by_key(|h| (*h as i64 - self.scenario_horizon as i64).abs())
            .unwrap_or(self.scenario_horizon)
    }

    /// Render as TOML for display
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}

/// Default override location (~/.config/runway/forecast.toml on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("runway").join("forecast.toml"))
}

fn load_config(explicit: Option<&Path>) -> Result<ForecastConfig> {
    if let Some(path) = explicit {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        tracing::debug!(path = %path.display(), "Loaded forecast config");
        return parse_config(&content);
    }

    if let Ok(env_path) = std::env::var("RUNWAY_CONFIG") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            tracing::debug!(path = %path.display(), "Loaded forecast config from RUNWAY_CONFIG");
            return parse_config(&content);
        }
        tracing::warn!(path = %path.display(), "RUNWAY_CONFIG points to a missing file, using defaults");
    }

    if let Some(default_path) = default_config_path() {
        if default_path.exists() {
            let content = fs::read_to_string(&default_path)?;
            return parse_config(&content);
        }
    }

    parse_config(DEFAULT_CONFIG)
}

/// Parse config from TOML content
pub fn parse_config(content: &str) -> Result<ForecastConfig> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_default_config() {
        let config = parse_config(DEFAULT_CONFIG).unwrap();
        assert_eq!(config, ForecastConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config = parse_config("monte_carlo_samples = 100\n[recurring]\nmin_occurrences = 4\n")
            .unwrap();
        assert_eq!(config.monte_carlo_samples, 100);
        assert_eq!(config.recurring.min_occurrences, 4);
        assert_eq!(config.recurring.amount_cv_tolerance, 0.05);
        assert_eq!(config.horizons, vec![3, 6, 12, 24, 36]);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = ForecastConfig {
            horizons: vec![],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = ForecastConfig {
            confidence_level: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ForecastConfig {
            monte_carlo_samples: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_effective_scenario_horizon() {
        let config = ForecastConfig::default();
        assert_eq!(config.effective_scenario_horizon(), 12);

        let config = ForecastConfig {
            horizons: vec![3, 9, 24],
            ..Default::default()
        };
        assert_eq!(config.effective_scenario_horizon(), 9);
    }

    #[test]
    fn test_load_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "horizons = [1, 2]\nseed = 7").unwrap();

        let config = ForecastConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.horizons, vec![1, 2]);
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let result = ForecastConfig::load(Some(Path::new("/nonexistent/runway.toml")));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_to_toml_roundtrips() {
        let config = ForecastConfig {
            seed: Some(42),
            ..Default::default()
        };
        let rendered = config.to_toml().unwrap();
        assert_eq!(parse_config(&rendered).unwrap(), config);
    }
}
