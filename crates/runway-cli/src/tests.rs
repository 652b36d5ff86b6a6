//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::io::Write;

use runway_core::ForecastConfig;
use tempfile::NamedTempFile;

use crate::commands::{self, truncate};

fn seeded_config() -> ForecastConfig {
    ForecastConfig {
        seed: Some(11),
        ..ForecastConfig::default()
    }
}

/// Twelve months of salary, rent and groceries as CSV
fn history_csv() -> String {
    let mut csv = String::from("date,description,amount,category,type\n");
    for m in 1..=12 {
        csv.push_str(&format!("2024-{:02}-01,ACME PAYROLL,\"$4,000.00\",Salary,income\n", m));
        csv.push_str(&format!("2024-{:02}-04,CITY LOFTS RENT,-1650.00,Housing,expense\n", m));
        csv.push_str(&format!("2024-{:02}-09,POWER CO,-95.00,Utilities,\n", m));
        csv.push_str(&format!("2024-{:02}-14,FARMERS MARKET,(210.00),Groceries,\n", m));
        csv.push_str(&format!("2024-{:02}-27,GAS STATION,-48.00,Transport,\n", m));
    }
    csv
}

fn temp_file(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

// ========== Input Loading Tests ==========

#[test]
fn test_parse_csv_records() {
    let value = commands::parse_csv(history_csv().as_bytes()).unwrap();
    let records = value.as_array().unwrap();
    assert_eq!(records.len(), 60);
    assert_eq!(records[0]["amount"], "$4,000.00");
    assert_eq!(records[0]["type"], "income");
    // Empty columns are left out so the normalizer can apply its defaults
    assert!(records[2].get("type").is_none());
}

#[test]
fn test_parse_csv_requires_date_and_amount() {
    let result = commands::parse_csv("when,what\n2024-01-01,coffee\n".as_bytes());
    assert!(result.is_err());
}

#[test]
fn test_load_transactions_csv_normalizes() {
    let file = temp_file(".csv", &history_csv());
    let value = commands::load_transactions(file.path()).unwrap();
    let data = runway_core::normalize_value(&value).unwrap();
    assert_eq!(data.transactions.len(), 60);
    assert!(data.dropped.is_empty());
    assert!((data.summary.current_balance - 12.0 * 1997.0).abs() < 1e-6);
}

#[test]
fn test_load_transactions_json() {
    let file = temp_file(
        ".json",
        r#"[{"date": "2024-01-02", "description": "Coffee", "amount": -4.5}]"#,
    );
    let value = commands::load_transactions(file.path()).unwrap();
    assert_eq!(value.as_array().unwrap().len(), 1);
}

#[test]
fn test_load_transactions_invalid_json() {
    let file = temp_file(".json", "{ not json");
    assert!(commands::load_transactions(file.path()).is_err());
}

#[test]
fn test_load_scenarios() {
    let file = temp_file(
        ".json",
        r#"[{"type": "salary_change", "parameters": {"percent": 5}},
            {"type": "one_time_expense", "parameters": {"amount": 1200}}]"#,
    );
    let scenarios = commands::load_scenarios(file.path()).unwrap();
    assert_eq!(scenarios.len(), 2);
    assert_eq!(scenarios[1].kind, "one_time_expense");
}

#[test]
fn test_load_scenarios_rejects_object() {
    let file = temp_file(".json", r#"{"type": "salary_change"}"#);
    assert!(commands::load_scenarios(file.path()).is_err());
}

// ========== Command Tests ==========

#[tokio::test]
async fn test_cmd_forecast_text() {
    let file = temp_file(".csv", &history_csv());
    let result =
        commands::cmd_forecast(&seeded_config(), file.path(), None, None, true, false).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cmd_forecast_json_with_scenarios() {
    let file = temp_file(".csv", &history_csv());
    let scenarios = temp_file(
        ".json",
        r#"[{"type": "expense_change", "parameters": {"percent": 10}}]"#,
    );
    let result = commands::cmd_forecast(
        &seeded_config(),
        file.path(),
        Some(scenarios.path()),
        Some(5),
        true,
        true,
    )
    .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cmd_forecast_non_list_is_fatal() {
    let file = temp_file(".json", r#"{"date": "2024-01-01", "amount": 5}"#);
    let result =
        commands::cmd_forecast(&seeded_config(), file.path(), None, None, true, false).await;
    let err = result.unwrap_err();
    assert!(format!("{:#}", err).contains("list"));
}

#[test]
fn test_cmd_patterns() {
    let file = temp_file(".csv", &history_csv());
    assert!(commands::cmd_patterns(&seeded_config(), file.path(), false).is_ok());
    assert!(commands::cmd_patterns(&seeded_config(), file.path(), true).is_ok());
}

#[test]
fn test_cmd_patterns_empty_input() {
    let file = temp_file(".json", "[]");
    assert!(commands::cmd_patterns(&seeded_config(), file.path(), false).is_err());
}

#[test]
fn test_cmd_backtest() {
    let file = temp_file(".csv", &history_csv());
    assert!(commands::cmd_backtest(&seeded_config(), file.path()).is_ok());
}

#[test]
fn test_cmd_config() {
    assert!(commands::cmd_config(&ForecastConfig::default(), None).is_ok());
}

#[test]
fn test_config_source_explicit() {
    let path = std::path::Path::new("/tmp/custom.toml");
    assert_eq!(commands::config_source(Some(path)), "/tmp/custom.toml");
}

// ========== Formatting Tests ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("a much longer description", 10), "a much ...");
    assert_eq!(truncate("café crème brûlée", 8), "café ...");
}

#[test]
fn test_money() {
    assert_eq!(commands::money(1234.5), "$1234.50");
    assert_eq!(commands::money(-20.0), "-$20.00");
}
