//! Transaction and scenario file loading
//!
//! Transactions come from a JSON array of records or a CSV file with the
//! headers `date,description,amount,category,type`. Both are turned into a
//! JSON document so the pipeline applies the same validation to each.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use runway_core::ScenarioDescriptor;
use serde_json::{Map, Value};

const CSV_FIELDS: &[&str] = &["date", "description", "amount", "category", "type"];

/// Load a transaction history file as a JSON document
pub fn load_transactions(path: &Path) -> Result<Value> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    if is_csv {
        let file =
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        parse_csv(file).with_context(|| format!("Failed to parse CSV {}", path.display()))
    } else {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON {}", path.display()))
    }
}

/// Parse CSV rows into JSON records, keeping only the known columns
pub fn parse_csv<R: std::io::Read>(reader: R) -> Result<Value> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .context("CSV has no header row")?
        .iter()
        .map(|h| h.to_lowercase())
        .collect();
    if !headers.iter().any(|h| h == "date") || !headers.iter().any(|h| h == "amount") {
        anyhow::bail!("CSV must have at least 'date' and 'amount' columns");
    }

    let mut records = Vec::new();
    for row in rdr.records() {
        let row = row.context("Malformed CSV row")?;
        let mut record = Map::new();
        for (header, value) in headers.iter().zip(row.iter()) {
            if CSV_FIELDS.contains(&header.as_str()) && !value.is_empty() {
                record.insert(header.clone(), Value::String(value.to_string()));
            }
        }
        records.push(Value::Object(record));
    }
    Ok(Value::Array(records))
}

/// Load an ordered list of scenarios
pub fn load_scenarios(path: &Path) -> Result<Vec<ScenarioDescriptor>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Scenario file {} must be a JSON list of {{type, parameters}}", path.display()))
}
