//! JSON parsing helpers for insight generator responses
//!
//! Models often wrap the JSON payload in extra prose, so the outermost
//! object is extracted first. Fields that are missing or have the wrong
//! shape become empty lists.

use serde_json::Value;

use crate::error::{Error, Result};

use super::types::InsightBundle;

/// Parse an insight bundle from a model response
pub fn parse_insights(response: &str) -> Result<InsightBundle> {
    let response = response.trim();
    let start = response.find('{');
    let end = response.rfind('}');

    let json_str = match (start, end) {
        (Some(s), Some(e)) if s < e => &response[s..=e],
        _ => {
            return Err(Error::InvalidData(format!(
                "No JSON found in insight response | Raw: {}",
                truncate(response, 200)
            )))
        }
    };

    let value: Value = serde_json::from_str(json_str).map_err(|e| {
        Error::InvalidData(format!(
            "Invalid JSON from insight generator: {} | Raw: {}",
            e,
            truncate(json_str, 200)
        ))
    })?;

    Ok(InsightBundle {
        strategic_insights: string_list(&value, "strategicInsights"),
        financial_risks: string_list(&value, "financialRisks"),
        opportunities: string_list(&value, "opportunities"),
        recommendations: string_list(&value, "recommendations"),
    })
}

/// Read a list of non-empty strings, tolerating wrong shapes
fn string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}
