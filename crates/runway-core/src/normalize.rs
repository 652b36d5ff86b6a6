//! Data normalizer
//!
//! Turns loosely-typed transaction records into validated, date-sorted
//! transactions plus a baseline summary. Bad records are dropped and
//! counted, never raised.

use chrono::{DateTime, Datelike, NaiveDate};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{DateRange, RawTransaction, Summary, Transaction, TransactionType};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%m/%d/%y"];

/// A record the normalizer rejected
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DroppedRecord {
    /// Position in the input list
    pub index: usize,
    pub reason: String,
}

/// Output of the normalizer
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedData {
    pub transactions: Vec<Transaction>,
    pub summary: Summary,
    pub dropped: Vec<DroppedRecord>,
}

impl NormalizedData {
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

/// Normalize a JSON document that should hold a list of transaction records
///
/// Fails only when the document is not a list. Elements that are not
/// records are dropped like any other invalid record.
pub fn normalize_value(value: &Value) -> Result<NormalizedData> {
    let items = value.as_array().ok_or_else(|| {
        Error::Validation("transaction input must be a list of records".into())
    })?;

    let mut raw = Vec::with_capacity(items.len());
    let mut dropped = Vec::new();
    let mut positions = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        match serde_json::from_value::<RawTransaction>(item.clone()) {
            Ok(record) if item.is_object() => {
                raw.push(record);
                positions.push(index);
            }
            Ok(_) => dropped.push(DroppedRecord {
                index,
                reason: "record is not an object".to_string(),
            }),
            Err(e) => dropped.push(DroppedRecord {
                index,
                reason: format!("malformed record: {}", e),
            }),
        }
    }

    let mut data = normalize(&raw);
    // Re-map indexes from the filtered list back to the original document
    for record in &mut data.dropped {
        record.index = positions[record.index];
    }
    data.dropped.extend(dropped);
    data.dropped.sort_by_key(|d| d.index);
    Ok(data)
}

/// Validate and sort raw records
pub fn normalize(raw: &[RawTransaction]) -> NormalizedData {
    let mut transactions = Vec::with_capacity(raw.len());
    let mut dropped = Vec::new();

    for (index, record) in raw.iter().enumerate() {
        match validate_record(record) {
            Ok(tx) => transactions.push(tx),
            Err(reason) => {
                debug!(index, reason = %reason, "Dropping transaction record");
                dropped.push(DroppedRecord { index, reason });
            }
        }
    }

    // Stable sort keeps same-day records in input order
    transactions.sort_by_key(|t| t.date);
    let summary = summarize(&transactions);

    debug!(
        kept = transactions.len(),
        dropped = dropped.len(),
        "Normalized transaction history"
    );

    NormalizedData {
        transactions,
        summary,
        dropped,
    }
}

/// Compute baseline statistics for date-sorted transactions
pub fn summarize(transactions: &[Transaction]) -> Summary {
    let mut total_income = 0.0;
    let mut total_expenses = 0.0;

    for tx in transactions {
        if tx.amount >= 0.0 {
            total_income += tx.amount;
        } else {
            total_expenses += tx.amount.abs();
        }
    }

    let date_range = match (transactions.first(), transactions.last()) {
        (Some(first), Some(last)) => Some(DateRange {
            start: first.date,
            end: last.date,
        }),
        _ => None,
    };

    let months_covered = date_range
        .map(|r| months_between(r.start, r.end) + 1)
        .unwrap_or(0);

    Summary {
        total_income,
        total_expenses,
        net_income: total_income - total_expenses,
        current_balance: transactions.iter().map(|t| t.amount).sum(),
        date_range,
        transaction_count: transactions.len(),
        months_covered,
    }
}

/// Whole calendar months from `start` to `end` (0 when in the same month)
pub fn months_between(start: NaiveDate, end: NaiveDate) -> u32 {
    let a = start.year() * 12 + start.month0() as i32;
    let b = end.year() * 12 + end.month0() as i32;
    (b - a).max(0) as u32
}

fn validate_record(record: &RawTransaction) -> std::result::Result<Transaction, String> {
    let date = record
        .date
        .as_ref()
        .ok_or_else(|| "missing date".to_string())
        .and_then(|v| parse_date(v).ok_or_else(|| format!("unparseable date: {}", v)))?;

    let amount = record
        .amount
        .as_ref()
        .ok_or_else(|| "missing amount".to_string())
        .and_then(|v| parse_amount(v).ok_or_else(|| format!("non-numeric amount: {}", v)))?;

    let kind = record
        .kind
        .as_deref()
        .and_then(|k| k.parse::<TransactionType>().ok())
        .unwrap_or_else(|| TransactionType::from_amount(amount));

    let category = record
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or("Uncategorized");

    Ok(Transaction {
        date,
        description: record.description.clone().unwrap_or_default().trim().to_string(),
        amount,
        category: category.to_string(),
        kind,
    })
}

/// Parse a date from a JSON string in one of the accepted formats
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    let s = value.as_str()?.trim();
    if s.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(date);
        }
    }

    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

/// Parse a finite amount from a JSON number or numeric string
///
/// Strings may carry a currency symbol, thousands separators, or
/// accounting-style parentheses for negatives.
pub fn parse_amount(value: &Value) -> Option<f64> {
    let amount = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let s = s.trim();
            let (negative, body) = if s.starts_with('(') && s.ends_with(')') {
                (true, &s[1..s.len() - 1])
            } else {
                (false, s)
            };
            let cleaned: String = body.chars().filter(|c| !matches!(c, '$' | ',' | ' ')).collect();
            let parsed: f64 = cleaned.parse().ok()?;
            if negative {
                -parsed
            } else {
                parsed
            }
        }
        _ => return None,
    };

    amount.is_finite().then_some(amount)
}
