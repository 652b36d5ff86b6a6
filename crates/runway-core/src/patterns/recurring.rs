//! Recurring-transaction mining
//!
//! Groups transactions by a key built from the normalized description, an
//! amount bucket and the category, then keeps groups whose intervals and
//! amounts are consistent enough to be a schedule.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::config::RecurringConfig;
use crate::models::{Frequency, RecurringPattern, Transaction};
use crate::stats::{coefficient_of_variation, mean};

/// Average days in a month, used to normalize pattern amounts
const DAYS_PER_MONTH: f64 = 30.44;

fn non_letter() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\p{L}\s]+").expect("valid regex"))
}

/// Uppercase, strip digits and punctuation, keep the first `words` words
pub fn normalize_description(description: &str, words: usize) -> String {
    let upper = description.to_uppercase();
    non_letter()
        .replace_all(&upper, " ")
        .split_whitespace()
        .take(words)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Group key: normalized description, amount bucket, category
pub fn group_key(tx: &Transaction, config: &RecurringConfig) -> String {
    let bucket = (tx.amount / config.amount_bucket_width).floor() as i64;
    format!(
        "{}|{}|{}",
        normalize_description(&tx.description, config.description_words),
        bucket,
        tx.category.to_lowercase()
    )
}

/// Find recurring patterns in date-sorted transactions
///
/// Results are ordered by confidence, highest first.
pub fn mine_recurring(transactions: &[Transaction], config: &RecurringConfig) -> Vec<RecurringPattern> {
    let mut groups: BTreeMap<String, Vec<&Transaction>> = BTreeMap::new();
    for tx in transactions {
        groups.entry(group_key(tx, config)).or_default().push(tx);
    }

    let mut patterns: Vec<RecurringPattern> = groups
        .into_iter()
        .filter(|(_, members)| members.len() >= config.min_occurrences)
        .filter_map(|(key, members)| evaluate_group(key, members, config))
        .collect();

    patterns.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| a.group_key.cmp(&b.group_key))
    });

    tracing::debug!(count = patterns.len(), "Recurring pattern mining complete");
    patterns
}

fn evaluate_group(
    key: String,
    mut members: Vec<&Transaction>,
    config: &RecurringConfig,
) -> Option<RecurringPattern> {
    members.sort_by_key(|t| t.date);

    let intervals: Vec<f64> = members
        .windows(2)
        .map(|w| (w[1].date - w[0].date).num_days() as f64)
        .collect();
    let amounts: Vec<f64> = members.iter().map(|t| t.amount.abs()).collect();

    // Same-day duplicates have a zero mean interval, which is not a schedule
    let interval_cv = coefficient_of_variation(&intervals)?;
    let amount_cv = coefficient_of_variation(&amounts)?;

    if interval_cv >= config.interval_cv_tolerance || amount_cv >= config.amount_cv_tolerance {
        return None;
    }

    let average_interval_days = mean(&intervals);
    let average_amount = mean(&members.iter().map(|t| t.amount).collect::<Vec<_>>());
    let confidence = (1.0 - (interval_cv + amount_cv)).clamp(0.0, 1.0);

    Some(RecurringPattern {
        group_key: key,
        transactions: members.into_iter().cloned().collect(),
        average_interval_days,
        average_amount,
        confidence,
        frequency: Frequency::from_interval(average_interval_days),
        monthly_amount: average_amount * DAYS_PER_MONTH / average_interval_days,
    })
}
