//! Composite display score for a snippet.
//!
//! The score is additive and unclamped (it can go negative):
//!
//! | Factor | Contribution |
//! |--------|--------------|
//! | Persisted manual `score` | as stored |
//! | Key match (case-insensitive) | exact +20, prefix +15, substring +10, subsequence +5 |
//! | Usage count | ≥10 +15, ≥5 +10, ≥1 +5 |
//! | Recency of last use | ≤1h +10, ≤1d +7, ≤7d +5, ≤30d +3 |
//! | Variable completeness (templates only) | all provided +10, else −5 |
//! | Variable count (templates only) | ≥5 −5, ≥3 −2 |
//! | Favorite | +25 |
//!
//! The result orders search output only; it is never written back to the
//! store's `score` column.

use chrono::{DateTime, Duration, Utc};

use crate::models::Snippet;
use crate::template::VariableInfo;

/// Template-completeness inputs for [`calculate_score`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VariableSignals {
    pub has_variables: bool,
    pub variable_count: usize,
    pub all_variables_provided: bool,
}

impl From<&VariableInfo> for VariableSignals {
    fn from(info: &VariableInfo) -> Self {
        Self {
            has_variables: !info.required_variables.is_empty(),
            variable_count: info.required_variables.len(),
            all_variables_provided: info.has_all_required_variables,
        }
    }
}

/// Score `snippet` for `search_query` against the current time.
pub fn calculate_score(snippet: &Snippet, search_query: &str, signals: VariableSignals) -> i64 {
    calculate_score_at(snippet, search_query, signals, Utc::now())
}

/// Same as [`calculate_score`] with an explicit clock.
pub fn calculate_score_at(
    snippet: &Snippet,
    search_query: &str,
    signals: VariableSignals,
    now: DateTime<Utc>,
) -> i64 {
    let mut bonus = match_quality_score(&snippet.key, search_query)
        + usage_frequency_score(snippet.usage_count)
        + recency_score(snippet.last_used_time, now);

    if signals.has_variables {
        bonus += if signals.all_variables_provided { 10 } else { -5 };
        if signals.variable_count > 0 {
            bonus += complexity_penalty(signals.variable_count);
        }
    }

    if snippet.is_favorite {
        bonus += 25;
    }

    // Stored scores are arbitrary imported integers.
    snippet.score.saturating_add(bonus)
}

fn match_quality_score(key: &str, query: &str) -> i64 {
    if query.is_empty() {
        return 0;
    }
    let key = key.to_lowercase();
    let query = query.to_lowercase();

    if key == query {
        20
    } else if key.starts_with(&query) {
        15
    } else if key.contains(&query) {
        10
    } else if is_subsequence(&query, &key) {
        5
    } else {
        0
    }
}

fn usage_frequency_score(usage_count: i64) -> i64 {
    match usage_count {
        c if c >= 10 => 15,
        c if c >= 5 => 10,
        c if c >= 1 => 5,
        _ => 0,
    }
}

fn recency_score(last_used: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i64 {
    let Some(last_used) = last_used else {
        return 0;
    };
    let elapsed = now - last_used;

    if elapsed <= Duration::hours(1) {
        10
    } else if elapsed <= Duration::days(1) {
        7
    } else if elapsed <= Duration::days(7) {
        5
    } else if elapsed <= Duration::days(30) {
        3
    } else {
        0
    }
}

fn complexity_penalty(variable_count: usize) -> i64 {
    match variable_count {
        c if c >= 5 => -5,
        c if c >= 3 => -2,
        _ => 0,
    }
}

/// True if every char of `needle` appears in `haystack` in order.
pub fn is_subsequence(needle: &str, haystack: &str) -> bool {
    let mut wanted = needle.chars().peekable();
    for c in haystack.chars() {
        match wanted.peek() {
            Some(&w) if w == c => {
                wanted.next();
            }
            Some(_) => {}
            None => break,
        }
    }
    wanted.peek().is_none()
}
