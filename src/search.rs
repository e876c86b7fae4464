//! Query pipeline: tokens → variables → candidates → ranking.
//!
//! 1. Leading tokens up to the first `name=value` token form the key term.
//! 2. The remaining tokens are parsed as variable assignments.
//! 3. Candidates come from [`Store::list`] filtered on the key term.
//! 4. Each candidate gets a [`VariableInfo`], a composite score
//!    ([`ranking::calculate_score_at`]) and its expanded text.
//! 5. Sort by score (desc), key (asc), so both backends present the same
//!    order, and truncate to the configured limit.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::models::Snippet;
use crate::ranking::{self, VariableSignals};
use crate::store::Store;
use crate::template::{self, VariableInfo};

/// A tokenized query split into its key term and variable assignments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuery {
    /// Key search term (leading non-assignment tokens joined by spaces).
    pub term: String,
    /// Number of tokens that make up `term`.
    pub skip_count: usize,
    pub variables: HashMap<String, String>,
}

/// One ranked search hit.
#[derive(Debug, Clone, Serialize)]
pub struct RankedSnippet {
    pub snippet: Snippet,
    /// Composite display score.
    pub score: i64,
    pub variables: VariableInfo,
    /// Template with the provided variables substituted.
    pub expanded: String,
}

pub fn parse_query<S: AsRef<str>>(tokens: &[S]) -> ParsedQuery {
    let skip_count = tokens
        .iter()
        .take_while(|t| template::split_assignment(t.as_ref()).is_none())
        .count();

    let term_tokens: Vec<&str> = tokens[..skip_count]
        .iter()
        .map(|t| AsRef::<str>::as_ref(t))
        .filter(|t| !t.is_empty())
        .collect();

    ParsedQuery {
        term: term_tokens.join(" "),
        skip_count,
        variables: template::parse_variable_arguments(tokens, skip_count),
    }
}

/// Score and order `candidates` for `query`.
pub fn rank_candidates(
    candidates: Vec<Snippet>,
    query: &ParsedQuery,
    now: DateTime<Utc>,
) -> Vec<RankedSnippet> {
    let mut ranked: Vec<RankedSnippet> = candidates
        .into_iter()
        .map(|snippet| {
            let variables = template::get_variable_info(&snippet.value, &query.variables);
            let signals = VariableSignals::from(&variables);
            let score = ranking::calculate_score_at(&snippet, &query.term, signals, now);
            let expanded = template::replace_variables(&snippet.value, &query.variables);
            RankedSnippet {
                snippet,
                score,
                variables,
                expanded,
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.snippet.key.cmp(&b.snippet.key))
    });
    ranked
}

/// Run the full pipeline against `store`.
pub async fn search_snippets<S: AsRef<str>>(
    store: &dyn Store,
    tokens: &[S],
    limit: usize,
) -> Result<Vec<RankedSnippet>> {
    let query = parse_query(tokens);
    let candidates = if query.term.is_empty() {
        store.list(None, None).await?
    } else {
        store.list(Some(query.term.as_str()), None).await?
    };

    let mut ranked = rank_candidates(candidates, &query, Utc::now());
    ranked.truncate(limit);
    Ok(ranked)
}

/// Print ranked results for the `snip query` command.
pub fn print_results(results: &[RankedSnippet]) {
    if results.is_empty() {
        println!("No results.");
        return;
    }

    for (i, hit) in results.iter().enumerate() {
        let star = if hit.snippet.is_favorite { " *" } else { "" };
        println!("{}. [{}] {}{}", i + 1, hit.score, hit.snippet.key, star);
        println!("    value: \"{}\"", hit.expanded.replace('\n', "\\n"));
        if !hit.variables.missing_variables.is_empty() {
            println!("    missing: {}", hit.variables.missing_variables.join(", "));
        }
        if hit.snippet.usage_count > 0 {
            println!("    used: {} times", hit.snippet.usage_count);
        }
        println!();
    }
}
