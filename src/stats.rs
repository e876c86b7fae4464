//! Collection statistics for `snip stats`.
//!
//! Summarizes what is stored: snippet and template counts, favorites,
//! total recorded uses and the most used keys.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::path::Path;

use crate::config::{Config, StorageBackend};
use crate::manager::SnippetManager;
use crate::models::Snippet;
use crate::template;

const TOP_N: usize = 5;

/// Aggregates over one listing of the store.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SnippetStats {
    pub total: usize,
    pub templates: usize,
    pub favorites: usize,
    pub total_uses: i64,
    pub last_used: Option<DateTime<Utc>>,
    /// `(key, usage_count)` for the most used snippets.
    pub top_used: Vec<(String, i64)>,
}

impl SnippetStats {
    pub fn collect(snippets: &[Snippet]) -> Self {
        let mut top: Vec<&Snippet> = snippets.iter().filter(|s| s.usage_count > 0).collect();
        top.sort_by(|a, b| b.usage_count.cmp(&a.usage_count).then_with(|| a.key.cmp(&b.key)));

        Self {
            total: snippets.len(),
            templates: snippets
                .iter()
                .filter(|s| template::has_variables(&s.value))
                .count(),
            favorites: snippets.iter().filter(|s| s.is_favorite).count(),
            total_uses: snippets.iter().map(|s| s.usage_count).sum(),
            last_used: snippets.iter().filter_map(|s| s.last_used_time).max(),
            top_used: top
                .into_iter()
                .take(TOP_N)
                .map(|s| (s.key.clone(), s.usage_count))
                .collect(),
        }
    }
}

/// Run the stats command: list the store and print a summary.
pub async fn run_stats(config: &Config, manager: &SnippetManager) -> Result<()> {
    let snippets = manager.list(None, None).await?;
    let stats = SnippetStats::collect(&snippets);

    let path: &Path = match config.storage.backend()? {
        StorageBackend::Sqlite => &config.db.path,
        StorageBackend::Json => &config.settings.path,
    };
    let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

    println!("Snippets: Store Stats");
    println!("=====================");
    println!();
    println!("  Backend:     {}", manager.store().backend_name());
    println!("  Path:        {}", path.display());
    println!("  Size:        {}", format_bytes(size));
    println!();
    println!("  Snippets:    {}", stats.total);
    println!("  Templates:   {}", stats.templates);
    println!("  Favorites:   {}", stats.favorites);
    println!("  Total uses:  {}", stats.total_uses);
    println!(
        "  Last used:   {}",
        stats
            .last_used
            .map(|t| format_ts_relative(t, Utc::now()))
            .unwrap_or_else(|| "never".to_string())
    );

    if !stats.top_used.is_empty() {
        println!();
        println!("  Most used:");
        for (key, uses) in &stats.top_used {
            println!("    {:<24} {:>6}", key, uses);
        }
    }
    println!();

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Relative age of `ts` (e.g. "3 hours ago"), falling back to a date.
fn format_ts_relative(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = (now - ts).num_seconds();
    let plural = |n: i64| if n == 1 { "" } else { "s" };

    if delta < 0 {
        ts.format("%Y-%m-%d %H:%M").to_string()
    } else if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, plural(mins))
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, plural(hours))
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, plural(days))
    } else {
        ts.format("%Y-%m-%d %H:%M").to_string()
    }
}
