//! Snippet retrieval by key for `snip get`.

use anyhow::Result;

use crate::error::SnippetError;
use crate::manager::SnippetManager;
use crate::models::Snippet;
use crate::template;

/// Look up `key` and print every stored field.
pub async fn run_get(manager: &SnippetManager, key: &str) -> Result<()> {
    let sm = manager
        .get(key)
        .await?
        .ok_or_else(|| SnippetError::NotFound(key.to_string()))?;

    print_snippet(&sm);
    Ok(())
}

fn print_snippet(sm: &Snippet) {
    println!("--- Snippet ---");
    println!("key:        {}", sm.key);
    println!("score:      {}", sm.score);
    println!("uses:       {}", sm.usage_count);
    println!("favorite:   {}", if sm.is_favorite { "yes" } else { "no" });
    println!(
        "updated:    {}",
        sm.update_time
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "-".to_string())
    );
    println!(
        "last used:  {}",
        sm.last_used_time
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "never".to_string())
    );

    let vars = template::extract_variables(&sm.value);
    if !vars.is_empty() {
        println!("variables:  {}", vars.join(", "));
    }

    println!();
    println!("--- Value ---");
    println!("{}", sm.value);
}
