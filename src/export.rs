//! JSON import and export of the whole snippet collection.
//!
//! The interchange format is a pretty-printed JSON array of snippets with
//! PascalCase field names. Files written by older versions (no usage or
//! favorite fields) import with those fields defaulted.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

use crate::models::Snippet;
use crate::store::Store;

/// Serialize `snippets` as a pretty JSON array into `writer`.
pub fn write_snippets<W: Write>(mut writer: W, snippets: &[Snippet]) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, snippets)?;
    writeln!(writer)?;
    Ok(())
}

/// Parse a JSON array of snippets.
pub fn read_snippets(content: &str) -> Result<Vec<Snippet>> {
    let snippets: Vec<Snippet> =
        serde_json::from_str(content).context("Failed to parse snippet export")?;
    Ok(snippets)
}

/// Export every snippet in `store`.
///
/// If `output` is `Some`, writes to that file path (creating parent
/// directories). Otherwise writes to stdout for piping. Returns the number
/// of snippets written.
pub async fn export_snippets(store: &dyn Store, output: Option<&Path>) -> Result<usize> {
    let snippets = store.list(None, None).await?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_snippets(std::io::BufWriter::new(file), &snippets)?;
            eprintln!("Exported {} snippets to {}", snippets.len(), path.display());
        }
        None => {
            let stdout = std::io::stdout();
            write_snippets(stdout.lock(), &snippets)?;
        }
    }

    Ok(snippets.len())
}

/// Upsert every snippet in the file at `path` into `store`.
///
/// Entries with an empty key or value are skipped. The store is flushed
/// once after the last write. Returns the number of snippets written.
pub async fn import_snippets(store: &dyn Store, path: &Path) -> Result<usize> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let snippets = read_snippets(&content)?;

    let mut imported = 0;
    for sm in &snippets {
        if sm.key.trim().is_empty() || sm.value.is_empty() {
            warn!(key = %sm.key, "skipping snippet with empty key or value");
            continue;
        }
        store.add(sm).await?;
        imported += 1;
    }
    store.flush().await?;

    debug!(imported, total = snippets.len(), "import finished");
    Ok(imported)
}
