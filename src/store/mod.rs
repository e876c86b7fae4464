//! Storage abstraction for snippets.
//!
//! The [`Store`] trait is the contract both backends satisfy:
//!
//! | Backend | Module | Persistence | `list` order |
//! |---------|--------|-------------|--------------|
//! | Relational | [`sqlite`] | single `snippets` table | `score` desc, then insertion |
//! | File-collection | [`json`] | settings JSON file | insertion |
//!
//! The backend is picked once, at startup, by [`open_store`]. Callers that
//! need identical output from either backend sort on their side (the query
//! pipeline in [`crate::search`] does).
//!
//! Both backends compare `list` terms case-insensitively with full Unicode
//! case folding. The relational backend pushes ASCII terms into `LIKE` and
//! filters other terms after the query, since SQLite's `LIKE` folds ASCII
//! only.
//!
//! # Existing-key writes
//!
//! The backends deliberately differ on which fields an existing-key write
//! replaces:
//!
//! | Operation | Relational | File-collection |
//! |-----------|------------|-----------------|
//! | `add` | every field from the incoming snippet | `value`, `score`, `update_time` |
//! | `update_by_key` | `value`, `score`, `update_time` | `value`, `update_time` |
//!
//! Usage statistics and the favorite flag have their own write paths
//! ([`Store::record_usage`], [`Store::set_favorite`], [`Store::reset_all_score`]).

pub mod json;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{Config, StorageBackend};
use crate::models::Snippet;
use crate::ranking::is_subsequence;

pub use json::JsonSettingsStore;
pub use sqlite::SqliteStore;

/// Abstract snippet storage backend.
///
/// Calls are awaited one at a time by a single owner; backends add no
/// locking beyond what their own data structures need. Storage faults
/// propagate as errors and are never retried.
#[async_trait]
pub trait Store: Send + Sync {
    /// Short backend identifier for logs and `snip stats`.
    fn backend_name(&self) -> &'static str;

    /// Exact key lookup. An absent key is `Ok(None)`, not an error.
    async fn get_by_key(&self, key: &str) -> Result<Option<Snippet>>;

    /// Substring-filtered listing. Both filters must match when both are
    /// given; with neither, the whole store is returned.
    async fn list(&self, key: Option<&str>, value: Option<&str>) -> Result<Vec<Snippet>>;

    /// Upsert. A missing `update_time` is stamped with the current time.
    async fn add(&self, sm: &Snippet) -> Result<bool>;

    /// Delete by key. Removing an absent key succeeds.
    async fn remove_by_key(&self, key: &str) -> Result<bool>;

    /// Edit an existing snippet, inserting it when the key is absent.
    async fn update_by_key(&self, sm: &Snippet) -> Result<bool>;

    /// Increment `usage_count` and stamp `last_used_time`.
    /// Returns `false` when the key is absent.
    async fn record_usage(&self, key: &str) -> Result<bool>;

    /// Pin or unpin. Returns `false` when the key is absent.
    async fn set_favorite(&self, key: &str, favorite: bool) -> Result<bool>;

    /// Remove every snippet and flush.
    async fn clear(&self) -> Result<()>;

    /// Zero `score` and `usage_count` and clear `last_used_time` everywhere.
    async fn reset_all_score(&self) -> Result<()>;

    /// Write pending in-memory state to durable storage.
    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Release backend resources.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Text predicate supplied by the environment to the file-collection
/// backend (e.g. a launcher's fuzzy matcher).
pub trait Matcher: Send + Sync {
    fn is_match(&self, query: &str, text: &str) -> bool;
}

/// Case-insensitive character-subsequence matcher.
#[derive(Debug, Default, Clone, Copy)]
pub struct SubsequenceMatcher;

impl Matcher for SubsequenceMatcher {
    fn is_match(&self, query: &str, text: &str) -> bool {
        is_subsequence(&query.to_lowercase(), &text.to_lowercase())
    }
}

/// Open the backend selected in `config`.
pub async fn open_store(config: &Config) -> Result<Box<dyn Store>> {
    let store: Box<dyn Store> = match config.storage.backend()? {
        StorageBackend::Sqlite => Box::new(SqliteStore::open(&config.db.path).await?),
        StorageBackend::Json => {
            let matcher: Option<Arc<dyn Matcher>> = if config.storage.fuzzy {
                Some(Arc::new(SubsequenceMatcher))
            } else {
                None
            };
            Box::new(JsonSettingsStore::open(&config.settings.path, matcher)?)
        }
    };
    Ok(store)
}
