//! Caller-side composition over a [`Store`].
//!
//! [`SnippetManager`] owns exactly one backend, chosen when it is opened,
//! and layers the user-facing rules on top of the raw storage contract:
//! create rejects duplicates, every mutation is flushed, and usage is
//! recorded when a snippet is expanded.

use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use crate::config::Config;
use crate::error::SnippetError;
use crate::export;
use crate::models::Snippet;
use crate::search::{self, RankedSnippet};
use crate::store::{self, Store};
use crate::template;

pub struct SnippetManager {
    store: Box<dyn Store>,
    search_limit: usize,
}

impl SnippetManager {
    /// Open the backend selected by `config.storage.backend`.
    pub async fn open(config: &Config) -> Result<Self> {
        let store = store::open_store(config).await?;
        debug!(backend = store.backend_name(), "snippet store opened");
        Ok(Self::from_store(store, config.search.limit))
    }

    pub fn from_store(store: Box<dyn Store>, search_limit: usize) -> Self {
        Self {
            store,
            search_limit,
        }
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    /// Add a new snippet. Fails with [`SnippetError::DuplicateKey`] when
    /// the key is already taken.
    pub async fn create(&self, key: &str, value: &str) -> Result<Snippet> {
        let sm = validated(key, value)?;
        if self.store.get_by_key(&sm.key).await?.is_some() {
            return Err(SnippetError::DuplicateKey(sm.key).into());
        }
        self.write(&sm).await?;
        Ok(sm)
    }

    /// Add or overwrite without the duplicate check.
    pub async fn upsert(&self, key: &str, value: &str) -> Result<Snippet> {
        let sm = validated(key, value)?;
        self.write(&sm).await?;
        Ok(sm)
    }

    /// Replace the value of an existing snippet, keeping its score.
    pub async fn update(&self, key: &str, value: &str) -> Result<Snippet> {
        let mut sm = validated(key, value)?;
        let existing = self
            .store
            .get_by_key(&sm.key)
            .await?
            .ok_or_else(|| SnippetError::NotFound(sm.key.clone()))?;
        sm.score = existing.score;

        self.store.update_by_key(&sm).await?;
        self.store.flush().await?;
        Ok(sm)
    }

    /// Delete `key`. Returns whether a snippet was there.
    pub async fn remove(&self, key: &str) -> Result<bool> {
        let existed = self.store.get_by_key(key).await?.is_some();
        self.store.remove_by_key(key).await?;
        self.store.flush().await?;
        Ok(existed)
    }

    pub async fn get(&self, key: &str) -> Result<Option<Snippet>> {
        self.store.get_by_key(key).await
    }

    pub async fn list(&self, key: Option<&str>, value: Option<&str>) -> Result<Vec<Snippet>> {
        self.store.list(key, value).await
    }

    /// Expand `key` with `variables`, recording one use.
    pub async fn use_snippet(
        &self,
        key: &str,
        variables: &HashMap<String, String>,
    ) -> Result<String> {
        let sm = self
            .store
            .get_by_key(key)
            .await?
            .ok_or_else(|| SnippetError::NotFound(key.to_string()))?;

        self.store.record_usage(key).await?;
        self.store.flush().await?;
        Ok(template::replace_variables(&sm.value, variables))
    }

    pub async fn set_favorite(&self, key: &str, favorite: bool) -> Result<()> {
        if !self.store.set_favorite(key, favorite).await? {
            return Err(SnippetError::NotFound(key.to_string()).into());
        }
        self.store.flush().await
    }

    pub async fn reset_scores(&self) -> Result<()> {
        self.store.reset_all_score().await?;
        self.store.flush().await
    }

    pub async fn clear(&self) -> Result<()> {
        self.store.clear().await?;
        self.store.flush().await
    }

    pub async fn import(&self, path: &Path) -> Result<usize> {
        export::import_snippets(self.store.as_ref(), path).await
    }

    /// Export to `path`, or stdout when `None`.
    pub async fn export(&self, path: Option<&Path>) -> Result<usize> {
        export::export_snippets(self.store.as_ref(), path).await
    }

    /// Ranked search over raw query tokens.
    pub async fn query<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Vec<RankedSnippet>> {
        search::search_snippets(self.store.as_ref(), tokens, self.search_limit).await
    }

    pub async fn close(self) -> Result<()> {
        self.store.close().await
    }

    async fn write(&self, sm: &Snippet) -> Result<()> {
        self.store.add(sm).await?;
        self.store.flush().await
    }
}

fn validated(key: &str, value: &str) -> Result<Snippet, SnippetError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(SnippetError::EmptyKey);
    }
    if value.is_empty() {
        return Err(SnippetError::EmptyValue);
    }
    Ok(Snippet::new(key, value))
}
