//! File-collection [`Store`] backed by a JSON settings file.
//!
//! The whole collection lives in memory in insertion order and is written
//! back on [`Store::flush`]. Lookups are linear scans; a personal snippet
//! list stays small enough that an index buys nothing.
//!
//! Settings file layout:
//!
//! ```json
//! {
//!   "SnippetList": [ { "Key": "...", "Value": "...", ... } ],
//!   "Snippets":    { "legacy-key": "legacy value" }
//! }
//! ```
//!
//! `Snippets` is the flat map written by older releases. When it is present
//! at open time its entries are merged into `SnippetList` once and the map is
//! dropped from the file.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

use crate::models::{now_stamp, stored_precision, Snippet};

use super::{Matcher, Store};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SettingsFile {
    #[serde(default)]
    snippet_list: Vec<Snippet>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    snippets: BTreeMap<String, String>,
}

/// JSON-settings store with an optional injected [`Matcher`].
pub struct JsonSettingsStore {
    path: PathBuf,
    state: RwLock<SettingsFile>,
    matcher: Option<Arc<dyn Matcher>>,
}

impl JsonSettingsStore {
    /// Load `path` (a missing file is an empty store) and merge any legacy
    /// key→value map.
    pub fn open(path: &Path, matcher: Option<Arc<dyn Matcher>>) -> Result<Self> {
        let settings = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
            if content.trim().is_empty() {
                SettingsFile::default()
            } else {
                serde_json::from_str(&content).with_context(|| {
                    format!("Failed to parse settings file: {}", path.display())
                })?
            }
        } else {
            SettingsFile::default()
        };

        let store = Self {
            path: path.to_path_buf(),
            state: RwLock::new(settings),
            matcher,
        };

        let merged = store.merge_legacy()?;
        if merged > 0 {
            store.save()?;
        }

        info!(
            backend = "json",
            path = %path.display(),
            snippets = store.read()?.snippet_list.len(),
            "opened snippet store"
        );
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Move legacy `Snippets` pairs into the snippet list, skipping keys that
    /// already exist, then drop the legacy map. Returns the number appended.
    fn merge_legacy(&self) -> Result<usize> {
        let mut state = self.write()?;
        if state.snippets.is_empty() {
            return Ok(0);
        }

        let legacy = std::mem::take(&mut state.snippets);
        let now = now_stamp();
        let mut merged = 0;
        for (key, value) in legacy {
            if state.snippet_list.iter().any(|sm| sm.key == key) {
                continue;
            }
            let mut sm = Snippet::new(key, value);
            sm.update_time = Some(now);
            state.snippet_list.push(sm);
            merged += 1;
        }

        info!(merged, "merged legacy snippets into snippet list");
        Ok(merged)
    }

    /// Write the settings file through a temp file and rename.
    fn save(&self) -> Result<()> {
        let json = {
            let state = self.read()?;
            serde_json::to_string_pretty(&*state)?
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create directory: {}", parent.display())
                })?;
            }
        }

        let tmp = self
            .path
            .with_extension(format!("json.{}.tmp", std::process::id()));
        std::fs::write(&tmp, json)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        debug!(path = %self.path.display(), "saved settings file");
        Ok(())
    }

    fn filter(&self, search: &str, text: &str) -> bool {
        match &self.matcher {
            Some(matcher) => search.is_empty() || matcher.is_match(search, text),
            None => text.to_lowercase().contains(&search.to_lowercase()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, SettingsFile>> {
        self.state
            .read()
            .map_err(|_| anyhow!("snippet collection lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, SettingsFile>> {
        self.state
            .write()
            .map_err(|_| anyhow!("snippet collection lock poisoned"))
    }
}

#[async_trait]
impl Store for JsonSettingsStore {
    fn backend_name(&self) -> &'static str {
        "json"
    }

    async fn get_by_key(&self, key: &str) -> Result<Option<Snippet>> {
        let state = self.read()?;
        Ok(state.snippet_list.iter().find(|sm| sm.key == key).cloned())
    }

    async fn list(&self, key: Option<&str>, value: Option<&str>) -> Result<Vec<Snippet>> {
        let state = self.read()?;
        Ok(state
            .snippet_list
            .iter()
            .filter(|sm| key.map_or(true, |k| self.filter(k, &sm.key)))
            .filter(|sm| value.map_or(true, |v| self.filter(v, &sm.value)))
            .cloned()
            .collect())
    }

    async fn add(&self, sm: &Snippet) -> Result<bool> {
        let stamp = sm.update_time.map_or_else(now_stamp, stored_precision);
        let mut state = self.write()?;
        match state.snippet_list.iter_mut().find(|x| x.key == sm.key) {
            Some(existing) => {
                existing.value = sm.value.clone();
                existing.score = sm.score;
                existing.update_time = Some(stamp);
            }
            None => {
                let mut fresh = sm.clone();
                fresh.update_time = Some(stamp);
                fresh.last_used_time = sm.last_used_time.map(stored_precision);
                state.snippet_list.push(fresh);
            }
        }
        Ok(true)
    }

    async fn remove_by_key(&self, key: &str) -> Result<bool> {
        let mut state = self.write()?;
        state.snippet_list.retain(|sm| sm.key != key);
        Ok(true)
    }

    async fn update_by_key(&self, sm: &Snippet) -> Result<bool> {
        let now = now_stamp();
        let mut state = self.write()?;
        match state.snippet_list.iter_mut().find(|x| x.key == sm.key) {
            Some(existing) => {
                existing.value = sm.value.clone();
                existing.update_time = Some(now);
            }
            None => {
                let mut fresh = sm.clone();
                fresh.update_time = Some(now);
                state.snippet_list.push(fresh);
            }
        }
        Ok(true)
    }

    async fn record_usage(&self, key: &str) -> Result<bool> {
        let mut state = self.write()?;
        match state.snippet_list.iter_mut().find(|x| x.key == key) {
            Some(existing) => {
                existing.usage_count += 1;
                existing.last_used_time = Some(now_stamp());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_favorite(&self, key: &str, favorite: bool) -> Result<bool> {
        let mut state = self.write()?;
        match state.snippet_list.iter_mut().find(|x| x.key == key) {
            Some(existing) => {
                existing.is_favorite = favorite;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn clear(&self) -> Result<()> {
        self.write()?.snippet_list.clear();
        self.save()
    }

    async fn reset_all_score(&self) -> Result<()> {
        let mut state = self.write()?;
        for sm in state.snippet_list.iter_mut() {
            sm.score = 0;
            sm.usage_count = 0;
            sm.last_used_time = None;
        }
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SubsequenceMatcher;
    use tempfile::TempDir;

    fn settings_path(tmp: &TempDir) -> PathBuf {
        tmp.path().join("settings.json")
    }

    #[tokio::test]
    async fn test_missing_file_opens_empty() {
        let tmp = TempDir::new().unwrap();
        let store = JsonSettingsStore::open(&settings_path(&tmp), None).unwrap();
        assert!(store.list(None, None).await.unwrap().is_empty());
        assert!(!settings_path(&tmp).exists());
    }

    #[tokio::test]
    async fn test_legacy_map_merged_once() {
        let tmp = TempDir::new().unwrap();
        let path = settings_path(&tmp);
        std::fs::write(
            &path,
            r#"{
                "SnippetList": [{"Key": "kept", "Value": "new value", "Score": 4}],
                "Snippets": {"kept": "old value", "mail": "me@example.com"}
            }"#,
        )
        .unwrap();

        let store = JsonSettingsStore::open(&path, None).unwrap();
        let all = store.list(None, None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].key, "kept");
        assert_eq!(all[0].value, "new value");
        assert_eq!(all[1].key, "mail");
        assert!(all[1].update_time.is_some());

        let on_disk: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(on_disk.get("Snippets").is_none());
        assert_eq!(on_disk["SnippetList"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_substring_fallback_is_case_insensitive() {
        let tmp = TempDir::new().unwrap();
        let store = JsonSettingsStore::open(&settings_path(&tmp), None).unwrap();
        store.add(&Snippet::new("GitStatus", "git status -sb")).await.unwrap();
        store.add(&Snippet::new("gst", "git stash")).await.unwrap();

        let hits = store.list(Some("gitst"), None).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key, "GitStatus");

        assert!(store.list(Some("gtst"), None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_injected_matcher_allows_subsequences() {
        let tmp = TempDir::new().unwrap();
        let store =
            JsonSettingsStore::open(&settings_path(&tmp), Some(Arc::new(SubsequenceMatcher)))
                .unwrap();
        store.add(&Snippet::new("GitStatus", "git status -sb")).await.unwrap();
        store.add(&Snippet::new("deploy", "make deploy")).await.unwrap();

        let hits = store.list(Some("gtst"), None).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key, "GitStatus");
    }

    #[tokio::test]
    async fn test_value_filter_uses_value_term() {
        let tmp = TempDir::new().unwrap();
        let store = JsonSettingsStore::open(&settings_path(&tmp), None).unwrap();
        store.add(&Snippet::new("ssh-prod", "ssh admin@prod")).await.unwrap();
        store.add(&Snippet::new("ssh-dev", "ssh admin@dev")).await.unwrap();

        let hits = store.list(Some("ssh"), Some("prod")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key, "ssh-prod");
    }

    #[tokio::test]
    async fn test_add_existing_preserves_usage_and_favorite() {
        let tmp = TempDir::new().unwrap();
        let store = JsonSettingsStore::open(&settings_path(&tmp), None).unwrap();
        store.add(&Snippet::new("k", "v1")).await.unwrap();
        store.record_usage("k").await.unwrap();
        store.set_favorite("k", true).await.unwrap();

        store.add(&Snippet::new("k", "v2").with_score(7)).await.unwrap();
        let sm = store.get_by_key("k").await.unwrap().unwrap();
        assert_eq!(sm.value, "v2");
        assert_eq!(sm.score, 7);
        assert_eq!(sm.usage_count, 1);
        assert!(sm.last_used_time.is_some());
        assert!(sm.is_favorite);
    }

    #[tokio::test]
    async fn test_timestamps_kept_at_millisecond_precision() {
        use chrono::Timelike;

        let tmp = TempDir::new().unwrap();
        let store = JsonSettingsStore::open(&settings_path(&tmp), None).unwrap();
        let mut sm = Snippet::new("k", "v");
        sm.update_time = crate::models::parse_time("2024-05-06T07:08:09.123456789Z");
        store.add(&sm).await.unwrap();
        store.record_usage("k").await.unwrap();

        let back = store.get_by_key("k").await.unwrap().unwrap();
        assert_eq!(back.update_time.unwrap().nanosecond(), 123_000_000);
        assert_eq!(back.last_used_time.unwrap().nanosecond() % 1_000_000, 0);
    }

    #[tokio::test]
    async fn test_update_existing_keeps_score() {
        let tmp = TempDir::new().unwrap();
        let store = JsonSettingsStore::open(&settings_path(&tmp), None).unwrap();
        store.add(&Snippet::new("k", "v1").with_score(3)).await.unwrap();
        store.update_by_key(&Snippet::new("k", "v2").with_score(99)).await.unwrap();

        let sm = store.get_by_key("k").await.unwrap().unwrap();
        assert_eq!(sm.value, "v2");
        assert_eq!(sm.score, 3);
    }

    #[tokio::test]
    async fn test_flush_persists_and_reloads() {
        let tmp = TempDir::new().unwrap();
        let path = settings_path(&tmp);
        {
            let store = JsonSettingsStore::open(&path, None).unwrap();
            assert_eq!(store.path(), path.as_path());
            store.add(&Snippet::new("a", "1")).await.unwrap();
            store.add(&Snippet::new("b", "2")).await.unwrap();
            store.flush().await.unwrap();
        }
        let reopened = JsonSettingsStore::open(&path, None).unwrap();
        let keys: Vec<String> = reopened
            .list(None, None)
            .await
            .unwrap()
            .into_iter()
            .map(|sm| sm.key)
            .collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_clear_writes_empty_file() {
        let tmp = TempDir::new().unwrap();
        let path = settings_path(&tmp);
        let store = JsonSettingsStore::open(&path, None).unwrap();
        store.add(&Snippet::new("a", "1")).await.unwrap();
        store.flush().await.unwrap();

        store.clear().await.unwrap();
        let reopened = JsonSettingsStore::open(&path, None).unwrap();
        assert!(reopened.list(None, None).await.unwrap().is_empty());
    }
}
