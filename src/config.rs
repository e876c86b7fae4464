//! TOML configuration parsing and validation.
//!
//! ```toml
//! [storage]
//! backend = "sqlite"   # or "json"
//! fuzzy = true
//!
//! [db]
//! path = "./data/snippets.db"
//!
//! [settings]
//! path = "./data/settings.json"
//!
//! [search]
//! limit = 20
//! ```
//!
//! Every section is optional. The backend is chosen once when the store is
//! opened; switching it takes effect the next time the process starts.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::SnippetError;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub settings: SettingsConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Give the json backend a character-subsequence matcher for `list`.
    #[serde(default = "default_fuzzy")]
    pub fuzzy: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            fuzzy: default_fuzzy(),
        }
    }
}

fn default_backend() -> String {
    "sqlite".to_string()
}
fn default_fuzzy() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./data/snippets.db")
}

#[derive(Debug, Deserialize, Clone)]
pub struct SettingsConfig {
    #[serde(default = "default_settings_path")]
    pub path: PathBuf,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            path: default_settings_path(),
        }
    }
}

fn default_settings_path() -> PathBuf {
    PathBuf::from("./data/settings.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
        }
    }
}

fn default_limit() -> usize {
    20
}

/// Which [`Store`](crate::store::Store) implementation backs the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Single-table SQLite database.
    Sqlite,
    /// Ordered collection in a JSON settings file.
    Json,
}

impl FromStr for StorageBackend {
    type Err = SnippetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "json" | "jsonsetting" => Ok(Self::Json),
            other => Err(SnippetError::UnknownBackend(other.to_string())),
        }
    }
}

impl StorageConfig {
    pub fn backend(&self) -> Result<StorageBackend, SnippetError> {
        self.backend.parse()
    }
}

impl Config {
    /// Defaults rooted under `dir`, used by tests and first runs.
    pub fn rooted_at(dir: &Path) -> Self {
        Self {
            db: DbConfig {
                path: dir.join("snippets.db"),
            },
            settings: SettingsConfig {
                path: dir.join("settings.json"),
            },
            ..Self::default()
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Load `path` if it exists, otherwise fall back to defaults.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(Config::default())
    }
}

fn validate(config: &Config) -> Result<()> {
    config.storage.backend()?;

    if config.search.limit < 1 {
        anyhow::bail!("search.limit must be >= 1");
    }
    if config.db.path.as_os_str().is_empty() {
        anyhow::bail!("db.path must not be empty");
    }
    if config.settings.path.as_os_str().is_empty() {
        anyhow::bail!("settings.path must not be empty");
    }
    Ok(())
}
