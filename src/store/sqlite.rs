//! Relational [`Store`] backed by a single SQLite table.
//!
//! Each method opens its own connection, runs one statement (two for an
//! `update_by_key` that falls through to an insert) and closes the
//! connection. The schema is initialized by [`crate::migrate`] when the
//! store is opened.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Connection, Row};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::db;
use crate::migrate::{self, MigrationOutcome};
use crate::models::{format_db_time, parse_time, Snippet};

use super::Store;

const SELECT_SNIPPET: &str = "SELECT key, value, \
    COALESCE(score, 0) AS score, \
    COALESCE(usage_count, 0) AS usage_count, \
    CAST(last_used_time AS TEXT) AS last_used_time, \
    COALESCE(is_favorite, 0) AS is_favorite, \
    CAST(update_time AS TEXT) AS update_time \
    FROM snippets";

const UPSERT_SNIPPET: &str = r#"
    INSERT INTO snippets (key, value, score, usage_count, last_used_time, is_favorite, update_time)
    VALUES (?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT(key) DO UPDATE SET
        value = excluded.value,
        score = excluded.score,
        usage_count = excluded.usage_count,
        last_used_time = excluded.last_used_time,
        is_favorite = excluded.is_favorite,
        update_time = excluded.update_time
"#;

/// SQLite implementation of the [`Store`] trait.
pub struct SqliteStore {
    path: PathBuf,
    options: SqliteConnectOptions,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path` and bring its schema
    /// up to date. Fails if the schema cannot be initialized.
    pub async fn open(path: &Path) -> Result<Self> {
        let options = db::connect_options(path)?;
        let mut conn = db::connect(&options).await?;
        let outcome = migrate::run_migrations(&mut conn)
            .await
            .with_context(|| format!("Failed to initialize schema in {}", path.display()))?;
        conn.close().await?;

        match &outcome {
            MigrationOutcome::Created => info!(path = %path.display(), "created snippet database"),
            MigrationOutcome::Upgraded { added } if !added.is_empty() => {
                info!(path = %path.display(), added = ?added, "upgraded snippet table")
            }
            MigrationOutcome::Upgraded { .. } => {}
        }
        info!(backend = "sqlite", path = %path.display(), "opened snippet store");

        Ok(Self {
            path: path.to_path_buf(),
            options,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn connect(&self) -> Result<SqliteConnection> {
        db::connect(&self.options).await
    }

    async fn insert(&self, conn: &mut SqliteConnection, sm: &Snippet, stamp: String) -> Result<u64> {
        let result = sqlx::query(UPSERT_SNIPPET)
            .bind(&sm.key)
            .bind(&sm.value)
            .bind(sm.score)
            .bind(sm.usage_count)
            .bind(sm.last_used_time.as_ref().map(format_db_time))
            .bind(sm.is_favorite)
            .bind(stamp)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }
}

fn row_to_snippet(row: &SqliteRow) -> Result<Snippet> {
    let key: String = row.try_get("key")?;
    let last_used_raw: Option<String> = row.try_get("last_used_time")?;
    let update_raw: Option<String> = row.try_get("update_time")?;
    let is_favorite: i64 = row.try_get("is_favorite")?;

    Ok(Snippet {
        value: row.try_get("value")?,
        score: row.try_get("score")?,
        usage_count: row.try_get("usage_count")?,
        last_used_time: read_time(&key, "last_used_time", last_used_raw),
        is_favorite: is_favorite != 0,
        update_time: read_time(&key, "update_time", update_raw),
        key,
    })
}

fn read_time(key: &str, column: &str, raw: Option<String>) -> Option<chrono::DateTime<Utc>> {
    let raw = raw?;
    let parsed = parse_time(&raw);
    if parsed.is_none() {
        warn!(key, column, raw = %raw, "unreadable timestamp, treating as unset");
    }
    parsed
}

/// `%term%` with LIKE wildcards in `term` escaped (escape char `\`).
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn contains_folded(text: &str, term: &str) -> bool {
    text.to_lowercase().contains(&term.to_lowercase())
}

#[async_trait]
impl Store for SqliteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn get_by_key(&self, key: &str) -> Result<Option<Snippet>> {
        let mut conn = self.connect().await?;
        let row = sqlx::query(&format!("{} WHERE key = ?", SELECT_SNIPPET))
            .bind(key)
            .fetch_optional(&mut conn)
            .await?;
        conn.close().await?;
        row.as_ref().map(row_to_snippet).transpose()
    }

    async fn list(&self, key: Option<&str>, value: Option<&str>) -> Result<Vec<Snippet>> {
        // LIKE only folds ASCII case; other terms are matched after the query.
        let like_key = key.filter(|k| k.is_ascii());
        let like_value = value.filter(|v| v.is_ascii());

        let mut sql = format!("{} WHERE 1=1", SELECT_SNIPPET);
        if like_key.is_some() {
            sql.push_str(" AND key LIKE ? ESCAPE '\\'");
        }
        if like_value.is_some() {
            sql.push_str(" AND value LIKE ? ESCAPE '\\'");
        }
        sql.push_str(" ORDER BY score DESC, rowid ASC");

        let mut query = sqlx::query(&sql);
        if let Some(k) = like_key {
            query = query.bind(like_pattern(k));
        }
        if let Some(v) = like_value {
            query = query.bind(like_pattern(v));
        }

        let mut conn = self.connect().await?;
        let rows = query.fetch_all(&mut conn).await?;
        conn.close().await?;

        let mut snippets = Vec::with_capacity(rows.len());
        for row in &rows {
            let sm = row_to_snippet(row)?;
            let key_ok = key.map_or(true, |k| k.is_ascii() || contains_folded(&sm.key, k));
            let value_ok = value.map_or(true, |v| v.is_ascii() || contains_folded(&sm.value, v));
            if key_ok && value_ok {
                snippets.push(sm);
            }
        }
        Ok(snippets)
    }

    async fn add(&self, sm: &Snippet) -> Result<bool> {
        let stamp = format_db_time(&sm.update_time.unwrap_or_else(Utc::now));
        let mut conn = self.connect().await?;
        let affected = self.insert(&mut conn, sm, stamp).await?;
        conn.close().await?;
        debug!(key = %sm.key, "upserted snippet");
        Ok(affected > 0)
    }

    async fn remove_by_key(&self, key: &str) -> Result<bool> {
        let mut conn = self.connect().await?;
        sqlx::query("DELETE FROM snippets WHERE key = ?")
            .bind(key)
            .execute(&mut conn)
            .await?;
        conn.close().await?;
        Ok(true)
    }

    async fn update_by_key(&self, sm: &Snippet) -> Result<bool> {
        let stamp = format_db_time(&Utc::now());
        let mut conn = self.connect().await?;
        let updated = sqlx::query(
            "UPDATE snippets SET value = ?, score = ?, update_time = ? WHERE key = ?",
        )
        .bind(&sm.value)
        .bind(sm.score)
        .bind(&stamp)
        .bind(&sm.key)
        .execute(&mut conn)
        .await?
        .rows_affected();

        let affected = if updated == 0 {
            self.insert(&mut conn, sm, stamp).await?
        } else {
            updated
        };
        conn.close().await?;
        Ok(affected > 0)
    }

    async fn record_usage(&self, key: &str) -> Result<bool> {
        let mut conn = self.connect().await?;
        let result = sqlx::query(
            "UPDATE snippets SET usage_count = COALESCE(usage_count, 0) + 1, last_used_time = ? \
             WHERE key = ?",
        )
        .bind(format_db_time(&Utc::now()))
        .bind(key)
        .execute(&mut conn)
        .await?;
        conn.close().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_favorite(&self, key: &str, favorite: bool) -> Result<bool> {
        let mut conn = self.connect().await?;
        let result = sqlx::query("UPDATE snippets SET is_favorite = ? WHERE key = ?")
            .bind(favorite)
            .bind(key)
            .execute(&mut conn)
            .await?;
        conn.close().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear(&self) -> Result<()> {
        let mut conn = self.connect().await?;
        let result = sqlx::query("DELETE FROM snippets").execute(&mut conn).await?;
        conn.close().await?;
        info!(removed = result.rows_affected(), "cleared snippet table");
        Ok(())
    }

    async fn reset_all_score(&self) -> Result<()> {
        let mut conn = self.connect().await?;
        let result = sqlx::query(
            "UPDATE snippets SET score = 0, usage_count = 0, last_used_time = NULL",
        )
        .execute(&mut conn)
        .await?;
        conn.close().await?;
        info!(rows = result.rows_affected(), "reset snippet scores");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_wraps_term() {
        assert_eq!(like_pattern("git"), "%git%");
    }

    #[test]
    fn test_contains_folded_handles_non_ascii() {
        assert!(contains_folded("Ärger im Büro", "ärger"));
        assert!(!contains_folded("arger", "ärger"));
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }
}
