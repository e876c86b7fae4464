//! SQLite connection management.
//!
//! The relational store holds no long-lived handle: every operation opens a
//! connection from the options built here and closes it when finished. The
//! database file and its parent directories are created on first use, and
//! connections use WAL journaling so a second process can read while one
//! writes. Cross-process write safety is left to SQLite's own locking.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteJournalMode};
use sqlx::ConnectOptions;
use std::path::Path;

/// Build connection options for the database at `db_path`.
pub fn connect_options(db_path: &Path) -> Result<SqliteConnectOptions> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory: {}", parent.display())
            })?;
        }
    }

    Ok(SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal))
}

/// Open one connection.
pub async fn connect(options: &SqliteConnectOptions) -> Result<SqliteConnection> {
    let conn = options
        .connect()
        .await
        .context("Failed to open snippet database")?;
    Ok(conn)
}
