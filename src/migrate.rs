//! Schema initialization for the relational store.
//!
//! Runs once when [`SqliteStore`](crate::store::SqliteStore) is opened:
//!
//! 1. If the `snippets` table does not exist, create it with every column.
//! 2. Otherwise inspect its columns and `ALTER TABLE .. ADD COLUMN` whichever
//!    of `usage_count`, `last_used_time`, `is_favorite` are missing.
//!
//! Upgrades only ever add columns with defaults; rows are not rewritten and
//! nothing is dropped or renamed. All `ALTER` statements share one
//! transaction, so a failure leaves the table exactly as it was and the
//! caller's open fails.

use anyhow::{Context, Result};
use sqlx::sqlite::SqliteConnection;
use sqlx::{Connection, Row};
use tracing::info;

pub const TABLE_NAME: &str = "snippets";

const CREATE_TABLE: &str = r#"
CREATE TABLE snippets (
    key TEXT NOT NULL PRIMARY KEY,
    value TEXT NOT NULL,
    score INTEGER NOT NULL DEFAULT 0,
    usage_count INTEGER DEFAULT 0,
    last_used_time DATETIME NULL,
    is_favorite INTEGER DEFAULT 0,
    update_time DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
    create_time DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
)
"#;

/// Columns added after the first schema, with their `ADD COLUMN` definitions.
const ADDITIVE_COLUMNS: &[(&str, &str)] = &[
    ("usage_count", "usage_count INTEGER DEFAULT 0"),
    ("last_used_time", "last_used_time DATETIME NULL"),
    ("is_favorite", "is_favorite INTEGER DEFAULT 0"),
];

/// What [`run_migrations`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Fresh install: the table was created.
    Created,
    /// The table existed; these columns were added (possibly none).
    Upgraded { added: Vec<String> },
}

pub async fn run_migrations(conn: &mut SqliteConnection) -> Result<MigrationOutcome> {
    let table_exists: bool = sqlx::query_scalar(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name = ?",
    )
    .bind(TABLE_NAME)
    .fetch_one(&mut *conn)
    .await?;

    if !table_exists {
        sqlx::query(CREATE_TABLE)
            .execute(&mut *conn)
            .await
            .context("Failed to create snippets table")?;
        info!(table = TABLE_NAME, "created table");
        return Ok(MigrationOutcome::Created);
    }

    let existing = table_columns(conn).await?;
    let missing: Vec<&(&str, &str)> = ADDITIVE_COLUMNS
        .iter()
        .filter(|(name, _)| !existing.iter().any(|c| c.eq_ignore_ascii_case(name)))
        .collect();

    if missing.is_empty() {
        return Ok(MigrationOutcome::Upgraded { added: Vec::new() });
    }

    let columns: Vec<(&str, &str)> = missing.into_iter().copied().collect();
    let added = add_columns(conn, &columns).await?;
    for column in &added {
        info!(table = TABLE_NAME, column = %column, "added column");
    }
    Ok(MigrationOutcome::Upgraded { added })
}

/// Add `(name, definition)` columns in one transaction. Either every column
/// is added or the table is left as it was.
async fn add_columns(
    conn: &mut SqliteConnection,
    columns: &[(&str, &str)],
) -> Result<Vec<String>> {
    let mut tx = conn.begin().await?;
    for (name, definition) in columns {
        sqlx::query(&format!("ALTER TABLE {} ADD COLUMN {}", TABLE_NAME, definition))
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to add column {} to {}", name, TABLE_NAME))?;
    }
    tx.commit().await?;

    Ok(columns.iter().map(|(name, _)| name.to_string()).collect())
}

/// Column names of the snippets table.
pub async fn table_columns(conn: &mut SqliteConnection) -> Result<Vec<String>> {
    let rows = sqlx::query(&format!("PRAGMA table_info({})", TABLE_NAME))
        .fetch_all(&mut *conn)
        .await?;
    rows.iter()
        .map(|row| row.try_get::<String, _>("name").map_err(anyhow::Error::from))
        .collect()
}
