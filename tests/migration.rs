//! Upgrading a snippet database written before usage tracking existed.

use snippets::db;
use snippets::migrate::{self, MigrationOutcome};
use snippets::store::{SqliteStore, Store};
use sqlx::Connection;
use std::path::Path;
use tempfile::TempDir;

const LEGACY_TABLE: &str = r#"
CREATE TABLE snippets (
    key TEXT NOT NULL PRIMARY KEY,
    value TEXT NOT NULL,
    score INTEGER NOT NULL DEFAULT 0,
    update_time DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
    create_time DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
)
"#;

async fn seed_legacy(path: &Path) {
    let options = db::connect_options(path).unwrap();
    let mut conn = db::connect(&options).await.unwrap();
    sqlx::query(LEGACY_TABLE).execute(&mut conn).await.unwrap();
    sqlx::query("INSERT INTO snippets (key, value, score) VALUES ('old', 'legacy {x}', 4)")
        .execute(&mut conn)
        .await
        .unwrap();
    conn.close().await.unwrap();
}

#[tokio::test]
async fn test_legacy_table_gains_columns() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("snippets.db");
    seed_legacy(&path).await;

    let options = db::connect_options(&path).unwrap();
    let mut conn = db::connect(&options).await.unwrap();
    let outcome = migrate::run_migrations(&mut conn).await.unwrap();
    assert_eq!(
        outcome,
        MigrationOutcome::Upgraded {
            added: vec![
                "usage_count".to_string(),
                "last_used_time".to_string(),
                "is_favorite".to_string(),
            ]
        }
    );

    let columns = migrate::table_columns(&mut conn).await.unwrap();
    for column in ["usage_count", "last_used_time", "is_favorite", "create_time"] {
        assert!(columns.iter().any(|c| c == column), "missing {}", column);
    }

    // A second run is a no-op.
    let again = migrate::run_migrations(&mut conn).await.unwrap();
    assert_eq!(again, MigrationOutcome::Upgraded { added: vec![] });
    conn.close().await.unwrap();
}

#[tokio::test]
async fn test_legacy_rows_read_with_defaults() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("snippets.db");
    seed_legacy(&path).await;

    let store = SqliteStore::open(&path).await.unwrap();
    assert_eq!(store.path(), path.as_path());
    let sm = store.get_by_key("old").await.unwrap().unwrap();
    assert_eq!(sm.value, "legacy {x}");
    assert_eq!(sm.score, 4);
    assert_eq!(sm.usage_count, 0);
    assert!(sm.last_used_time.is_none());
    assert!(!sm.is_favorite);
    assert!(sm.update_time.is_some());

    assert!(store.record_usage("old").await.unwrap());
    assert_eq!(store.get_by_key("old").await.unwrap().unwrap().usage_count, 1);
}

#[tokio::test]
async fn test_fresh_database_is_created() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("nested").join("snippets.db");

    let options = db::connect_options(&path).unwrap();
    let mut conn = db::connect(&options).await.unwrap();
    assert_eq!(
        migrate::run_migrations(&mut conn).await.unwrap(),
        MigrationOutcome::Created
    );
    conn.close().await.unwrap();
    assert!(path.exists());
}

#[tokio::test]
async fn test_open_fails_when_schema_cannot_be_initialized() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("snippets.db");

    // A view occupying the table name makes CREATE TABLE fail.
    let options = db::connect_options(&path).unwrap();
    let mut conn = db::connect(&options).await.unwrap();
    sqlx::query("CREATE VIEW snippets AS SELECT 'k' AS key, 'v' AS value")
        .execute(&mut conn)
        .await
        .unwrap();
    conn.close().await.unwrap();

    let err = match SqliteStore::open(&path).await {
        Ok(_) => panic!("open should fail on an unusable schema"),
        Err(err) => err,
    };
    assert!(err.to_string().contains("Failed to initialize schema"), "{}", err);

    let mut conn = db::connect(&options).await.unwrap();
    let kind: String =
        sqlx::query_scalar("SELECT type FROM sqlite_master WHERE name = 'snippets'")
            .fetch_one(&mut conn)
            .await
            .unwrap();
    assert_eq!(kind, "view");
    assert_eq!(migrate::table_columns(&mut conn).await.unwrap(), vec!["key", "value"]);
    conn.close().await.unwrap();
}
