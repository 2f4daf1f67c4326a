// ABOUTME: Integration tests for database bootstrap
// ABOUTME: Verifies migrations, pragmas, and uniqueness-violation detection

use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tagkit_storage::{
    begin_write, connect, connect_with_options, is_unique_violation, DatabaseConfig, StorageError,
};
use tempfile::TempDir;

async fn create_test_db() -> (SqlitePool, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let pool = connect(&temp_dir.path().join("nested").join("tagging.db"))
        .await
        .unwrap();
    (pool, temp_dir)
}

#[tokio::test]
async fn test_connect_creates_schema() {
    let (pool, _temp_dir) = create_test_db().await;

    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name LIKE 'tagging_%' ORDER BY name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    assert_eq!(
        tables,
        vec![
            "tagging_tag_groups",
            "tagging_tagged",
            "tagging_tags",
            "tagging_tags_translations",
        ]
    );
}

#[tokio::test]
async fn test_foreign_keys_enabled() {
    let (pool, _temp_dir) = create_test_db().await;

    let enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(enabled, 1);
}

#[tokio::test]
async fn test_duplicate_slug_is_unique_violation() {
    let (pool, _temp_dir) = create_test_db().await;

    let insert = "INSERT INTO tagging_tags (id, name, slug) VALUES (?, ?, ?)";
    sqlx::query(insert)
        .bind("tag-1")
        .bind("Cooking")
        .bind("cooking")
        .execute(&pool)
        .await
        .unwrap();

    let err = sqlx::query(insert)
        .bind("tag-2")
        .bind("COOKING")
        .bind("cooking")
        .execute(&pool)
        .await
        .unwrap_err();

    assert!(is_unique_violation(&err));
    assert!(StorageError::Sqlx(err).is_unique_violation());
    assert!(!StorageError::NotFound("x".to_string()).is_unique_violation());
}

#[tokio::test]
async fn test_negative_count_rejected() {
    let (pool, _temp_dir) = create_test_db().await;

    let result = sqlx::query("INSERT INTO tagging_tags (id, name, slug, count) VALUES ('t', 'T', 't', -1)")
        .execute(&pool)
        .await;
    assert!(result.is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_write_transactions_read_then_write_concurrently() {
    let (pool, _temp_dir) = create_test_db().await;

    let mut handles = Vec::new();
    for i in 0..12 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            let mut tx = begin_write(&pool).await?;

            let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tagging_tags")
                .fetch_one(&mut *tx)
                .await?;
            sqlx::query("INSERT INTO tagging_tags (id, name, slug) VALUES (?, ?, ?)")
                .bind(format!("tag-{}", i))
                .bind(format!("Tag {}", existing))
                .bind(format!("tag-{}", i))
                .execute(&mut *tx)
                .await?;

            tx.commit().await?;
            Ok::<_, StorageError>(())
        }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // Each writer saw every commit before it, so the names are distinct
    let names: Vec<String> = sqlx::query_scalar("SELECT DISTINCT name FROM tagging_tags")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(names.len(), 12);
}

#[tokio::test]
async fn test_connect_with_options_applies_pool_settings() {
    let temp_dir = TempDir::new().unwrap();
    let options = SqliteConnectOptions::new()
        .filename(temp_dir.path().join("custom.db"))
        .create_if_missing(true);
    let config = DatabaseConfig {
        max_connections: 2,
        ..DatabaseConfig::default()
    };

    let pool = connect_with_options(options, config).await.unwrap();

    assert_eq!(pool.options().get_max_connections(), 2);
    let journal_mode: String = sqlx::query_scalar("PRAGMA journal_mode")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(journal_mode, "wal");
}
