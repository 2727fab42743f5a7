//! SQLite post store implementation

use async_trait::async_trait;
use rss_relay_domain::{PostRecord, PostStore, StateError};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::path::Path;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// SQLite-backed post store
pub struct SqlitePostStore {
    pool: SqlitePool,
}

impl SqlitePostStore {
    /// Open the store, creating the database file and schema if needed
    pub async fn open(db_path: impl AsRef<Path>) -> Result<Self, StateError> {
        let db_path = db_path.as_ref();

        // Create parent directories if needed
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StateError::Database(format!("Failed to create directory: {}", e))
                })?;
            }
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        // Single writer: one connection serializes every statement
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&db_url)
            .await
            .map_err(|e| StateError::Database(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing)
    pub async fn in_memory() -> Result<Self, StateError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| StateError::Database(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Close the underlying connection, waiting for in-flight statements
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn run_migrations(&self) -> Result<(), StateError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS published_posts (
                link TEXT PRIMARY KEY,
                content_hash TEXT NOT NULL,
                timestamp TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StateError::Database(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl PostStore for SqlitePostStore {
    async fn get(&self, link: &str) -> Result<Option<PostRecord>, StateError> {
        let row: Option<(String, String, String)> = sqlx::query_as(
            "SELECT link, content_hash, timestamp FROM published_posts WHERE link = ?",
        )
        .bind(link)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StateError::Database(e.to_string()))?;

        match row {
            Some((link, content_hash, timestamp_str)) => {
                let timestamp = OffsetDateTime::parse(&timestamp_str, &Rfc3339)
                    .map_err(|e| StateError::Serialization(e.to_string()))?;

                Ok(Some(PostRecord {
                    link,
                    content_hash,
                    timestamp,
                }))
            }
            None => Ok(None),
        }
    }

    async fn upsert(&self, record: &PostRecord) -> Result<(), StateError> {
        let timestamp_str = record
            .timestamp
            .format(&Rfc3339)
            .map_err(|e| StateError::Serialization(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO published_posts (link, content_hash, timestamp)
            VALUES (?, ?, ?)
            ON CONFLICT(link) DO UPDATE SET
                content_hash = excluded.content_hash,
                timestamp = excluded.timestamp
            "#,
        )
        .bind(&record.link)
        .bind(&record.content_hash)
        .bind(&timestamp_str)
        .execute(&self.pool)
        .await
        .map_err(|e| StateError::Database(e.to_string()))?;

        Ok(())
    }
}
