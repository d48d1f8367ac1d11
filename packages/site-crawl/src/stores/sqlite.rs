//! SQLite record store.
//!
//! A file-based backend for local development and single-process
//! deployments. Timestamps are stored as fixed-precision RFC 3339 text so
//! that string ordering matches time ordering.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use tracing::debug;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::traits::store::RecordStore;
use crate::types::record::StoredCrawlRecord;
use crate::types::request::UrlRole;

/// SQLite-based record store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new SQLite store with the given connection URL.
    ///
    /// # Example URLs
    /// - `sqlite::memory:` - In-memory database (ephemeral)
    /// - `sqlite://./crawl.db?mode=rwc` - File-based, created if missing
    pub async fn new(database_url: &str) -> StoreResult<Self> {
        Self::connect(database_url, 5).await
    }

    /// Create an in-memory SQLite store (for testing).
    ///
    /// Uses a single connection: every new connection to `:memory:` would
    /// see its own empty database.
    pub async fn in_memory() -> StoreResult<Self> {
        Self::connect("sqlite::memory:", 1).await
    }

    async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Database(Box::new(e)))?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Create the results table if it does not exist.
    async fn run_migrations(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS crawl_results (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                url TEXT NOT NULL,
                status TEXT NOT NULL,
                extracted_content TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(Box::new(e)))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_crawl_results_owner ON crawl_results(owner_id, created_at)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(Box::new(e)))?;

        debug!("SQLite crawl_results table ready");
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[derive(Debug, FromRow)]
struct RecordRow {
    id: String,
    owner_id: String,
    url: String,
    status: String,
    extracted_content: String,
    created_at: String,
}

impl RecordRow {
    fn into_record(self) -> StoreResult<StoredCrawlRecord> {
        let id = Uuid::parse_str(&self.id).map_err(|e| StoreError::InvalidRecord {
            reason: format!("bad id {}: {e}", self.id),
        })?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| StoreError::InvalidRecord {
                reason: format!("bad created_at {}: {e}", self.created_at),
            })?
            .with_timezone(&Utc);

        Ok(StoredCrawlRecord {
            id,
            owner_id: self.owner_id,
            url: self.url,
            status: self.status,
            extracted_content: serde_json::from_str(&self.extracted_content)?,
            created_at,
        })
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn insert_record(&self, record: &StoredCrawlRecord) -> StoreResult<()> {
        let content = serde_json::to_string(&record.extracted_content)?;

        sqlx::query(
            r#"
            INSERT INTO crawl_results (id, owner_id, url, status, extracted_content, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id.to_string())
        .bind(&record.owner_id)
        .bind(&record.url)
        .bind(&record.status)
        .bind(content)
        .bind(record.created_at.to_rfc3339_opts(SecondsFormat::Micros, true))
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(Box::new(e)))?;

        Ok(())
    }

    async fn records_for_owner(
        &self,
        owner_id: &str,
        role: UrlRole,
        limit: Option<usize>,
    ) -> StoreResult<Vec<StoredCrawlRecord>> {
        // LIMIT -1 means no limit in SQLite
        let limit = limit.map(|l| l as i64).unwrap_or(-1);

        let rows: Vec<RecordRow> = sqlx::query_as(
            r#"
            SELECT id, owner_id, url, status, extracted_content, created_at
            FROM crawl_results
            WHERE owner_id = ? AND json_extract(extracted_content, '$.url_type') = ?
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(owner_id)
        .bind(role.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Database(Box::new(e)))?;

        rows.into_iter().map(RecordRow::into_record).collect()
    }
}
