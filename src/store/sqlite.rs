//! SQLite-backed record store.
//!
//! Uniqueness of `domain` is enforced by the database: the column carries a
//! `UNIQUE` constraint and inserts use `ON CONFLICT(domain) DO NOTHING`, so two
//! concurrent first sightings can never both be recorded. Every optional feed
//! field is stored as JSON text and read back as the same JSON value.

use super::{validate_collection_name, StoreError};
use crate::core::{DomainRecord, InsertOutcome, RecordStore};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::str::FromStr;
use tracing::{debug, info, instrument};

/// Record store persisting domains into a single SQLite table.
pub struct SqliteRecordStore {
    pool: SqlitePool,
    collection: String,
    insert_sql: String,
    select_sql: String,
    count_sql: String,
}

impl SqliteRecordStore {
    /// Opens the database and prepares the collection.
    ///
    /// # Arguments
    /// * `url` - SQLite connection string, e.g. `sqlite://trawler.db`. The file
    ///   is created if missing.
    /// * `collection` - Table name holding the records.
    /// * `max_connections` - Upper bound of the connection pool.
    #[instrument(skip(url))]
    pub async fn connect(
        url: &str,
        collection: &str,
        max_connections: u32,
    ) -> Result<Self, StoreError> {
        validate_collection_name(collection)?;

        let options = SqliteConnectOptions::from_str(url)
            .map_err(StoreError::Connection)?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await
            .map_err(StoreError::Connection)?;

        let store = Self::with_pool(pool, collection);
        store.ensure_schema().await?;
        info!(collection, "Record store ready");
        Ok(store)
    }

    /// Opens a private in-memory database.
    ///
    /// An in-memory SQLite database lives only as long as its connection, so
    /// the pool is pinned to one connection that never expires.
    pub async fn in_memory(collection: &str) -> Result<Self, StoreError> {
        validate_collection_name(collection)?;

        let options =
            SqliteConnectOptions::from_str("sqlite::memory:").map_err(StoreError::Connection)?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(StoreError::Connection)?;

        let store = Self::with_pool(pool, collection);
        store.ensure_schema().await?;
        Ok(store)
    }

    fn with_pool(pool: SqlitePool, collection: &str) -> Self {
        let insert_sql = format!(
            r#"INSERT INTO "{collection}"
                (domain, cert_index, source_name, observed_timestamp, confidence, received_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(domain) DO NOTHING"#
        );
        let select_sql = format!(
            r#"SELECT domain, cert_index, source_name, observed_timestamp, confidence, received_at
            FROM "{collection}" WHERE domain = ?"#
        );
        let count_sql = format!(r#"SELECT COUNT(*) FROM "{collection}""#);

        Self {
            pool,
            collection: collection.to_string(),
            insert_sql,
            select_sql,
            count_sql,
        }
    }

    /// Creates the collection and its unique index if they do not exist.
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        let collection = &self.collection;
        let schema_err = |source| StoreError::Schema {
            collection: collection.clone(),
            source,
        };

        sqlx::query(&format!(
            r#"CREATE TABLE IF NOT EXISTS "{collection}" (
                domain TEXT NOT NULL UNIQUE,
                cert_index TEXT,
                source_name TEXT,
                observed_timestamp TEXT,
                confidence TEXT,
                received_at TEXT NOT NULL
            )"#
        ))
        .execute(&self.pool)
        .await
        .map_err(schema_err)?;

        // Covers tables created by older versions without the column constraint.
        sqlx::query(&format!(
            r#"CREATE UNIQUE INDEX IF NOT EXISTS "idx_{collection}_domain" ON "{collection}"(domain)"#
        ))
        .execute(&self.pool)
        .await
        .map_err(schema_err)?;

        Ok(())
    }

    /// Returns the name of the backing table.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Gets the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[derive(Debug, FromRow)]
struct RecordRow {
    domain: String,
    cert_index: Option<String>,
    source_name: Option<String>,
    observed_timestamp: Option<String>,
    confidence: Option<String>,
    received_at: String,
}

impl RecordRow {
    fn into_record(self) -> Result<DomainRecord, StoreError> {
        Ok(DomainRecord {
            cert_index: decode_json_column(self.cert_index)?,
            source_name: decode_json_column(self.source_name)?,
            observed_timestamp: decode_json_column(self.observed_timestamp)?,
            confidence: decode_json_column(self.confidence)?,
            domain: self.domain,
            received_at: self.received_at,
        })
    }
}

fn encode_json_column(value: &Option<Value>) -> Option<String> {
    value.as_ref().map(Value::to_string)
}

fn decode_json_column(column: Option<String>) -> Result<Option<Value>, StoreError> {
    column
        .map(|text| serde_json::from_str(&text).map_err(|e| StoreError::Corrupt(e.to_string())))
        .transpose()
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn insert_if_absent(&self, record: &DomainRecord) -> Result<InsertOutcome, StoreError> {
        let result = sqlx::query(&self.insert_sql)
            .bind(&record.domain)
            .bind(encode_json_column(&record.cert_index))
            .bind(encode_json_column(&record.source_name))
            .bind(encode_json_column(&record.observed_timestamp))
            .bind(encode_json_column(&record.confidence))
            .bind(&record.received_at)
            .execute(&self.pool)
            .await?;

        let outcome = if result.rows_affected() == 1 {
            InsertOutcome::Inserted
        } else {
            InsertOutcome::AlreadyExists
        };
        debug!(domain = %record.domain, ?outcome, "insert_if_absent");
        Ok(outcome)
    }

    async fn get(&self, domain: &str) -> Result<Option<DomainRecord>, StoreError> {
        sqlx::query_as::<_, RecordRow>(&self.select_sql)
            .bind(domain)
            .fetch_optional(&self.pool)
            .await?
            .map(RecordRow::into_record)
            .transpose()
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar(&self.count_sql)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }
}
