//! src/services/attachment_store.rs
//!
//! AttachmentStore — SQLite persistence of the attachment metadata column.
//! One row per attachment on an owning record; the row carries the encoded
//! metadata set and nothing about the files themselves.

use crate::{
    models::{
        metadata::MetadataSet,
        record::{AttachmentKey, AttachmentRecord},
    },
    services::codec::{self, DecodeError},
};
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Schema applied by [`run_migrations`].
pub const INIT_MIGRATION: &str = include_str!("../../migrations/0001_init.sql");

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("attachment `{name}` not found on {record_type} `{record_id}`")]
    NotFound {
        record_type: String,
        record_id: Uuid,
        name: String,
    },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl StoreError {
    fn not_found(key: &AttachmentKey) -> Self {
        Self::NotFound {
            record_type: key.record_type.clone(),
            record_id: key.record_id,
            name: key.name.clone(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Reads and writes the metadata column of attachment rows.
#[derive(Clone)]
pub struct AttachmentStore {
    /// Shared SQLite connection pool.
    pub db: Arc<SqlitePool>,
}

impl AttachmentStore {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Fetch the full attachment row.
    ///
    /// Returns NotFound if no row exists for the key.
    pub async fn fetch(&self, key: &AttachmentKey) -> StoreResult<AttachmentRecord> {
        sqlx::query_as::<_, AttachmentRecord>(
            "SELECT id, record_type, record_id, name, meta, updated_at
             FROM attachments
             WHERE record_type = ? AND record_id = ? AND name = ?",
        )
        .bind(&key.record_type)
        .bind(key.record_id)
        .bind(&key.name)
        .fetch_one(&*self.db)
        .await
        .map_err(|err| match err {
            sqlx::Error::RowNotFound => StoreError::not_found(key),
            other => StoreError::Sqlx(other),
        })
    }

    /// Encoded metadata column, or `None` if the row is missing or the column
    /// was never written.
    pub async fn load_meta(&self, key: &AttachmentKey) -> StoreResult<Option<String>> {
        let meta = sqlx::query_scalar::<_, Option<String>>(
            "SELECT meta FROM attachments
             WHERE record_type = ? AND record_id = ? AND name = ?",
        )
        .bind(&key.record_type)
        .bind(key.record_id)
        .bind(&key.name)
        .fetch_optional(&*self.db)
        .await?;

        Ok(meta.flatten())
    }

    /// Decoded metadata set. A corrupt column is reported, never defaulted.
    pub async fn load_metadata(&self, key: &AttachmentKey) -> StoreResult<Option<MetadataSet>> {
        match self.load_meta(key).await? {
            Some(encoded) => Ok(Some(codec::decode(&encoded)?)),
            None => Ok(None),
        }
    }

    /// Upsert the metadata column for an attachment.
    pub async fn save_meta(
        &self,
        key: &AttachmentKey,
        meta: Option<&str>,
    ) -> StoreResult<AttachmentRecord> {
        let record = sqlx::query_as::<_, AttachmentRecord>(
            r#"
            INSERT INTO attachments (id, record_type, record_id, name, meta, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(record_type, record_id, name) DO UPDATE SET
                meta = excluded.meta,
                updated_at = excluded.updated_at
            RETURNING id, record_type, record_id, name, meta, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&key.record_type)
        .bind(key.record_id)
        .bind(&key.name)
        .bind(meta)
        .bind(Utc::now())
        .fetch_one(&*self.db)
        .await?;

        debug!(
            "stored metadata for {}/{}/{}",
            key.record_type, key.record_id, key.name
        );
        Ok(record)
    }

    /// All attachment rows of one owning record, ordered by name.
    pub async fn list_for_record(
        &self,
        record_type: &str,
        record_id: Uuid,
    ) -> StoreResult<Vec<AttachmentRecord>> {
        let rows = sqlx::query_as::<_, AttachmentRecord>(
            "SELECT id, record_type, record_id, name, meta, updated_at
             FROM attachments
             WHERE record_type = ? AND record_id = ?
             ORDER BY name ASC",
        )
        .bind(record_type)
        .bind(record_id)
        .fetch_all(&*self.db)
        .await?;

        Ok(rows)
    }

    /// Remove an attachment row.
    ///
    /// Returns NotFound if no row exists for the key.
    pub async fn delete(&self, key: &AttachmentKey) -> StoreResult<()> {
        let result = sqlx::query(
            "DELETE FROM attachments WHERE record_type = ? AND record_id = ? AND name = ?",
        )
        .bind(&key.record_type)
        .bind(key.record_id)
        .bind(&key.name)
        .execute(&*self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(key));
        }
        Ok(())
    }
}

/// Apply the embedded schema statement by statement.
pub async fn run_migrations(db: &SqlitePool) -> anyhow::Result<()> {
    let statements = INIT_MIGRATION
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();

    if statements.is_empty() {
        anyhow::bail!("migration script is empty");
    }

    debug!("Running {} migration statements...", statements.len());
    for stmt in statements {
        sqlx::query(stmt).execute(db).await?;
    }

    Ok(())
}
