use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use wordtally_core::{
    AnalysisResult, AppError, FileOutcome, FileRecord, FileStatus, OwnerFileEntry,
    StorageLocation,
};

use super::store::{CreateOutcome, MetadataStore};

const RECORD_COLUMNS: &str = r#"
    file_id, owner_id, fingerprint_hash, bucket, storage_key, original_file_name,
    content_type, status, created_at, updated_at, result, error_message
"#;

const ENTRY_COLUMNS: &str = r#"
    owner_id, file_id, original_file_name, status, created_at, updated_at,
    result, error_message
"#;

/// PostgreSQL-backed metadata store (`file_records` + `owner_file_history`).
#[derive(Clone)]
pub struct PgMetadataStore {
    pool: PgPool,
}

impl PgMetadataStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn parse_status(raw: &str) -> Result<FileStatus, AppError> {
    raw.parse::<FileStatus>()
        .map_err(|e| AppError::Internal(format!("Corrupt status column: {}", e)))
}

fn record_from_row(row: &PgRow) -> Result<FileRecord, AppError> {
    let status: String = row.try_get("status")?;
    let result: Option<Json<AnalysisResult>> = row.try_get("result")?;
    Ok(FileRecord {
        file_id: row.try_get("file_id")?,
        owner_id: row.try_get("owner_id")?,
        fingerprint_hash: row.try_get("fingerprint_hash")?,
        storage: StorageLocation {
            bucket: row.try_get("bucket")?,
            key: row.try_get("storage_key")?,
        },
        original_file_name: row.try_get("original_file_name")?,
        content_type: row.try_get("content_type")?,
        status: parse_status(&status)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        result: result.map(|Json(r)| r),
        error_message: row.try_get("error_message")?,
    })
}

fn entry_from_row(row: &PgRow) -> Result<OwnerFileEntry, AppError> {
    let status: String = row.try_get("status")?;
    let result: Option<Json<AnalysisResult>> = row.try_get("result")?;
    Ok(OwnerFileEntry {
        owner_id: row.try_get("owner_id")?,
        file_id: row.try_get("file_id")?,
        original_file_name: row.try_get("original_file_name")?,
        status: parse_status(&status)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        result: result.map(|Json(r)| r),
        error_message: row.try_get("error_message")?,
    })
}

#[async_trait]
impl MetadataStore for PgMetadataStore {
    async fn get(&self, file_id: &str) -> Result<Option<FileRecord>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM file_records WHERE file_id = $1",
            RECORD_COLUMNS
        ))
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn create_pending(&self, record: &FileRecord) -> Result<CreateOutcome, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO file_records (
                file_id, owner_id, fingerprint_hash, bucket, storage_key,
                original_file_name, content_type, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (file_id) DO NOTHING
            "#,
        )
        .bind(&record.file_id)
        .bind(&record.owner_id)
        .bind(&record.fingerprint_hash)
        .bind(&record.storage.bucket)
        .bind(&record.storage.key)
        .bind(&record.original_file_name)
        .bind(&record.content_type)
        .bind(record.status.as_str())
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            Ok(CreateOutcome::Created)
        } else {
            Ok(CreateOutcome::AlreadyExists)
        }
    }

    async fn try_transition(
        &self,
        file_id: &str,
        from: &[FileStatus],
        to: FileStatus,
        at_ms: i64,
    ) -> Result<bool, AppError> {
        let from: Vec<&str> = from.iter().map(FileStatus::as_str).collect();

        // Single-statement conditional update; the row lock serializes racing claims.
        let result = sqlx::query(
            r#"
            UPDATE file_records
            SET status = $3, updated_at = $4, result = NULL, error_message = NULL
            WHERE file_id = $1 AND status = ANY($2)
            "#,
        )
        .bind(file_id)
        .bind(&from)
        .bind(to.as_str())
        .bind(at_ms)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn write_outcome(
        &self,
        file_id: &str,
        outcome: &FileOutcome,
        at_ms: i64,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE file_records
            SET status = $2, result = $3, error_message = $4, updated_at = $5
            WHERE file_id = $1
            "#,
        )
        .bind(file_id)
        .bind(outcome.status().as_str())
        .bind(outcome.result().map(Json))
        .bind(outcome.error_message())
        .bind(at_ms)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn get_owner_entry(
        &self,
        owner_id: &str,
        file_id: &str,
    ) -> Result<Option<OwnerFileEntry>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM owner_file_history WHERE owner_id = $1 AND file_id = $2",
            ENTRY_COLUMNS
        ))
        .bind(owner_id)
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(entry_from_row).transpose()
    }

    async fn upsert_owner_entry(&self, entry: &OwnerFileEntry) -> Result<bool, AppError> {
        // The share lock on the primary row makes a concurrent delete wait for this
        // statement, so the delete's owner-view cleanup always sees the new row.
        let row = sqlx::query(
            r#"
            WITH primary_row AS (
                SELECT file_id FROM file_records WHERE file_id = $2 FOR SHARE
            ),
            upserted AS (
                INSERT INTO owner_file_history (
                    owner_id, file_id, original_file_name, status, created_at, updated_at,
                    result, error_message
                )
                SELECT $1, file_id, $3, $4, $5, $6, $7, $8 FROM primary_row
                ON CONFLICT (owner_id, file_id) DO UPDATE SET
                    original_file_name = EXCLUDED.original_file_name,
                    status = EXCLUDED.status,
                    updated_at = EXCLUDED.updated_at,
                    result = EXCLUDED.result,
                    error_message = EXCLUDED.error_message
                WHERE owner_file_history.updated_at <= EXCLUDED.updated_at
                RETURNING 1
            )
            SELECT EXISTS (SELECT 1 FROM primary_row) AS primary_exists
            "#,
        )
        .bind(&entry.owner_id)
        .bind(&entry.file_id)
        .bind(&entry.original_file_name)
        .bind(entry.status.as_str())
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .bind(entry.result.as_ref().map(Json))
        .bind(entry.error_message.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("primary_exists")?)
    }

    async fn remove_orphaned_owner_entry(
        &self,
        owner_id: &str,
        file_id: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            DELETE FROM owner_file_history
            WHERE owner_id = $1 AND file_id = $2
              AND NOT EXISTS (SELECT 1 FROM file_records WHERE file_id = $2)
            "#,
        )
        .bind(owner_id)
        .bind(file_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_records_by_owner(&self, owner_id: &str) -> Result<Vec<FileRecord>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM file_records WHERE owner_id = $1",
            RECORD_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(record_from_row).collect()
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<OwnerFileEntry>, AppError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM owner_file_history
            WHERE owner_id = $1
            ORDER BY created_at DESC, file_id ASC
            "#,
            ENTRY_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(entry_from_row).collect()
    }

    async fn delete(&self, file_id: &str, owner_id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM file_records WHERE file_id = $1")
            .bind(file_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM owner_file_history WHERE owner_id = $1 AND file_id = $2")
            .bind(owner_id)
            .bind(file_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
