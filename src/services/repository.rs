//! UploadRepository — the `uploads` table in SQLite.
//!
//! The repository owns the authoritative existence of an upload. It knows
//! nothing about the media directory.

use crate::{
    models::upload::{NewUpload, UploadRecord},
    services::error::{GalleryError, GalleryResult},
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::debug;

/// Embedded schema; every statement is idempotent.
const INIT_SQL: &str = include_str!("../../migrations/0001_init.sql");

const SELECT_COLUMNS: &str = "SELECT id, author, description, filename, is_video, created_at FROM uploads";

#[derive(Clone)]
pub struct UploadRepository {
    pub db: Arc<SqlitePool>,
}

impl UploadRepository {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Create the `uploads` table and its index if they are missing.
    ///
    /// Safe to call on every process start.
    pub async fn initialize(&self) -> GalleryResult<()> {
        let statements = migration_statements(INIT_SQL);
        debug!("Running {} schema statements", statements.len());

        for stmt in statements {
            debug!("Executing migration SQL: {}", stmt);
            sqlx::query(stmt).execute(&*self.db).await?;
        }
        Ok(())
    }

    /// All uploads, newest first. Ties on `created_at` fall back to `id`.
    pub async fn list_all(&self) -> GalleryResult<Vec<UploadRecord>> {
        let rows = sqlx::query_as::<_, UploadRecord>(&format!(
            "{SELECT_COLUMNS} ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&*self.db)
        .await?;
        Ok(rows)
    }

    /// Insert a row and return the id SQLite assigned to it.
    pub async fn insert(&self, upload: &NewUpload) -> GalleryResult<i64> {
        let result = sqlx::query(
            "INSERT INTO uploads (author, description, filename, is_video, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&upload.author)
        .bind(&upload.description)
        .bind(&upload.filename)
        .bind(upload.is_video)
        .bind(upload.created_at)
        .execute(&*self.db)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Fetch a single upload; `UploadNotFound` if the id is unknown.
    pub async fn get_by_id(&self, id: i64) -> GalleryResult<UploadRecord> {
        sqlx::query_as::<_, UploadRecord>(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_one(&*self.db)
            .await
            .map_err(|err| match err {
                sqlx::Error::RowNotFound => GalleryError::UploadNotFound(id),
                other => GalleryError::Sqlx(other),
            })
    }

    /// Delete a row. `UploadNotFound` when nothing matched, `Sqlx` on
    /// storage failure.
    pub async fn delete_by_id(&self, id: i64) -> GalleryResult<()> {
        let result = sqlx::query("DELETE FROM uploads WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(GalleryError::UploadNotFound(id));
        }
        Ok(())
    }
}

fn migration_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}
