//! UploadService — the gallery's business rules.
//!
//! Ties the metadata repository (SQLite) to the media store (local disk).
//! No transaction spans the two:
//! - `receive_file` streams the body into a staged temp file
//! - `create` renames it into place, then inserts the row; a failed insert
//!   removes the file again before the error is returned
//! - `discard` drops a staged file when the request fails before `create`
//! - delete removes the file best-effort, then always deletes the row
//!
//! A crash between the file rename and the insert still leaves an orphan
//! file. Raw fetch serves whatever is on disk, record or not.

use crate::{
    models::upload::{NewUpload, UploadRecord, UploadView, is_video_content_type},
    services::{
        error::{GalleryError, GalleryResult},
        media_store::{MAX_COMPONENT_LEN, MediaStore, StagedFile, client_basename},
        repository::UploadRepository,
    },
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::Stream;
use std::io;
use tokio::fs::File;
use tracing::{info, warn};

/// A received file that has been written to disk but has no record yet.
///
/// Finish with `UploadService::create` or drop with `UploadService::discard`.
#[derive(Debug)]
pub struct PendingUpload {
    /// Final name in the media directory (`{unix_secs}_{client_name}`).
    pub filename: String,
    pub is_video: bool,
    pub received_at: DateTime<Utc>,
    staged: StagedFile,
}

#[derive(Clone)]
pub struct UploadService {
    pub repo: UploadRepository,
    pub media: MediaStore,
}

impl UploadService {
    pub fn new(repo: UploadRepository, media: MediaStore) -> Self {
        Self { repo, media }
    }

    /// Validate the client filename and stream `body` into a staged file.
    pub async fn receive_file<S>(
        &self,
        original_filename: &str,
        content_type: &str,
        body: S,
    ) -> GalleryResult<PendingUpload>
    where
        S: Stream<Item = io::Result<Bytes>>,
    {
        self.receive_file_at(original_filename, content_type, body, Utc::now())
            .await
    }

    pub(crate) async fn receive_file_at<S>(
        &self,
        original_filename: &str,
        content_type: &str,
        body: S,
        now: DateTime<Utc>,
    ) -> GalleryResult<PendingUpload>
    where
        S: Stream<Item = io::Result<Bytes>>,
    {
        let client_name = client_basename(original_filename);
        if client_name.is_empty() {
            return Err(GalleryError::Validation("No selected file".into()));
        }
        let filename = generated_filename(now, client_name);
        if filename.len() > MAX_COMPONENT_LEN {
            return Err(GalleryError::Validation("Filename too long".into()));
        }

        let staged = self.media.stage(body).await?;
        Ok(PendingUpload {
            filename,
            is_video: is_video_content_type(content_type),
            received_at: now,
            staged,
        })
    }

    /// Publish a received file under its name and insert its record.
    ///
    /// If the insert fails the published file is removed again.
    pub async fn create(
        &self,
        pending: PendingUpload,
        author: String,
        description: String,
        base_url: &str,
    ) -> GalleryResult<UploadView> {
        let upload = NewUpload {
            author,
            description,
            filename: pending.filename,
            is_video: pending.is_video,
            created_at: pending.received_at,
        };

        self.media.commit(pending.staged, &upload.filename).await?;

        let id = match self.repo.insert(&upload).await {
            Ok(id) => id,
            Err(err) => {
                warn!(
                    "insert for {} failed, removing stored file: {}",
                    upload.filename, err
                );
                if let Err(cleanup_err) = self.media.remove(&upload.filename).await {
                    warn!("could not remove orphan {}: {}", upload.filename, cleanup_err);
                }
                return Err(err);
            }
        };

        info!(id, filename = %upload.filename, is_video = upload.is_video, "upload created");
        Ok(UploadView::from_record(&upload.into_record(id), base_url))
    }

    /// Drop a received file whose request failed before `create`.
    pub async fn discard(&self, pending: PendingUpload) {
        self.media.discard(pending.staged).await;
    }

    /// Every upload, newest first.
    pub async fn list(&self, base_url: &str) -> GalleryResult<Vec<UploadView>> {
        let records = self.repo.list_all().await?;
        Ok(records
            .iter()
            .map(|record| UploadView::from_record(record, base_url))
            .collect())
    }

    /// Remove an upload's file and row.
    ///
    /// The row is deleted even if the file is missing or cannot be removed.
    pub async fn delete(&self, id: i64) -> GalleryResult<UploadRecord> {
        let record = self.repo.get_by_id(id).await?;

        if let Err(err) = self.media.remove(&record.filename).await {
            warn!("could not remove media file {}: {}", record.filename, err);
        }

        self.repo.delete_by_id(id).await?;
        info!(id, filename = %record.filename, "upload deleted");
        Ok(record)
    }

    /// Open a stored file by name. Independent of the repository.
    pub async fn open_file(&self, filename: &str) -> GalleryResult<(File, u64)> {
        self.media.open(filename).await
    }
}

/// `{unix_seconds}_{client_name}`.
fn generated_filename(now: DateTime<Utc>, client_name: &str) -> String {
    format!("{}_{}", now.timestamp(), client_name)
}
