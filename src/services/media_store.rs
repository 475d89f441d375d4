//! MediaStore — uploaded payloads on local disk.
//!
//! Files live flat beneath `root` under the exact name the caller gives.
//! Reads may address nested paths, but nothing may resolve outside `root`.
//!
//! Writes happen in two steps: `stage` streams the body into a hidden temp
//! file, `commit` renames it to its final name. `discard` drops a staged file.

use crate::services::error::{GalleryError, GalleryResult};
use bytes::Bytes;
use futures::{Stream, StreamExt, pin_mut};
use std::{
    io::{self, ErrorKind},
    path::{Component, Path, PathBuf},
};
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::debug;
use uuid::Uuid;

const MAX_FILENAME_LEN: usize = 1024;

/// Per-component limit of common filesystems (ext4, APFS, NTFS).
pub const MAX_COMPONENT_LEN: usize = 255;

#[derive(Clone, Debug)]
pub struct MediaStore {
    root: PathBuf,
}

/// A fully written, fsynced temp file not yet visible under its final name.
#[derive(Debug)]
pub struct StagedFile {
    tmp_path: PathBuf,
    pub size_bytes: u64,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map `filename` to a path under `root`.
    ///
    /// Rejects empty or over-long names, absolute paths, `..`, backslashes
    /// and control characters.
    pub fn resolve(&self, filename: &str) -> GalleryResult<PathBuf> {
        if filename.is_empty() || filename.len() > MAX_FILENAME_LEN {
            return Err(GalleryError::InvalidFilename);
        }
        if filename
            .bytes()
            .any(|b| b.is_ascii_control() || b == b'\\')
        {
            return Err(GalleryError::InvalidFilename);
        }

        let mut path = self.root.clone();
        for component in Path::new(filename).components() {
            match component {
                Component::Normal(part) if part.len() <= MAX_COMPONENT_LEN => path.push(part),
                Component::CurDir => {}
                Component::Normal(_)
                | Component::ParentDir
                | Component::RootDir
                | Component::Prefix(_) => {
                    return Err(GalleryError::InvalidFilename);
                }
            }
        }
        if path == self.root {
            return Err(GalleryError::InvalidFilename);
        }
        Ok(path)
    }

    /// Stream `body` chunk by chunk into a temp file under `root`.
    ///
    /// The temp file is flushed and fsynced before returning, and removed
    /// again if any chunk or write fails.
    pub async fn stage<S>(&self, body: S) -> GalleryResult<StagedFile>
    where
        S: Stream<Item = io::Result<Bytes>>,
    {
        fs::create_dir_all(&self.root).await?;
        let tmp_path = self.root.join(format!(".tmp-{}", Uuid::new_v4()));
        let mut file = File::create(&tmp_path).await?;

        let mut size_bytes: u64 = 0;
        pin_mut!(body);
        while let Some(chunk_res) = body.next().await {
            let chunk = match chunk_res {
                Ok(chunk) => chunk,
                Err(err) => {
                    let _ = fs::remove_file(&tmp_path).await;
                    return Err(GalleryError::Io(err));
                }
            };
            size_bytes += chunk.len() as u64;
            if let Err(err) = file.write_all(&chunk).await {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(GalleryError::Io(err));
            }
        }
        if let Err(err) = file.flush().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(GalleryError::Io(err));
        }
        if let Err(err) = file.sync_all().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(GalleryError::Io(err));
        }

        debug!("staged {} bytes at {}", size_bytes, tmp_path.display());
        Ok(StagedFile {
            tmp_path,
            size_bytes,
        })
    }

    /// Rename a staged file to `filename`, replacing any existing file.
    ///
    /// The staged file is removed if the name is invalid or the rename fails.
    pub async fn commit(&self, staged: StagedFile, filename: &str) -> GalleryResult<PathBuf> {
        let file_path = match self.resolve(filename) {
            Ok(path) => path,
            Err(err) => {
                self.discard(staged).await;
                return Err(err);
            }
        };

        if let Some(parent) = file_path.parent() {
            if let Err(err) = fs::create_dir_all(parent).await {
                self.discard(staged).await;
                return Err(GalleryError::Io(err));
            }
        }

        if let Err(err) = fs::rename(&staged.tmp_path, &file_path).await {
            self.discard(staged).await;
            return Err(GalleryError::Io(err));
        }

        debug!(
            "stored {} bytes at {}",
            staged.size_bytes,
            file_path.display()
        );
        Ok(file_path)
    }

    /// Remove a staged file that will never be committed.
    pub async fn discard(&self, staged: StagedFile) {
        if let Err(err) = fs::remove_file(&staged.tmp_path).await {
            if err.kind() != ErrorKind::NotFound {
                debug!(
                    "could not remove staged file {}: {}",
                    staged.tmp_path.display(),
                    err
                );
            }
        }
    }

    /// Delete `filename`. A missing file is not an error.
    pub async fn remove(&self, filename: &str) -> GalleryResult<()> {
        let file_path = self.resolve(filename)?;
        match fs::remove_file(&file_path).await {
            Ok(_) => debug!("removed media file {}", file_path.display()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("media file {} already missing", file_path.display());
            }
            Err(err) => return Err(GalleryError::Io(err)),
        }
        Ok(())
    }

    /// Open `filename` for streaming, returning the handle and its length.
    ///
    /// Missing files and directories are `FileNotFound`.
    pub async fn open(&self, filename: &str) -> GalleryResult<(File, u64)> {
        let file_path = self.resolve(filename)?;
        let not_found = || GalleryError::FileNotFound(filename.to_string());

        let meta = fs::metadata(&file_path).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                not_found()
            } else {
                GalleryError::Io(err)
            }
        })?;
        if !meta.is_file() {
            return Err(not_found());
        }

        let file = File::open(&file_path).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                not_found()
            } else {
                GalleryError::Io(err)
            }
        })?;
        Ok((file, meta.len()))
    }
}

/// Reduce a client-supplied name to its final path component.
///
/// Both `/` and `\` count as separators. May return an empty string.
pub fn client_basename(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or("").trim()
}
