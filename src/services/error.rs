use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("{0}")]
    Validation(String),
    #[error("upload `{0}` not found")]
    UploadNotFound(i64),
    #[error("file `{0}` not found")]
    FileNotFound(String),
    #[error("invalid filename")]
    InvalidFilename,
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type GalleryResult<T> = Result<T, GalleryError>;
