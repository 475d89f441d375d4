//! HTTP handlers for the gallery API.
//! Multipart decoding and response shaping live here; storage concerns are
//! delegated to `UploadService`.

use crate::{
    errors::AppError,
    models::upload::UploadView,
    services::{
        error::GalleryError,
        upload_service::{PendingUpload, UploadService},
    },
    state::AppState,
};
use axum::{
    Json,
    body::Body,
    extract::{
        Multipart, Path, State,
        multipart::MultipartError,
        rejection::PathRejection,
    },
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::Response,
};
use futures::StreamExt;
use serde::Serialize;
use std::io;
use tokio_util::io::ReaderStream;
use tracing::debug;

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// GET `/api/uploads` — all uploads, newest first.
pub async fn list_uploads(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<UploadView>>, AppError> {
    let base_url = state.base_url_for(&headers);
    let uploads = state.uploads.list(&base_url).await?;
    Ok(Json(uploads))
}

/// Fields collected from the upload form.
#[derive(Debug, Default)]
struct UploadForm {
    file: Option<PendingUpload>,
    author: Option<String>,
    description: String,
}

/// POST `/api/uploads` — multipart form with `file`, `author`, `description`.
///
/// The file part is streamed to disk as it arrives; if the request then
/// fails, the staged file is discarded.
pub async fn create_upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<UploadView>, AppError> {
    let mut form = UploadForm::default();
    if let Err(err) = read_form(&state.uploads, &mut multipart, &mut form).await {
        if let Some(pending) = form.file.take() {
            state.uploads.discard(pending).await;
        }
        return Err(err);
    }

    let Some(pending) = form.file else {
        return Err(AppError::bad_request("No file part"));
    };
    let Some(author) = form.author else {
        state.uploads.discard(pending).await;
        return Err(AppError::bad_request("author is required"));
    };

    let base_url = state.base_url_for(&headers);
    let created = state
        .uploads
        .create(pending, author, form.description, &base_url)
        .await?;

    Ok(Json(created))
}

async fn read_form(
    uploads: &UploadService,
    multipart: &mut Multipart,
    form: &mut UploadForm,
) -> Result<(), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Failed to read multipart data", e))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" if form.file.is_some() => debug!("Ignoring additional file field"),
            "file" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let content_type = field.content_type().map(str::to_string).unwrap_or_else(|| {
                    mime_guess::from_path(&file_name)
                        .first_or_octet_stream()
                        .to_string()
                });
                let body = field.map(|chunk| chunk.map_err(io::Error::other));
                let pending = uploads
                    .receive_file(&file_name, &content_type, body)
                    .await
                    .map_err(file_error)?;
                form.file = Some(pending);
            }
            "author" => {
                form.author = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| multipart_error("Failed to read author field", e))?,
                );
            }
            "description" => {
                form.description = field
                    .text()
                    .await
                    .map_err(|e| multipart_error("Failed to read description field", e))?;
            }
            _ => debug!("Ignoring unknown field: {}", field_name),
        }
    }
    Ok(())
}

/// Keep the status multipart parsing chose (400, 413, ...).
fn multipart_error(context: &str, err: MultipartError) -> AppError {
    debug!("{}: {}", context, err);
    AppError::new(err.status(), format!("{}: {}", context, err.body_text()))
}

/// Body errors reach the store wrapped in `io::Error`; unwrap them again.
fn file_error(err: GalleryError) -> AppError {
    if let GalleryError::Io(io_err) = &err {
        if let Some(multipart_err) = io_err
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<MultipartError>())
        {
            debug!("Failed to read file data: {}", multipart_err);
            return AppError::new(
                multipart_err.status(),
                format!("Failed to read file data: {}", multipart_err.body_text()),
            );
        }
    }
    err.into()
}

/// DELETE `/api/uploads/{id}` — remove the file and its record.
///
/// A non-numeric id cannot name an upload and is reported as not found.
pub async fn delete_upload(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Path(id) = id.map_err(|rejection| {
        debug!("rejected upload id: {}", rejection);
        AppError::not_found("Upload not found")
    })?;
    state.uploads.delete(id).await?;
    Ok(Json(MessageResponse {
        message: "Upload deleted".into(),
    }))
}

/// GET `/uploads/{*filename}` — stream a stored file.
///
/// Served straight from the media directory; names that would escape it are
/// answered with 404.
pub async fn serve_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let (file, len) = state
        .uploads
        .open_file(&filename)
        .await
        .map_err(|err| match err {
            GalleryError::InvalidFilename => {
                debug!("rejected raw fetch of {:?}", filename);
                AppError::not_found("File not found")
            }
            other => other.into(),
        })?;

    let content_type = mime_guess::from_path(&filename).first_or_octet_stream();
    let mut response = Response::new(Body::from_stream(ReaderStream::new(file)));
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type.as_ref())
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));

    Ok(response)
}
