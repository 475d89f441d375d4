//! Shared test helpers for integration tests.

use std::{path::PathBuf, sync::Arc};

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use media_gallery::{
    config::{AppConfig, Args},
    db,
    routes::routes,
    services::{
        media_store::MediaStore, repository::UploadRepository, upload_service::UploadService,
    },
    state::AppState,
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

pub const BASE_URL: &str = "http://gallery.test";
const BOUNDARY: &str = "gallery-test-boundary";

/// Test application context
pub struct TestApp {
    pub router: Router,
    /// Owns the database file and media directory.
    pub dir: TempDir,
}

/// A file part for a multipart upload.
pub struct FilePart<'a> {
    pub name: &'a str,
    pub content_type: Option<&'a str>,
    pub data: &'a [u8],
}

impl<'a> FilePart<'a> {
    pub fn new(name: &'a str, content_type: Option<&'a str>, data: &'a [u8]) -> Self {
        Self {
            name,
            content_type,
            data,
        }
    }
}

/// Response from a JSON endpoint
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Response from the raw file endpoint
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::build(None).await
    }

    /// Same as `new`, with a smaller request body limit.
    pub async fn with_max_upload_bytes(limit: usize) -> Self {
        Self::build(Some(limit)).await
    }

    async fn build(max_upload_bytes: Option<usize>) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let media_dir = dir.path().join("uploads");
        std::fs::create_dir_all(&media_dir).expect("Failed to create media dir");

        let mut config = AppConfig::resolve(Args::default(), |_| {
            Err(std::env::VarError::NotPresent)
        })
        .expect("Failed to build config");
        config.storage_dir = media_dir.display().to_string();
        config.database_url = format!("sqlite://{}", dir.path().join("gallery.db").display());
        config.public_base_url = Some(BASE_URL.to_string());
        if let Some(limit) = max_upload_bytes {
            config.max_upload_bytes = limit;
        }

        let pool = db::connect(&config.database_url)
            .await
            .expect("Failed to connect to test database");
        let repo = UploadRepository::new(Arc::new(pool));
        repo.initialize().await.expect("Failed to create schema");

        let uploads = UploadService::new(repo, MediaStore::new(&media_dir));
        let router = routes::app(AppState::new(uploads, config));

        Self { router, dir }
    }

    pub fn media_dir(&self) -> PathBuf {
        self.dir.path().join("uploads")
    }

    /// Names currently present in the media directory, sorted.
    pub fn media_entries(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.media_dir())
            .expect("Failed to read media dir")
            .map(|e| {
                e.expect("Failed to read dir entry")
                    .file_name()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        names.sort();
        names
    }

    /// Send a body-less request and parse the JSON response.
    pub async fn request(&self, method: &str, path: &str) -> TestResponse {
        let req = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .expect("Failed to build request");
        self.send_json(req).await
    }

    /// POST a multipart form to `/api/uploads`.
    pub async fn upload(
        &self,
        file: Option<FilePart<'_>>,
        author: Option<&str>,
        description: Option<&str>,
    ) -> TestResponse {
        let body = multipart_body(file, author, description);
        let req = Request::builder()
            .method("POST")
            .uri("/api/uploads")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .expect("Failed to build request");
        self.send_json(req).await
    }

    /// GET a raw file path.
    pub async fn raw(&self, path: &str) -> RawResponse {
        let req = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .expect("Failed to build request");
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body")
            .to_vec();

        RawResponse {
            status,
            content_type,
            bytes,
        }
    }

    async fn send_json(&self, req: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");
        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }
}

fn multipart_body(
    file: Option<FilePart<'_>>,
    author: Option<&str>,
    description: Option<&str>,
) -> Vec<u8> {
    let mut body = Vec::new();

    if let Some(file) = file {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
                file.name
            )
            .as_bytes(),
        );
        if let Some(content_type) = file.content_type {
            body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(file.data);
        body.extend_from_slice(b"\r\n");
    }

    for (name, value) in [("author", author), ("description", description)] {
        if let Some(value) = value {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            );
            body.extend_from_slice(value.as_bytes());
            body.extend_from_slice(b"\r\n");
        }
    }

    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}
