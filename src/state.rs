//! Shared state handed to every handler.

use crate::{config::AppConfig, services::upload_service::UploadService};
use axum::http::{HeaderMap, header};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub uploads: UploadService,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(uploads: UploadService, config: AppConfig) -> Self {
        Self {
            uploads,
            config: Arc::new(config),
        }
    }

    /// Origin used for `previewUrl`.
    ///
    /// The configured base URL wins; otherwise `X-Forwarded-Proto` and `Host`.
    pub fn base_url_for(&self, headers: &HeaderMap) -> String {
        request_base_url(self.config.public_base_url.as_deref(), headers)
    }
}

pub fn request_base_url(configured: Option<&str>, headers: &HeaderMap) -> String {
    if let Some(url) = configured {
        return url.trim_end_matches('/').to_string();
    }

    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| matches!(*v, "http" | "https"))
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or("localhost");

    format!("{}://{}", scheme, host)
}
