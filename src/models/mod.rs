//! Core data models for the media gallery.
//!
//! `UploadRecord` maps to the `uploads` table via `sqlx::FromRow`;
//! `UploadView` is the JSON shape served to clients.

pub mod upload;
