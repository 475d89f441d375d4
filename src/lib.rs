//! Media gallery backend: multipart uploads with metadata in SQLite and
//! payloads in a local directory.

pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
