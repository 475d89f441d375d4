pub mod error;
pub mod media_store;
pub mod repository;
pub mod upload_service;
