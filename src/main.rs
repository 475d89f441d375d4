use anyhow::Result;
use media_gallery::{
    config::AppConfig,
    db,
    routes::routes,
    services::{
        media_store::MediaStore, repository::UploadRepository, upload_service::UploadService,
    },
    state::AppState,
};
use std::{fs, io::ErrorKind, path::Path, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config + migrate flag ---
    let (cfg, migrate) = AppConfig::from_env_and_args()?;

    tracing::info!("Starting media-gallery with config: {:?}", cfg);

    // --- Ensure media directory exists ---
    if !Path::new(&cfg.storage_dir).exists() {
        fs::create_dir_all(&cfg.storage_dir)?;
        tracing::info!("Created storage directory at {}", cfg.storage_dir);
    }

    // --- Initialize SQLite connection ---
    tracing::debug!("Connecting using raw URL => {}", cfg.database_url);
    let pool = Arc::new(db::connect(&cfg.database_url).await?);

    // --- Schema bootstrap (idempotent), before any traffic ---
    let repo = UploadRepository::new(pool);
    repo.initialize().await?;
    tracing::info!("Database schema ready.");
    if migrate {
        return Ok(()); // exit after migration
    }

    // --- Initialize core service ---
    let uploads = UploadService::new(repo, MediaStore::new(&cfg.storage_dir));
    let state = AppState::new(uploads, cfg.clone());

    // --- Build router ---
    let app = routes::app(state);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
