use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use depot::{
    Authenticator, Config, Database, DiskByteStore, FileTreeManager, JobDispatcher, JobWorker,
    MemoryTokenStore, SqliteTokenStore, TokenBackend, TokenStore, WebServer,
};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load_with_env("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = depot::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        depot::logging::init_console_only(&config.logging.level);
    }

    info!("Depot - file metadata and storage service");

    if let Err(e) = run(config).await {
        error!(error = %e, "Depot exited with an error");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> depot::Result<()> {
    config.validate()?;

    let db = Database::open(&config.database.path).await?;

    let tokens: Arc<dyn TokenStore> = match config.tokens.backend {
        TokenBackend::Memory => Arc::new(MemoryTokenStore::new()),
        TokenBackend::Database => Arc::new(SqliteTokenStore::new(db.pool().clone())),
    };
    info!(backend = tokens.backend_name(), "Token store ready");

    let authenticator = Authenticator::with_ttl(
        db.clone(),
        tokens,
        Duration::from_secs(config.tokens.ttl_secs),
    );

    let bytes = Arc::new(DiskByteStore::new(&config.files.storage_path)?);
    info!("File storage initialized at: {}", config.files.storage_path);

    let widths = config.jobs.thumbnail_widths.clone();
    let (dispatcher, jobs) = JobDispatcher::new();
    let worker = JobWorker::new(db.clone(), bytes.clone()).with_widths(widths.clone());

    if config.jobs.backfill_on_start {
        if let Err(e) = worker.backfill(&dispatcher).await {
            warn!(error = %e, "Thumbnail backfill failed");
        }
    }
    let worker = worker.spawn(jobs);

    let files =
        FileTreeManager::new(db.clone(), bytes, dispatcher).with_thumbnail_widths(widths);
    let state = depot::AppState::new(db.clone(), authenticator, files);

    let server = WebServer::new(&config.server, state)?;
    server.run(shutdown_signal()).await?;

    // The server owned the last dispatcher; the worker drains and stops.
    match worker.await {
        Ok(stats) => info!(
            completed = stats.completed,
            failed = stats.failed,
            "Job worker finished"
        ),
        Err(e) => warn!(error = %e, "Job worker panicked"),
    }

    db.close().await;
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!(error = %e, "Failed to listen for shutdown signal"),
    }
}
