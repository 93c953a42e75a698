use std::sync::Arc;

use anyhow::Context;
use songs_api::{
    app, cors_layer,
    db::{COLLECTION, Database, MemoryStore, SongStore},
    secrets::SecretManager,
};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

const MEMORY_URL_PREFIX: &str = "memory://";

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => error!("Failed to listen for SIGTERM: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

async fn run() -> anyhow::Result<()> {
    let secrets = SecretManager::from_env().context("Invalid configuration")?;
    info!("Starting in {:?} mode", secrets.mode);

    let mut database = None;
    let store: Arc<dyn SongStore> = if secrets.database_url.starts_with(MEMORY_URL_PREFIX) {
        warn!("Using in-memory song store, data will not be persisted");
        Arc::new(MemoryStore::new())
    } else {
        let db = Database::connect(&secrets.database_url, secrets.max_connections)
            .await
            .context("Failed to connect to database")?;
        info!("📊 Connected to PostgreSQL database");

        db.migrate().await.context("Failed to run database migrations")?;
        info!("📊 Database migrations completed, collection {:?} ready", COLLECTION);

        database = Some(db.clone());
        Arc::new(db)
    };

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", secrets.port))
        .await
        .with_context(|| format!("Failed to bind 0.0.0.0:{}", secrets.port))?;

    let app = app(store, cors_layer(&secrets.cors_origins));

    info!("🎵 Server running on port {}", secrets.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(db) = database {
        db.close().await;
        info!("📊 Database connection closed");
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    // A missing .env file is fine; real deployments use the process environment.
    let _ = dotenvy::dotenv();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    if let Err(e) = run().await {
        error!("❌ {:#}", e);
        std::process::exit(1);
    }
}
