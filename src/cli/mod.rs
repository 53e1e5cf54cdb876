use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config::{self, StorageBackend};
use crate::database::{DatabaseManager, MemoryStore, PgStore, Store};
use crate::AppState;

#[derive(Parser)]
#[command(name = "folio-api")]
#[command(about = "Folio API - user accounts and investment portfolios")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Port to listen on (overrides FOLIO_API_PORT)")]
        port: Option<u16>,

        #[arg(long, value_enum, help = "Storage backend (overrides FOLIO_STORAGE)")]
        storage: Option<StorageBackend>,
    },

    #[command(about = "Create or update the PostgreSQL schema")]
    Migrate,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve {
        port: None,
        storage: None,
    }) {
        Commands::Serve { port, storage } => serve(port, storage).await,
        Commands::Migrate => migrate().await,
    }
}

async fn open_store(backend: StorageBackend) -> anyhow::Result<Arc<dyn Store>> {
    match backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Postgres => {
            let pool = DatabaseManager::connect(&config::config().database)
                .await
                .context("failed to connect to PostgreSQL")?;
            DatabaseManager::migrate(&pool)
                .await
                .context("failed to apply schema")?;
            Ok(Arc::new(PgStore::new(pool)))
        }
    }
}

async fn serve(port: Option<u16>, storage: Option<StorageBackend>) -> anyhow::Result<()> {
    let config = config::config();
    let port = port.unwrap_or(config.server.port);
    let backend = storage.unwrap_or(config.server.storage);

    let store = open_store(backend).await?;
    let app = crate::app(AppState::new(store));

    let bind_addr = format!("{}:{}", config.server.host, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Folio API listening on http://{} ({:?} storage)", bind_addr, backend);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn migrate() -> anyhow::Result<()> {
    let pool = DatabaseManager::connect(&config::config().database).await?;
    DatabaseManager::migrate(&pool).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
