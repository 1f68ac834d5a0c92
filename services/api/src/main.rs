use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use common::{
    database::{DatabaseConfig, health_check, init_pool},
    store::{DocumentStore, InMemoryDocumentStore, PgDocumentStore},
};
use passport_api::{
    config::{ServerConfig, StoreBackend},
    routes,
    state::AppState,
};
use tokio::net::TcpListener;

/// Open the configured record store backend
async fn open_store(backend: StoreBackend) -> Result<Arc<dyn DocumentStore>> {
    match backend {
        StoreBackend::Postgres => {
            let db_config = DatabaseConfig::from_env()?;
            let pool = init_pool(&db_config).await?;

            // Check database connectivity
            if health_check(&pool).await? {
                info!("Database connection successful");
            } else {
                anyhow::bail!("Failed to connect to database");
            }

            let store = PgDocumentStore::new(pool);
            store.migrate().await?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            info!("Using in-memory record store; data is lost on shutdown");
            Ok(Arc::new(InMemoryDocumentStore::new()))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting passport API service");

    let config = ServerConfig::from_env()?;
    let store = open_store(config.store_backend).await?;

    let app_state = AppState::new(store, config.request_timeout());
    app_state
        .user_repository
        .ensure_indexes(&app_state.scope())
        .await?;

    info!("Passport API service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let address = config.address();
    let listener = TcpListener::bind(&address).await?;
    info!("Passport API service listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
