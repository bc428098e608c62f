use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bytebooks_core::{
    create_source, create_verifier, load_config, validate_config, Assistant, AuthStore,
    CartStore, CatalogClient, HomeFeed, KeyValueStore, SqliteStore,
};
use bytebooks_server::api::create_router;
use bytebooks_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("BYTEBOOKS_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);

    // Durable local store (response cache, cart, session, homepage snapshot)
    let store: Arc<dyn KeyValueStore> = Arc::new(
        SqliteStore::new(&config.database.path).context("Failed to open local store")?,
    );
    info!("Local store initialized");

    // Catalog
    let source = create_source(&config.catalog).context("Failed to create catalog source")?;
    let catalog = Arc::new(CatalogClient::from_config(
        &config.catalog,
        source,
        Arc::clone(&store),
    ));
    if catalog.uses_mock_data() {
        info!("Catalog answering from mock data only");
    } else {
        info!("Using catalog source: {}", catalog.source_name());
    }

    let home = HomeFeed::new(Arc::clone(&catalog), Arc::clone(&store));
    let cart = CartStore::new(Arc::clone(&store));

    let verifier = create_verifier(&config.auth);
    info!("Using credential verifier: {}", verifier.method_name());
    let auth = AuthStore::new(verifier, Arc::clone(&store));

    let assistant = Assistant::from_config(&config.assistant);
    if assistant.is_configured() {
        info!("AI assistant using model {}", config.assistant.model);
    } else {
        info!("AI assistant has no API key, answering with canned replies");
    }

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, catalog, home, cart, auth, assistant));
    let app = create_router(state);

    // Start server
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
