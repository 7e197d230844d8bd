//! Application entry point and server initialization
//!
//! This module contains the main function that:
//! - Loads environment configuration
//! - Installs the log sink for the configured environment
//! - Opens the URL store
//! - Starts the HTTP server with connection timeouts and graceful shutdown

use std::{process, sync::Arc};

use dotenvy::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{debug, error, info};

use url_shortener::{
    config,
    database::UrlStore,
    logger,
    route::create_app,
    server::{self, ConnectionTimeouts},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenv().ok();

    let config = config::load_from_env()?;
    logger::init(config.env)?;

    info!(env = %config.env, "starting url-shortener");
    debug!("debug messages are enabled");

    let store = match UrlStore::open(&config.storage_path) {
        Ok(store) => Arc::new(store),
        Err(err) => {
            error!(error = %err, path = %config.storage_path, "failed to init storage");
            process::exit(1);
        }
    };

    let app = create_app(store, &config.http_server);

    let listener = TcpListener::bind(&config.http_server.address).await?;
    info!(address = %config.http_server.address, "starting server");

    server::serve(
        listener,
        app,
        ConnectionTimeouts::from(&config.http_server),
        shutdown_signal(),
    )
    .await;

    info!("server stopped");
    Ok(())
}

/// Handles graceful shutdown signals
///
/// Returns when SIGINT (Ctrl+C) or, on Unix, SIGTERM is received. In-flight
/// requests are allowed to complete before the server exits.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
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

    info!("shutdown signal received, stopping server");
}
