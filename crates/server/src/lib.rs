//! Listing Writer server library.
//!
//! Provides a reusable server function to serve the listing writer either for the binary, or for the integration tests.

#![deny(missing_docs)]

mod health;

use std::net::SocketAddr;

use anyhow::anyhow;
use axum::{Router, routing::get};
use config::Config;
use llm::ListingService;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Configuration for serving the listing writer.
pub struct ServeConfig {
    /// The socket address (IP and port) the server will bind to
    pub listen_address: SocketAddr,
    /// The deserialized listing-writer TOML configuration.
    pub config: Config,
    /// Cancelling this token starts a graceful shutdown.
    pub shutdown_signal: CancellationToken,
}

/// Starts and runs the listing writer with the provided configuration.
///
/// The completion relay is initialized before the listener is bound, so a missing credential
/// stops startup before any traffic is accepted.
pub async fn serve(
    ServeConfig {
        listen_address,
        config,
        shutdown_signal,
    }: ServeConfig,
) -> anyhow::Result<()> {
    config.validate()?;

    let listing = ListingService::init(&config)?;
    let mut app = Router::new().merge(listing.router());

    if config.server.health.enabled {
        let health_router = Router::new().route(&config.server.health.path, get(health::liveness));
        app = app.merge(health_router);
    } else {
        log::debug!("Health endpoint disabled");
    }

    let listener = TcpListener::bind(listen_address)
        .await
        .map_err(|e| anyhow!("Failed to bind to {listen_address}: {e}"))?;

    let local_address = listener.local_addr()?;

    log::info!(
        "Listing endpoint available at: http://{local_address}{} ({:?} delivery)",
        listing.path(),
        config.server.delivery
    );

    if config.server.health.enabled {
        log::info!("Health endpoint available at: http://{local_address}{}", config.server.health.path);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal.cancelled_owned())
        .await
        .map_err(|e| anyhow!("Failed to start HTTP server: {e}"))?;

    log::info!("Server stopped");
    listing.shutdown();

    Ok(())
}
