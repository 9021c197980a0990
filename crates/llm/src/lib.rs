use axum::{
    Router,
    extract::{Json, State, rejection::JsonRejection},
    response::{IntoResponse, Response},
    routing::post,
};
use config::{Config, DeliveryMode};

mod delivery;
mod error;
mod messages;
mod prompt;
mod provider;
mod server;

use error::LlmError;
use messages::ListingRequest;
use server::ListingServer;

pub(crate) type Result<T> = std::result::Result<T, LlmError>;

/// Process-wide handle to the completion relay.
///
/// Created once at startup. Holds the API credential and the upstream connection pool.
pub struct ListingService {
    server: ListingServer,
    delivery: DeliveryMode,
    path: String,
}

#[derive(Clone)]
struct ListingState {
    server: ListingServer,
    delivery: DeliveryMode,
}

impl ListingService {
    /// Build the relay from configuration. Fails if the completion credential is missing.
    pub fn init(config: &Config) -> anyhow::Result<Self> {
        let server = ListingServer::new(&config.completion)
            .map_err(|e| anyhow::anyhow!("Failed to initialize the completion relay: {e}"))?;

        Ok(Self::from_parts(server, config))
    }

    fn from_parts(server: ListingServer, config: &Config) -> Self {
        Self {
            server,
            delivery: config.server.delivery,
            path: config.listing.path.to_string(),
        }
    }

    /// The path the generation endpoint is mounted on.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Creates an axum router for the listing endpoint.
    pub fn router(&self) -> Router {
        let state = ListingState {
            server: self.server.clone(),
            delivery: self.delivery,
        };

        Router::new()
            .route(&self.path, post(generate_listing))
            .with_state(state)
    }

    /// Release the relay. The upstream connection pool closes once every router built from
    /// this handle has been dropped as well.
    pub fn shutdown(self) {
        log::debug!("Shutting down the completion relay");
        drop(self.server);
    }
}

/// Handle listing generation requests.
///
/// Depending on the configured delivery mode the listing is either streamed as `text/plain`
/// chunks or returned as `{"listing": "..."}` once complete.
async fn generate_listing(
    State(state): State<ListingState>,
    payload: std::result::Result<Json<ListingRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(request) = payload.map_err(|rejection| {
        log::debug!("Rejected listing request: {rejection}");
        LlmError::InvalidRequest(rejection.body_text())
    })?;

    request.validate()?;

    log::info!(
        "Listing generation requested for a {}-bedroom, {}-bathroom {}",
        request.bedrooms,
        request.bathrooms,
        request.property_type
    );

    match state.delivery {
        DeliveryMode::Stream => {
            let fragments = state.server.generate_stream(request).await?;
            delivery::incremental(fragments).await
        }
        DeliveryMode::Whole => {
            let listing = state.server.generate(request).await?;
            log::debug!("Listing generated, returning {} bytes", listing.len());

            Ok(delivery::whole(listing).into_response())
        }
    }
}
