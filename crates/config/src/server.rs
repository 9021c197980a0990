//! HTTP server configuration settings.

use std::net::SocketAddr;

use serde::Deserialize;

use crate::HealthConfig;

/// HTTP server configuration settings.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// The socket address the server should listen on.
    pub listen_address: Option<SocketAddr>,
    /// How generated listings are delivered to the caller.
    #[serde(default)]
    pub delivery: DeliveryMode,
    /// Liveness endpoint configuration.
    #[serde(default)]
    pub health: HealthConfig,
}

/// Response delivery mode for the listing endpoint.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Relay each fragment as a chunk of a `text/plain` body as soon as it arrives.
    #[default]
    Stream,
    /// Wait for the whole completion and answer with `{"listing": "..."}`.
    Whole,
}
