//! Listing Writer configuration structures to map the listing-writer.toml configuration.

#![deny(missing_docs)]

mod completion;
mod health;
mod listing;
mod loader;
mod server;

use std::path::Path;

pub use completion::CompletionConfig;
pub use health::HealthConfig;
pub use listing::ListingConfig;
pub use server::{DeliveryMode, ServerConfig};

use serde::Deserialize;

/// Main configuration structure for the Listing Writer service.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// HTTP server configuration settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Listing generation endpoint settings.
    #[serde(default)]
    pub listing: ListingConfig,
    /// Completion service (OpenAI-compatible API) settings.
    #[serde(default)]
    pub completion: CompletionConfig,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
        loader::load(path)
    }

    /// Validates that the configured routes can be mounted together.
    pub fn validate(&self) -> anyhow::Result<()> {
        loader::validate_routes(self)
    }
}
