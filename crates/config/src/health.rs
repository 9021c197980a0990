//! Liveness endpoint configuration.

use std::borrow::Cow;

use serde::Deserialize;

/// Liveness endpoint configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HealthConfig {
    /// Whether the liveness endpoint is enabled.
    pub enabled: bool,
    /// The path for the liveness endpoint.
    pub path: Cow<'static, str>,
}

impl Default for HealthConfig {
    fn default() -> Self {
        HealthConfig {
            enabled: true,
            path: Cow::Borrowed("/"),
        }
    }
}
