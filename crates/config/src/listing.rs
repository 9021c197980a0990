use std::borrow::Cow;

use serde::Deserialize;

/// Listing generation endpoint configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListingConfig {
    /// The path where the generation endpoint is mounted.
    pub path: Cow<'static, str>,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            path: Cow::Borrowed("/generate-listing"),
        }
    }
}
