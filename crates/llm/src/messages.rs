use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Inbound body of the listing generation endpoint.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ListingRequest {
    pub(crate) property_type: String,
    pub(crate) bedrooms: u32,
    pub(crate) bathrooms: u32,
    pub(crate) features: String,
    /// Sampling temperature, clamped before use. Absent means the default. Read as `f64` so that
    /// numbers beyond the `f32` range still clamp instead of turning into infinity.
    #[serde(default)]
    pub(crate) temperature: Option<f64>,
}

impl ListingRequest {
    /// Checks the rules the type system does not already enforce.
    pub(crate) fn validate(&self) -> crate::Result<()> {
        if self.property_type.trim().is_empty() {
            return Err(LlmError::InvalidRequest("property_type must not be empty".to_string()));
        }

        Ok(())
    }
}

/// Whole-body response of the listing generation endpoint.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ListingResponse {
    pub(crate) listing: String,
}

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ChatRole {
    System,
    User,
}

/// Chat message in OpenAI format.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ChatMessage {
    pub(crate) role: ChatRole,
    pub(crate) content: String,
}

/// A single request to the completion service.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CompletionRequest {
    pub(crate) model: String,
    pub(crate) messages: Vec<ChatMessage>,
    pub(crate) temperature: f32,
}
