//! Prompt construction for listing generation.

use crate::messages::{ChatMessage, ChatRole, ListingRequest};

/// Fixed instruction that keeps the generated copy factual.
pub(crate) const SYSTEM_INSTRUCTION: &str = "You are an assistant that writes real estate listings. \
     Keep the writing factual, neutral, and descriptive. \
     Avoid creative or exaggerated language, and do not invent details.";

/// Temperature used when the caller does not send one.
pub(crate) const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Lowest temperature forwarded to the completion service.
pub(crate) const MIN_TEMPERATURE: f64 = 0.0;

/// Highest temperature forwarded to the completion service.
pub(crate) const MAX_TEMPERATURE: f64 = 0.5;

/// Builds the system and user messages for a listing request.
pub(crate) fn build_prompt(request: &ListingRequest) -> Vec<ChatMessage> {
    vec![
        ChatMessage {
            role: ChatRole::System,
            content: SYSTEM_INSTRUCTION.to_string(),
        },
        ChatMessage {
            role: ChatRole::User,
            content: user_instruction(request),
        },
    ]
}

fn user_instruction(request: &ListingRequest) -> String {
    let ListingRequest {
        property_type,
        bedrooms,
        bathrooms,
        features,
        ..
    } = request;

    format!(
        "Write a factual and descriptive real estate listing for a \
         {bedrooms}-bedroom, {bathrooms}-bathroom {property_type}. \
         Focus only on accurate details. Avoid exaggerations or assumptions. \
         List features factually: {features}."
    )
}

/// Resolves the temperature sent upstream: the default when absent, otherwise clamped.
pub(crate) fn clamp_temperature(temperature: Option<f64>) -> f32 {
    match temperature {
        Some(temperature) => temperature.clamp(MIN_TEMPERATURE, MAX_TEMPERATURE) as f32,
        None => DEFAULT_TEMPERATURE,
    }
}
