use serde::Serialize;

use crate::messages::{ChatMessage, CompletionRequest};

/// Request body for OpenAI Chat Completions API.
///
/// This struct represents the request format for the `/v1/chat/completions` endpoint
/// as documented in the [OpenAI API Reference](https://platform.openai.com/docs/api-reference/chat/create).
#[derive(Debug, Serialize)]
pub(super) struct OpenAIRequest {
    /// ID of the model to use.
    pub(super) model: String,

    /// The system instruction followed by the user instruction.
    pub(super) messages: Vec<ChatMessage>,

    /// What sampling temperature to use. Already clamped by the relay.
    pub(super) temperature: f32,

    /// If set, partial message deltas will be sent as data-only server-sent events,
    /// with the stream terminated by a `data: [DONE]` message.
    pub(super) stream: bool,
}

impl OpenAIRequest {
    pub(super) fn new(request: CompletionRequest, stream: bool) -> Self {
        let CompletionRequest {
            model,
            messages,
            temperature,
        } = request;

        Self {
            model,
            messages,
            temperature,
            stream,
        }
    }
}
