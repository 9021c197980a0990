use std::borrow::Cow;

use serde::Deserialize;

/// Response body of a non-streaming chat completion.
///
/// Only the fields the relay reads are modelled; everything else is ignored.
#[derive(Debug, Deserialize)]
pub(super) struct OpenAIResponse {
    pub choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
pub(super) struct OpenAIChoice {
    pub message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
pub(super) struct OpenAIMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl OpenAIResponse {
    /// Text of the first choice, if the provider produced any.
    pub(super) fn into_content(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
    }
}

/// One `data:` event of a streaming chat completion.
///
/// Uses Cow so that fragments without escape sequences borrow from the event buffer.
#[derive(Debug, Deserialize)]
pub(super) struct OpenAIStreamChunk<'a> {
    #[serde(borrow, default)]
    pub choices: Vec<OpenAIStreamChoice<'a>>,
    /// Set when the provider aborts the generation after the stream has started.
    #[serde(borrow, default)]
    pub error: Option<OpenAIStreamError<'a>>,
}

#[derive(Debug, Deserialize)]
pub(super) struct OpenAIStreamError<'a> {
    #[serde(borrow, default)]
    pub message: Option<Cow<'a, str>>,
}

#[derive(Debug, Deserialize)]
pub(super) struct OpenAIStreamChoice<'a> {
    #[serde(borrow, default)]
    pub delta: OpenAIDelta<'a>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct OpenAIDelta<'a> {
    #[serde(borrow, default)]
    pub content: Option<Cow<'a, str>>,
}

impl OpenAIStreamChunk<'_> {
    /// The text carried by this chunk. Role announcements, usage-only chunks and the final
    /// finish-reason chunk carry none.
    pub(super) fn into_fragment(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .filter(|content| !content.is_empty())
            .map(Cow::into_owned)
    }
}
