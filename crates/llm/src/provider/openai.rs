mod input;
mod output;

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use config::CompletionConfig;
use eventsource_stream::{EventStreamError, Eventsource};
use futures::{StreamExt, future};
use reqwest::{Client, header::AUTHORIZATION};
use secrecy::{ExposeSecret, SecretString};

use self::{
    input::OpenAIRequest,
    output::{OpenAIResponse, OpenAIStreamChunk},
};

use crate::{
    error::CompletionServiceError,
    messages::CompletionRequest,
    provider::{FragmentStream, Provider},
};

const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// End-of-stream marker sent as the last `data:` event.
const DONE_MARKER: &str = "[DONE]";

pub(crate) struct OpenAIProvider {
    client: Client,
    base_url: String,
    api_key: SecretString,
    name: String,
}

impl OpenAIProvider {
    pub fn new(name: String, config: &CompletionConfig) -> anyhow::Result<Self> {
        let Some(api_key) = config.api_key.clone() else {
            bail!("No API key configured for the completion service. Set OPENAI_API_KEY or [completion] api_key.");
        };

        if api_key.expose_secret().trim().is_empty() {
            bail!("The completion service API key is empty");
        }

        // Bounds connecting and every single read, not the whole response.
        let client = Client::builder()
            .connect_timeout(config.timeout)
            .read_timeout(config.timeout)
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {e}"))?;

        // Use custom base URL if provided, otherwise use default
        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_OPENAI_API_URL)
            .trim_end_matches('/')
            .to_string();

        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            bail!("The completion base URL must be an http(s) URL, got '{base_url}'");
        }

        Ok(Self {
            client,
            base_url,
            api_key,
            name,
        })
    }

    async fn send(&self, request: CompletionRequest, stream: bool) -> crate::Result<reqwest::Response> {
        let url = format!("{}/chat/completions", self.base_url);
        let openai_request = OpenAIRequest::new(request, stream);

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key.expose_secret()))
            .json(&openai_request)
            .send()
            .await
            .map_err(|e| {
                log::error!("Failed to send request to OpenAI: {e}");
                CompletionServiceError::from_transport(e)
            })?;

        let status = response.status();

        // Check for HTTP errors before attempting to read the body
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(CompletionServiceError::from_status(status.as_u16(), &error_text).into());
        }

        Ok(response)
    }
}

#[async_trait]
impl Provider for OpenAIProvider {
    async fn complete(&self, request: CompletionRequest) -> crate::Result<String> {
        let response = self.send(request, false).await?;

        // First get the response as text to log if parsing fails
        let response_text = response.text().await.map_err(|e| {
            log::error!("Failed to read OpenAI response body: {e}");
            CompletionServiceError::from_transport(e)
        })?;

        let openai_response: OpenAIResponse = sonic_rs::from_str(&response_text).map_err(|e| {
            log::error!("Failed to parse OpenAI chat completion response: {e}");
            log::debug!("Raw response that failed to parse: {response_text}");
            CompletionServiceError::InvalidResponse("malformed chat completion".to_string())
        })?;

        let content = openai_response
            .into_content()
            .ok_or(CompletionServiceError::EmptyCompletion)?;

        Ok(content)
    }

    async fn complete_stream(&self, request: CompletionRequest) -> crate::Result<FragmentStream> {
        let response = self.send(request, true).await?;

        // Convert response bytes stream to SSE event stream
        let event_stream = response
            .bytes_stream()
            .eventsource()
            .take_while(|event| future::ready(!matches!(event, Ok(event) if event.data == DONE_MARKER)));

        let fragments = event_stream.filter_map(|event| async move {
            let event = match event {
                Ok(event) => event,
                Err(EventStreamError::Transport(e)) => {
                    log::error!("OpenAI stream interrupted: {e}");
                    return Some(Err(CompletionServiceError::from_transport(e).into()));
                }
                Err(e) => {
                    log::error!("SSE parsing error in OpenAI stream: {e}");
                    return Some(Err(CompletionServiceError::InvalidResponse("malformed event stream".to_string()).into()));
                }
            };

            match sonic_rs::from_str::<OpenAIStreamChunk<'_>>(&event.data) {
                Ok(OpenAIStreamChunk { error: Some(error), .. }) => {
                    log::error!(
                        "OpenAI stream reported an error: {}",
                        error.message.as_deref().unwrap_or("no message")
                    );

                    Some(Err(CompletionServiceError::InvalidResponse("error event in stream".to_string()).into()))
                }
                Ok(chunk) => chunk.into_fragment().map(Ok),
                Err(e) => {
                    log::error!("Failed to parse OpenAI streaming chunk: {e}");
                    log::debug!("Raw chunk that failed to parse: {}", event.data);
                    Some(Err(CompletionServiceError::InvalidResponse("malformed stream chunk".to_string()).into()))
                }
            }
        });

        Ok(Box::pin(fragments))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
