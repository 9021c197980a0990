use std::sync::Arc;

use config::CompletionConfig;
use futures::{StreamExt, future};

use crate::{
    error::CompletionServiceError,
    messages::{CompletionRequest, ListingRequest},
    prompt,
    provider::{FragmentStream, Provider, openai::OpenAIProvider},
};

/// The completion relay: turns listing requests into exactly one completion service call each.
#[derive(Clone)]
pub(crate) struct ListingServer {
    shared: Arc<ListingServerInner>,
}

struct ListingServerInner {
    provider: Box<dyn Provider>,
    model: String,
}

impl ListingServer {
    pub fn new(config: &CompletionConfig) -> anyhow::Result<Self> {
        let provider = OpenAIProvider::new("openai".to_string(), config)?;
        log::debug!("Completion relay initialized with model '{}'", config.model);

        Ok(Self::with_provider(Box::new(provider), config.model.clone()))
    }

    pub(crate) fn with_provider(provider: Box<dyn Provider>, model: String) -> Self {
        Self {
            shared: Arc::new(ListingServerInner { provider, model }),
        }
    }

    fn completion_request(&self, request: &ListingRequest) -> CompletionRequest {
        let temperature = prompt::clamp_temperature(request.temperature);

        if let Some(requested) = request.temperature
            && !(prompt::MIN_TEMPERATURE..=prompt::MAX_TEMPERATURE).contains(&requested)
        {
            log::debug!("Clamped requested temperature {requested} to {temperature}");
        }

        CompletionRequest {
            model: self.shared.model.clone(),
            messages: prompt::build_prompt(request),
            temperature,
        }
    }

    /// Generate a listing and wait for the complete text.
    pub async fn generate(&self, request: ListingRequest) -> crate::Result<String> {
        let completion = self.completion_request(&request);

        log::debug!(
            "Requesting whole completion from provider '{}'",
            self.shared.provider.name()
        );

        let listing = self.shared.provider.complete(completion).await?;

        if listing.trim().is_empty() {
            return Err(CompletionServiceError::EmptyCompletion.into());
        }

        Ok(listing)
    }

    /// Generate a listing as a stream of fragments.
    ///
    /// The returned stream ends after the first error it yields.
    pub async fn generate_stream(&self, request: ListingRequest) -> crate::Result<FragmentStream> {
        let completion = self.completion_request(&request);

        log::debug!(
            "Requesting streaming completion from provider '{}'",
            self.shared.provider.name()
        );

        let stream = self.shared.provider.complete_stream(completion).await?;

        let mut failed = false;
        let fused = stream.take_while(move |fragment| {
            let keep = !failed;
            failed |= fragment.is_err();
            future::ready(keep)
        });

        Ok(Box::pin(fused))
    }
}
