pub(crate) mod openai;

#[cfg(test)]
pub(crate) mod mock;

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::messages::CompletionRequest;

/// Type alias for a stream of generated text fragments.
///
/// Fragments arrive in generation order and concatenate to the full listing. The stream is
/// finite, cannot be restarted, and dropping it cancels the underlying upstream request.
pub(crate) type FragmentStream = Pin<Box<dyn Stream<Item = crate::Result<String>> + Send>>;

/// Trait for completion service implementations.
///
/// Note for async_trait: We need this trait to be dyn-compatible, so we can't just use the
/// Rust async trait functions without Box/Pin.
#[async_trait]
pub(crate) trait Provider: Send + Sync {
    /// Request a completion and wait for the whole answer.
    async fn complete(&self, request: CompletionRequest) -> crate::Result<String>;

    /// Request a completion delivered as incremental fragments.
    ///
    /// Errors returned from this call mean nothing was received. Errors yielded by the stream
    /// happen after the upstream accepted the request.
    async fn complete_stream(&self, request: CompletionRequest) -> crate::Result<FragmentStream>;

    /// Get the provider name.
    fn name(&self) -> &str;
}
