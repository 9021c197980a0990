//! In-process completion backend for unit tests.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;

use crate::{
    error::CompletionServiceError,
    messages::CompletionRequest,
    provider::{FragmentStream, Provider},
};

/// One scripted item of a streamed answer.
#[derive(Debug, Clone)]
pub(crate) enum MockItem {
    Fragment(&'static str),
    /// The connection drops at this point of the stream.
    Disconnect,
}

#[derive(Debug, Clone)]
enum Behavior {
    Answer(Vec<MockItem>),
    Status(u16),
}

/// Records every request and answers from a script.
#[derive(Clone)]
pub(crate) struct MockProvider {
    behavior: Behavior,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockProvider {
    pub fn fragments(fragments: &[&'static str]) -> Self {
        Self::script(fragments.iter().copied().map(MockItem::Fragment).collect())
    }

    pub fn script(items: Vec<MockItem>) -> Self {
        Self {
            behavior: Behavior::Answer(items),
            calls: Arc::default(),
            requests: Arc::default(),
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            behavior: Behavior::Status(status),
            calls: Arc::default(),
            requests: Arc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, request: CompletionRequest) -> crate::Result<Vec<MockItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);

        match &self.behavior {
            Behavior::Answer(items) => Ok(items.clone()),
            Behavior::Status(status) => Err(CompletionServiceError::from_status(*status, "mock failure").into()),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, request: CompletionRequest) -> crate::Result<String> {
        let mut listing = String::new();

        for item in self.record(request)? {
            match item {
                MockItem::Fragment(fragment) => listing.push_str(fragment),
                MockItem::Disconnect => {
                    return Err(CompletionServiceError::ConnectionError("connection reset".to_string()).into());
                }
            }
        }

        Ok(listing)
    }

    async fn complete_stream(&self, request: CompletionRequest) -> crate::Result<FragmentStream> {
        let items = self
            .record(request)?
            .into_iter()
            .map(|item| -> crate::Result<String> {
                match item {
                    MockItem::Fragment(fragment) => Ok(fragment.to_string()),
                    MockItem::Disconnect => {
                        Err(CompletionServiceError::ConnectionError("connection reset".to_string()).into())
                    }
                }
            });

        Ok(Box::pin(futures::stream::iter(items)))
    }

    fn name(&self) -> &str {
        "mock"
    }
}
