//! A local stand-in for the OpenAI chat completions API.

use std::net::SocketAddr;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::post,
};
use futures::{StreamExt, stream};
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// Builder for the completion service mock.
pub struct OpenAIMock {
    fragments: Vec<String>,
    error: Option<(StatusCode, String)>,
    disconnect_after: Option<usize>,
    error_event_after: Option<usize>,
    delay: Option<Duration>,
    event_interval: Duration,
}

impl Default for OpenAIMock {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenAIMock {
    pub fn new() -> Self {
        Self {
            fragments: vec![
                "A two-bedroom house ".to_string(),
                "with one bathroom, ".to_string(),
                "a garden and a garage.".to_string(),
            ],
            error: None,
            disconnect_after: None,
            error_event_after: None,
            delay: None,
            event_interval: Duration::from_millis(5),
        }
    }

    /// The answer, one element per streamed delta. Whole answers concatenate them.
    pub fn with_fragments(mut self, fragments: &[&str]) -> Self {
        self.fragments = fragments.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_error(mut self, status: StatusCode, message: impl Into<String>) -> Self {
        self.error = Some((status, message.into()));
        self
    }

    pub fn with_auth_error(self, message: impl Into<String>) -> Self {
        self.with_error(StatusCode::UNAUTHORIZED, message)
    }

    pub fn with_rate_limit(self, message: impl Into<String>) -> Self {
        self.with_error(StatusCode::TOO_MANY_REQUESTS, message)
    }

    pub fn with_internal_error(self, message: impl Into<String>) -> Self {
        self.with_error(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Streams this many deltas and then drops the connection.
    pub fn disconnect_after(mut self, fragments: usize) -> Self {
        self.disconnect_after = Some(fragments);
        self
    }

    /// Streams this many deltas, then an `error` event, and ends the stream.
    pub fn error_event_after(mut self, fragments: usize) -> Self {
        self.error_event_after = Some(fragments);
        self
    }

    /// Waits before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Pause between two streamed events.
    pub fn with_event_interval(mut self, interval: Duration) -> Self {
        self.event_interval = interval;
        self
    }

    pub async fn spawn(self) -> anyhow::Result<RunningOpenAIMock> {
        let state = Arc::new(MockState {
            fragments: self.fragments,
            error: self.error,
            disconnect_after: self.disconnect_after,
            error_event_after: self.error_event_after,
            delay: self.delay,
            event_interval: self.event_interval,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/v1/chat/completions", post(chat_completions))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?;

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Ok(RunningOpenAIMock { address, state })
    }
}

/// A spawned mock. Counts and records every chat completion request it receives.
pub struct RunningOpenAIMock {
    address: SocketAddr,
    state: Arc<MockState>,
}

impl RunningOpenAIMock {
    /// The value for `[completion] base_url`.
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.address)
    }

    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

/// One request as the mock saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub authorization: Option<String>,
    pub body: Value,
}

struct MockState {
    fragments: Vec<String>,
    error: Option<(StatusCode, String)>,
    disconnect_after: Option<usize>,
    error_event_after: Option<usize>,
    delay: Option<Duration>,
    event_interval: Duration,
    calls: AtomicUsize,
    requests: Mutex<Vec<RecordedRequest>>,
}

async fn chat_completions(State(state): State<Arc<MockState>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    state.calls.fetch_add(1, Ordering::SeqCst);

    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let streaming = body["stream"].as_bool().unwrap_or(false);
    let model = body["model"].as_str().unwrap_or_default().to_string();

    state
        .requests
        .lock()
        .unwrap()
        .push(RecordedRequest { authorization, body });

    if let Some(delay) = state.delay {
        tokio::time::sleep(delay).await;
    }

    if let Some((status, message)) = &state.error {
        let error = json!({
            "error": {
                "message": message,
                "type": "mock_error",
                "code": status.as_u16(),
            }
        });

        return (*status, Json(error)).into_response();
    }

    if streaming {
        stream_response(&state, &model)
    } else {
        whole_response(&state, &model)
    }
}

fn whole_response(state: &MockState, model: &str) -> Response {
    Json(json!({
        "id": format!("chatcmpl-test-{}", uuid::Uuid::new_v4()),
        "object": "chat.completion",
        "created": 1677651200,
        "model": model,
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": state.fragments.concat(),
            },
            "finish_reason": "stop",
        }],
        "usage": {
            "prompt_tokens": 40,
            "completion_tokens": 15,
            "total_tokens": 55,
        },
    }))
    .into_response()
}

fn stream_response(state: &MockState, model: &str) -> Response {
    let id = format!("chatcmpl-test-{}", uuid::Uuid::new_v4());

    let chunk = |delta: Value, finish_reason: Option<&str>| {
        let chunk = json!({
            "id": id,
            "object": "chat.completion.chunk",
            "created": 1677651200,
            "model": model,
            "choices": [{
                "index": 0,
                "delta": delta,
                "finish_reason": finish_reason,
            }],
        });

        format!("data: {chunk}\n\n")
    };

    let mut events: Vec<Result<String, std::io::Error>> = vec![Ok(chunk(json!({ "role": "assistant" }), None))];

    for (index, fragment) in state.fragments.iter().enumerate() {
        if state.disconnect_after == Some(index) {
            events.push(Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "mock disconnect",
            )));

            return sse(events, state.event_interval);
        }

        if state.error_event_after == Some(index) {
            let error = json!({
                "error": {
                    "message": "The server had an error while processing your request.",
                    "type": "server_error",
                    "code": null,
                }
            });

            events.push(Ok(format!("data: {error}\n\n")));

            return sse(events, state.event_interval);
        }

        events.push(Ok(chunk(json!({ "content": fragment }), None)));
    }

    events.push(Ok(chunk(json!({}), Some("stop"))));
    events.push(Ok("data: [DONE]\n\n".to_string()));

    sse(events, state.event_interval)
}

fn sse(events: Vec<Result<String, std::io::Error>>, interval: Duration) -> Response {
    // Pausing between events makes every event leave the socket before the next one is produced.
    let events = stream::iter(events).then(move |event| async move {
        tokio::time::sleep(interval).await;
        event
    });

    let body = Body::from_stream(events);

    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        body,
    )
        .into_response()
}
