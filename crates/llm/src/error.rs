use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Listing relay errors with appropriate HTTP status codes.
#[derive(Debug, Error)]
pub(crate) enum LlmError {
    /// The inbound request was malformed or failed validation.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The completion service call failed.
    #[error(transparent)]
    CompletionService(#[from] CompletionServiceError),
}

/// Failures of the external completion service.
///
/// Upstream response bodies are logged where the error is created and never carried into the
/// message shown to callers.
#[derive(Debug, Error)]
pub(crate) enum CompletionServiceError {
    /// The provider rejected the API key.
    #[error("Completion service rejected the configured credentials")]
    AuthenticationFailed,

    /// The account behind the API key has no quota left.
    #[error("Completion service quota exhausted")]
    InsufficientQuota,

    /// The provider is rate limiting us.
    #[error("Completion service rate limit exceeded")]
    RateLimited,

    /// Any other non-success status from the provider.
    #[error("Completion service returned an error ({status})")]
    ProviderApiError { status: u16 },

    /// Network or connection error.
    #[error("Failed to reach the completion service: {0}")]
    ConnectionError(String),

    /// The request did not finish within the configured timeout.
    #[error("Completion service timed out")]
    Timeout,

    /// The provider answered with a body we could not interpret.
    #[error("Completion service returned an unexpected response: {0}")]
    InvalidResponse(String),

    /// The provider answered successfully but without any text.
    #[error("Completion service returned no content")]
    EmptyCompletion,
}

impl CompletionServiceError {
    /// Classify a transport-level `reqwest` failure.
    pub(crate) fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::ConnectionError(error.without_url().to_string())
        }
    }

    /// Classify a non-success upstream status. The body is only logged.
    pub(crate) fn from_status(status: u16, body: &str) -> Self {
        log::error!("Completion service error ({status}): {body}");

        match status {
            401 => Self::AuthenticationFailed,
            403 => Self::InsufficientQuota,
            429 => Self::RateLimited,
            _ => Self::ProviderApiError { status },
        }
    }
}

impl LlmError {
    /// Get the appropriate HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::CompletionService(CompletionServiceError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
            Self::CompletionService(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Get the error type string for the response.
    pub fn error_type(&self) -> &str {
        match self {
            Self::InvalidRequest(_) => "invalid_request_error",
            Self::CompletionService(CompletionServiceError::Timeout) => "timeout_error",
            Self::CompletionService(_) => "api_error",
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorDetails,
}

#[derive(Debug, Serialize)]
struct ErrorDetails {
    message: String,
    r#type: String,
    code: u16,
}

impl IntoResponse for LlmError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            log::error!("Server error ({}): {}", status.as_u16(), self);
        }

        let error_response = ErrorResponse {
            error: ErrorDetails {
                message: self.to_string(),
                r#type: self.error_type().to_string(),
                code: status.as_u16(),
            },
        };

        (status, Json(error_response)).into_response()
    }
}
