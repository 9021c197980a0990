use axum::Json;
use axum::http::StatusCode;

/// Static payload of the liveness endpoint.
#[derive(Debug, serde::Serialize)]
pub(crate) struct Liveness {
    message: &'static str,
}

/// Reports that the process is up. Never touches the completion service.
pub(crate) async fn liveness() -> (StatusCode, Json<Liveness>) {
    (
        StatusCode::OK,
        Json(Liveness {
            message: "AI Listing Writer backend is running!",
        }),
    )
}
