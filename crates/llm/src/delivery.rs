//! Emission of generated listings to the caller.

use std::convert::Infallible;

use axum::{
    Json,
    body::Body,
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
};
use futures::{StreamExt, stream};

use crate::{
    error::CompletionServiceError,
    messages::ListingResponse,
    provider::FragmentStream,
};

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Answer with the whole listing as JSON.
pub(crate) fn whole(listing: String) -> Response {
    Json(ListingResponse { listing }).into_response()
}

/// Answer with a `text/plain` body where every fragment becomes one chunk.
///
/// The first fragment is awaited before the response starts, so a failure before any content
/// still turns into an error status. Later failures end the body early.
pub(crate) async fn incremental(mut fragments: FragmentStream) -> crate::Result<Response> {
    let first = match fragments.next().await {
        Some(Ok(fragment)) => fragment,
        Some(Err(error)) => return Err(error),
        None => return Err(CompletionServiceError::EmptyCompletion.into()),
    };

    let rest = fragments.scan(1usize, |emitted, fragment| {
        let next = match fragment {
            Ok(fragment) => {
                *emitted += 1;
                Some(fragment)
            }
            Err(e) => {
                log::warn!("Listing stream truncated after {emitted} fragment(s): {e}");
                None
            }
        };

        futures::future::ready(next)
    });

    let body = stream::once(futures::future::ready(first))
        .chain(rest)
        .map(Ok::<_, Infallible>);

    log::debug!("Returning streaming response");

    Ok(([(CONTENT_TYPE, TEXT_PLAIN)], Body::from_stream(body)).into_response())
}
