//! Response rendering.
//!
//! Turns a [`ChainResponse`] into an HTTP response and runs the deferred
//! lifecycle action at the right moment: `-crash` before anything is
//! returned, `-quit` once the body has been handed to the connection.

use axum::body::{Body, Bytes};
use axum::response::Response;
use futures_util::stream::{self, Stream, StreamExt};
use std::convert::Infallible;
use std::sync::Arc;

use crate::chain::{ChainResponse, LifecycleAction};
use crate::lifecycle::ShutdownCoordinator;

/// A one-chunk body that requests a graceful stop after the chunk is taken.
fn stop_after(
    body: String,
    lifecycle: Arc<dyn ShutdownCoordinator>,
) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static {
    let stop = stream::once(async move {
        lifecycle.request_graceful_stop();
    })
    .filter_map(|()| async { None::<Result<Bytes, Infallible>> });

    stream::once(async move { Ok(Bytes::from(body)) }).chain(stop)
}

pub fn into_http_response(chain: ChainResponse, lifecycle: Arc<dyn ShutdownCoordinator>) -> Response {
    let ChainResponse {
        status,
        headers,
        body,
        action,
    } = chain;

    let body = match action {
        None => Body::from(body),
        Some(LifecycleAction::FinishGracefully) => Body::from_stream(stop_after(body, lifecycle)),
        Some(LifecycleAction::TerminateImmediately) => {
            lifecycle.terminate_immediately();
            Body::from(body)
        }
    };

    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::RecordingShutdown;
    use axum::http::{HeaderMap, StatusCode};

    fn chain(action: Option<LifecycleAction>) -> ChainResponse {
        ChainResponse {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: "| Quitting\n".into(),
            action,
        }
    }

    #[tokio::test]
    async fn graceful_stop_waits_for_the_body() {
        let recording = Arc::new(RecordingShutdown::default());
        let response = into_http_response(chain(Some(LifecycleAction::FinishGracefully)), recording.clone());
        assert_eq!(recording.graceful_stops(), 0);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"| Quitting\n");
        assert_eq!(recording.graceful_stops(), 1);
    }

    #[tokio::test]
    async fn crash_terminates_before_returning() {
        let recording = Arc::new(RecordingShutdown::default());
        let _response = into_http_response(chain(Some(LifecycleAction::TerminateImmediately)), recording.clone());
        assert_eq!(recording.terminations(), 1);
        assert_eq!(recording.graceful_stops(), 0);
    }

    #[tokio::test]
    async fn plain_response_has_no_side_effects() {
        let recording = Arc::new(RecordingShutdown::default());
        let response = into_http_response(chain(None), recording.clone());
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(recording.graceful_stops() + recording.terminations(), 0);
    }
}
