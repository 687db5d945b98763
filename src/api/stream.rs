use std::{convert::Infallible, future::Future};

use axum::{
    body::Body,
    http::header,
    response::{IntoResponse, Response},
};
use futures::stream;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::transfer::ProgressReporter;

/// Serves encoded progress frames as a `text/event-stream` body. The body
/// ends once every sender is gone.
pub fn event_stream(rx: UnboundedReceiver<String>) -> Response {
    let frames = stream::unfold(rx, |mut rx| async move {
        let frame = rx.recv().await?;
        Some((Ok::<_, Infallible>(frame), rx))
    });

    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        Body::from_stream(frames),
    )
        .into_response()
}

/// Runs `task` in its own tokio task and streams whatever it reports.
pub fn spawn_stream<F, Fut>(task: F) -> Response
where
    F: FnOnce(ProgressReporter) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (progress, rx) = ProgressReporter::channel();
    tokio::spawn(task(progress));
    event_stream(rx)
}
