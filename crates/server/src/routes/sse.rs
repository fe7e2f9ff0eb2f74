use std::convert::Infallible;
use std::time::Duration;

use axum::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CONNECTION};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use events::{EventReceiver, ProgressEvent};
use futures::stream::StreamExt;

pub const SSE_KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

fn progress_to_sse_event(event: ProgressEvent) -> Result<Event, Infallible> {
    Ok(Event::default().data(event.to_json()))
}

/// Stream a pipeline's progress events as `data: <json>` frames until the
/// pipeline closes its stream.
pub fn progress_stream(receiver: EventReceiver) -> impl IntoResponse {
    let stream = receiver.into_stream().map(progress_to_sse_event);

    (
        [(CONNECTION, "keep-alive"), (ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
        Sse::new(stream).keep_alive(KeepAlive::new().interval(SSE_KEEP_ALIVE_INTERVAL)),
    )
}
