//! Single-producer progress stream over a tokio mpsc channel

use std::collections::HashSet;
use std::sync::Mutex;

use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::warn;

use crate::types::ProgressEvent;

/// Writer half of a progress stream.
///
/// Events are delivered in emission order. Writing after [`close`] or after
/// the consumer went away is a silent no-op, and closing is idempotent.
/// At most one terminal event (`complete` / `error`) is forwarded per phase.
///
/// [`close`]: EventStream::close
pub struct EventStream {
    inner: Mutex<Inner>,
}

struct Inner {
    sender: Option<mpsc::UnboundedSender<ProgressEvent>>,
    terminated: HashSet<String>,
    sent: usize,
}

/// Reader half of a progress stream.
pub struct EventReceiver {
    receiver: mpsc::UnboundedReceiver<ProgressEvent>,
}

impl EventStream {
    /// Create a connected writer/receiver pair.
    pub fn channel() -> (EventStream, EventReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let stream = EventStream {
            inner: Mutex::new(Inner {
                sender: Some(sender),
                terminated: HashSet::new(),
                sent: 0,
            }),
        };
        (stream, EventReceiver { receiver })
    }

    /// Push an event to the consumer.
    ///
    /// Returns whether the event was handed to the channel.
    pub fn send(&self, event: ProgressEvent) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if inner.sender.is_none() {
            return false;
        }

        if event.status.is_terminal() && !inner.terminated.insert(event.phase.clone()) {
            warn!(
                phase = %event.phase,
                status = event.status.as_str(),
                "Dropping duplicate terminal event"
            );
            return false;
        }

        let delivered = inner
            .sender
            .as_ref()
            .map(|sender| sender.send(event).is_ok())
            .unwrap_or(false);
        if delivered {
            inner.sent += 1;
        }
        delivered
    }

    /// Close the stream. Safe to call any number of times.
    pub fn close(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        inner.sender.take();
    }

    pub fn is_closed(&self) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .sender
            .is_none()
    }

    /// Whether a terminal event was already emitted for `phase`.
    pub fn has_terminated(&self, phase: &str) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .terminated
            .contains(phase)
    }

    /// Number of events handed to the channel so far.
    pub fn sent_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .sent
    }
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("closed", &self.is_closed())
            .field("sent", &self.sent_count())
            .finish()
    }
}

impl EventReceiver {
    /// Next event, or `None` once the writer is closed and drained.
    pub async fn recv(&mut self) -> Option<ProgressEvent> {
        self.receiver.recv().await
    }

    /// Drain every event until the writer closes.
    pub async fn collect(mut self) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.receiver.recv().await {
            events.push(event);
        }
        events
    }

    pub fn into_stream(self) -> UnboundedReceiverStream<ProgressEvent> {
        UnboundedReceiverStream::new(self.receiver)
    }
}
