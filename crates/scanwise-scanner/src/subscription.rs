//! # Detection Subscription
//!
//! Bridges decoder callbacks into a per-session channel. The decoder may
//! call the handler from its own task; the controller drains the channel on
//! its own schedule.
//!
//! Cancelling closes the channel, so a decoder that keeps calling a stale
//! handler only ever sends into a closed channel.

use tokio::sync::mpsc::{self, error::TryRecvError};
use tracing::trace;

use crate::decoder::{Decoder, DetectionEvent, HandlerId};

/// Outcome of a non-blocking poll.
#[derive(Debug, PartialEq)]
pub enum Poll {
    Event(DetectionEvent),
    Empty,
    /// The decoder dropped the handler or the subscription was cancelled.
    Closed,
}

/// A registered detection handler plus the receiving end of its channel.
pub struct DetectionSubscription {
    handler: Option<HandlerId>,
    rx: mpsc::UnboundedReceiver<DetectionEvent>,
}

impl DetectionSubscription {
    /// Registers a forwarding handler on `decoder`.
    pub fn register<D: Decoder + ?Sized>(decoder: &mut D) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let handler = decoder.on_detected(Box::new(move |event| {
            if tx.send(event).is_err() {
                trace!("Detection after cancellation dropped");
            }
        }));
        Self {
            handler: Some(handler),
            rx,
        }
    }

    /// Unregisters the handler and closes the channel. Idempotent.
    ///
    /// Events already buffered are discarded.
    pub fn cancel<D: Decoder + ?Sized>(&mut self, decoder: &mut D) {
        if let Some(id) = self.handler.take() {
            decoder.off_detected(id);
        }
        self.rx.close();
        while self.rx.try_recv().is_ok() {}
    }

    pub fn is_cancelled(&self) -> bool {
        self.handler.is_none()
    }

    /// Takes the next buffered event without waiting.
    pub fn poll(&mut self) -> Poll {
        if self.is_cancelled() {
            return Poll::Closed;
        }
        match self.rx.try_recv() {
            Ok(event) => Poll::Event(event),
            Err(TryRecvError::Empty) => Poll::Empty,
            Err(TryRecvError::Disconnected) => Poll::Closed,
        }
    }

    /// Waits for the next event. `None` once the stream has ended.
    pub async fn next(&mut self) -> Option<DetectionEvent> {
        if self.is_cancelled() {
            return None;
        }
        self.rx.recv().await
    }
}

impl std::fmt::Debug for DetectionSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectionSubscription")
            .field("handler", &self.handler)
            .finish_non_exhaustive()
    }
}
