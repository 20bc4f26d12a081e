//! Event bus for broadcasting engine events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] through which
//! poll loops and merge drivers publish [`Event`]s.
//!
//! - [`Bus::publish`] sends an event to all subscribers (non-blocking).
//! - [`Bus::subscribe`] creates a new raw receiver.
//! - [`Bus::attach`] spawns a worker that feeds a [`Subscriber`], isolating
//!   the engine from panics inside it.
//!
//! A subscriber that lags behind more than the bus capacity skips the events
//! it missed and keeps going.

use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::events::{Event, Subscriber};

/// Broadcast channel for engine events.
#[derive(Clone)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (clamped to 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Errors are ignored if there are no active subscribers.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Subscribes to the bus and returns a new receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Spawns a worker that delivers every published event to `subscriber`.
    ///
    /// The worker exits when the last bus handle is dropped. Panics inside
    /// the subscriber are caught and reported on stderr so one bad consumer
    /// cannot take the engine down with it.
    pub fn attach(&self, subscriber: Arc<dyn Subscriber>) -> JoinHandle<()> {
        let mut rx = self.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => {
                        let fut = subscriber.handle(&ev);
                        if let Err(panic_err) =
                            std::panic::AssertUnwindSafe(fut).catch_unwind().await
                        {
                            eprintln!(
                                "[feedvisor] subscriber '{}' panicked: {:?}",
                                subscriber.name(),
                                panic_err
                            );
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

impl Default for Bus {
    /// Returns a bus with a 64-event ring buffer.
    fn default() -> Self {
        Bus::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn test_publish_reaches_raw_receivers() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();

        bus.publish(Event::new(EventKind::FetchStarted).with_source("s"));

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::FetchStarted);
        assert_eq!(ev.source.as_deref(), Some("s"));
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_a_no_op() {
        let bus = Bus::new(8);
        bus.publish(Event::new(EventKind::MergeClosed));
    }
}
