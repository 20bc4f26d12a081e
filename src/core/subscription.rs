//! # Subscription: the consumer-facing handle.
//!
//! [`subscribe`] converts a fetch capability into a stream of items:
//!
//! ```text
//!   Fetcher ──► Poller task ──► updates channel ──► Subscription::recv()
//!                   ▲
//!                   └── closing channel ◄── Subscription::close() / CloseHandle
//! ```
//!
//! A subscription starts polling immediately and terminates exactly once, on
//! close (or when every handle is dropped). [`merge`](crate::merge) returns
//! this same type, so merged streams compose recursively.
//!
//! ## Close protocol
//! `close` sends a request carrying a reply cell, and the loop answers with
//! the sticky last fetch error from its final iteration. By the time `close`
//! returns, the loop has fully exited: the queue and seen set are gone and no
//! further item can surface. An in-flight fetch is not cancelled; it finishes
//! in the background and its result is dropped.

use tokio::sync::{mpsc, oneshot};

use crate::core::config::Config;
use crate::core::poller::Poller;
use crate::error::FetchError;
use crate::events::Bus;
use crate::feed::{FetcherRef, Item};

/// A close request: the loop replies with its sticky last error.
pub(crate) type CloseRequest = oneshot::Sender<Result<(), FetchError>>;

/// Converts a fetch capability into a running subscription with default
/// [`Config`] and a private event bus.
pub fn subscribe(fetcher: FetcherRef) -> Subscription {
    subscribe_with(fetcher, Config::default(), Bus::default())
}

/// Converts a fetch capability into a running subscription.
///
/// The poll loop starts immediately on the current runtime and publishes its
/// lifecycle to `bus`.
pub fn subscribe_with(fetcher: FetcherRef, cfg: Config, bus: Bus) -> Subscription {
    let (updates_tx, updates_rx) = mpsc::channel(cfg.updates_capacity_clamped());
    let (closing_tx, closing_rx) = mpsc::channel(1);

    let poller = Poller::new(fetcher, cfg, bus, updates_tx, closing_rx);
    tokio::spawn(poller.run());

    Subscription::from_parts(updates_rx, closing_tx)
}

/// # A running stream of feed items.
///
/// Obtained from [`subscribe`] or [`merge`](crate::merge). Receive items with
/// [`recv`](Subscription::recv); shut down with [`close`](Subscription::close)
/// or a [`CloseHandle`].
pub struct Subscription {
    updates: mpsc::Receiver<Item>,
    closing: mpsc::Sender<CloseRequest>,
    closed: bool,
}

impl Subscription {
    pub(crate) fn from_parts(
        updates: mpsc::Receiver<Item>,
        closing: mpsc::Sender<CloseRequest>,
    ) -> Self {
        Self {
            updates,
            closing,
            closed: false,
        }
    }

    /// Receives the next item.
    ///
    /// Returns `None` exactly once the stream has terminated: after this
    /// handle closed it, or once the loop has exited for any other reason and
    /// the channel has drained.
    pub async fn recv(&mut self) -> Option<Item> {
        if self.closed {
            return None;
        }
        self.updates.recv().await
    }

    /// Shuts the stream down and returns the sticky last fetch error.
    ///
    /// Blocks until the loop has acknowledged and fully exited, then drops
    /// anything still parked in the delivery channel, so a subsequent
    /// [`recv`](Subscription::recv) observes the end of the stream and no
    /// further item. Calling `close` again is a no-op returning `Ok(())`; the
    /// recorded error is surfaced only once.
    pub async fn close(&mut self) -> Result<(), FetchError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let result = request_close(&self.closing).await;

        self.updates.close();
        while self.updates.try_recv().is_ok() {}

        result
    }

    /// Returns a clonable handle that closes this subscription from any task.
    pub fn close_handle(&self) -> CloseHandle {
        CloseHandle {
            closing: self.closing.clone(),
        }
    }
}

/// # Cross-task close handle.
///
/// Cheap to clone. [`close`](CloseHandle::close) runs the same protocol as
/// [`Subscription::close`] and may be called from a different task than the
/// one receiving items; the receiving task then observes the end of the
/// stream. Once the subscription is already down, closing returns `Ok(())`.
#[derive(Clone)]
pub struct CloseHandle {
    closing: mpsc::Sender<CloseRequest>,
}

impl CloseHandle {
    /// Shuts the subscription down and returns the sticky last fetch error.
    pub async fn close(&self) -> Result<(), FetchError> {
        request_close(&self.closing).await
    }
}

/// Sends a close request and waits for the loop's acknowledgement.
///
/// A loop that is already gone (previously closed, or exited on its own)
/// yields `Ok(())`.
async fn request_close(
    closing: &mpsc::Sender<CloseRequest>,
) -> Result<(), FetchError> {
    let (reply_tx, reply_rx) = oneshot::channel();
    if closing.send(reply_tx).await.is_err() {
        return Ok(());
    }
    reply_rx.await.unwrap_or(Ok(()))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use tokio::time::{self, Instant};

    use super::*;
    use crate::feed::{Batch, FetcherFn, Item};

    /// Builds a fetcher that replays `steps` in order, one per call, then
    /// idles with empty batches. `Ok` steps ask to be polled again almost
    /// immediately; the idle tail backs far off.
    fn scripted(
        source: &'static str,
        steps: Vec<Result<Vec<&'static str>, &'static str>>,
    ) -> FetcherRef {
        let mut call = 0usize;
        FetcherFn::arc(source, move || {
            let step = steps.get(call).cloned();
            call += 1;
            async move {
                match step {
                    Some(Ok(guids)) => {
                        let items = guids
                            .iter()
                            .map(|guid| Item::new(format!("Item {guid}"), source, *guid))
                            .collect();
                        Ok(Batch::after(items, Duration::from_millis(10)))
                    }
                    Some(Err(msg)) => Err(FetchError::failed(msg)),
                    None => Ok(Batch::after(Vec::new(), Duration::from_secs(3600))),
                }
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_dedup_preserves_admission_order() {
        // Overlapping batches: g2 and g3 are offered twice.
        let fetcher = scripted(
            "blog",
            vec![Ok(vec!["g1", "g2", "g3"]), Ok(vec!["g2", "g3", "g4"])],
        );
        let mut sub = subscribe(fetcher);

        let mut guids = Vec::new();
        for _ in 0..4 {
            guids.push(sub.recv().await.unwrap().guid);
        }
        assert_eq!(guids, ["g1", "g2", "g3", "g4"]);

        assert!(sub.close().await.is_ok());
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_returns_sticky_last_error() {
        let fetcher = scripted("bad", vec![Err("boom"), Err("bust")]);
        let mut sub = subscribe(fetcher);

        // First failure at t=0, second after the 10s retry delay.
        time::sleep(Duration::from_secs(25)).await;

        let err = sub.close().await.unwrap_err();
        assert!(matches!(err, FetchError::Fail { ref error } if error == "bust"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_twice_is_a_no_op() {
        let fetcher = scripted("bad", vec![Err("boom")]);
        let mut sub = subscribe(fetcher);

        time::sleep(Duration::from_secs(5)).await;

        assert!(sub.close().await.is_err());
        // The error was surfaced by the first call.
        assert!(sub.close().await.is_ok());
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetches_back_off_and_deliver_nothing() {
        let calls: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&calls);
        let fetcher = FetcherFn::arc("flaky", move || {
            log.lock().unwrap().push(Instant::now());
            async { Err(FetchError::failed("unreachable")) }
        });
        let mut sub = subscribe(fetcher);

        time::sleep(Duration::from_secs(35)).await;

        // Nothing was ever delivered.
        assert!(time::timeout(Duration::ZERO, sub.recv()).await.is_err());
        assert!(sub.close().await.is_err());

        let calls = calls.lock().unwrap();
        assert!(calls.len() >= 3, "expected several attempts, got {}", calls.len());
        for pair in calls.windows(2) {
            assert!(
                pair[1] - pair[0] >= Duration::from_secs(10),
                "attempts only {:?} apart",
                pair[1] - pair[0]
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_queue_withholds_polling_until_drained() {
        // Every call offers the same fifteen GUIDs, eager to be polled again.
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let fetcher = FetcherFn::arc("firehose", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async {
                let items = (1..=15)
                    .map(|i| Item::new(format!("Item {i}"), "firehose", format!("g{i}")))
                    .collect();
                Ok(Batch::after(items, Duration::ZERO))
            }
        });
        let mut sub = subscribe_with(fetcher, Config::default(), Bus::default());

        // With nobody reading, the first batch fills the queue (10), one item
        // moves into the delivery channel, and a second fetch tops the queue
        // back up. After that, polling is withheld.
        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // Draining unblocks polling; every item arrives exactly once, in
        // admission order.
        let mut guids = Vec::new();
        for _ in 0..15 {
            guids.push(sub.recv().await.unwrap().guid);
        }
        let expected: Vec<String> = (1..=15).map(|i| format!("g{i}")).collect();
        assert_eq!(guids, expected);
        assert!(calls.load(Ordering::SeqCst) >= 3);

        assert!(sub.close().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_is_honored_while_fetch_is_in_flight() {
        let fetcher = FetcherFn::arc("stuck", || async {
            std::future::pending::<Result<Batch, FetchError>>().await
        });
        let mut sub = subscribe(fetcher);

        // Let the loop start its (never-finishing) fetch.
        time::sleep(Duration::from_millis(5)).await;

        assert!(sub.close().await.is_ok());
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_handle_shuts_down_from_another_task() {
        let fetcher = scripted("feed", vec![Ok(vec!["g1"])]);
        let mut sub = subscribe(fetcher);
        let handle = sub.close_handle();

        assert_eq!(sub.recv().await.unwrap().guid, "g1");

        let closer = tokio::spawn(async move { handle.close().await });

        // The reading task observes the terminated stream.
        assert!(sub.recv().await.is_none());
        assert!(closer.await.unwrap().is_ok());

        // A second handle finds the loop already gone.
        assert!(sub.close_handle().close().await.is_ok());
    }
}
