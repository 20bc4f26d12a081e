//! # The per-source poll loop.
//!
//! One [`Poller`] task runs per subscription. Each iteration is a single
//! multi-way wait over whichever of these are currently eligible:
//!
//! 1. **Close request**: reply with the sticky last error and exit. Always
//!    eligible, including while a fetch is in flight.
//! 2. **Poll timer**: start one fetch as an independent task. Eligible only
//!    when no fetch is in flight and the pending queue has spare capacity.
//! 3. **Fetch completion**: admit unseen items in order (success) or record
//!    the sticky error and schedule a retry (failure).
//! 4. **Delivery**: hand the queue head to the consumer.
//!
//! `tokio::select!` polls its branches in random order, so several eligible
//! alternatives are chosen between arbitrarily and a close request cannot be
//! starved by a busy stream.
//!
//! ## Ownership
//! The pending queue and the seen set live on this task's stack and are never
//! shared; everything crossing a task boundary goes through a channel.
//!
//! ## The in-flight fetch
//! A fetch runs as its own task and deposits its result into a one-shot cell.
//! The cell is buffered: if the loop exits first, the abandoned task still
//! completes, its result is dropped, and nothing blocks. This is the only
//! resource intentionally left behind, bounded to one fetch per subscription.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant};

use crate::core::config::Config;
use crate::core::subscription::CloseRequest;
use crate::error::FetchError;
use crate::events::{Bus, Event, EventKind};
use crate::feed::{Batch, FetcherRef, Item};

/// Result of one fetch attempt, as deposited by the fetch task.
type FetchOutcome = Result<Batch, FetchError>;

/// State owned by one subscription's loop task.
pub(crate) struct Poller {
    fetcher: FetcherRef,
    cfg: Config,
    bus: Bus,
    updates: mpsc::Sender<Item>,
    closing: mpsc::Receiver<CloseRequest>,
}

impl Poller {
    pub(crate) fn new(
        fetcher: FetcherRef,
        cfg: Config,
        bus: Bus,
        updates: mpsc::Sender<Item>,
        closing: mpsc::Receiver<CloseRequest>,
    ) -> Self {
        Self {
            fetcher,
            cfg,
            bus,
            updates,
            closing,
        }
    }

    pub(crate) async fn run(self) {
        let Poller {
            fetcher,
            cfg,
            bus,
            updates,
            mut closing,
        } = self;

        let source: Arc<str> = Arc::from(fetcher.source());
        let max_pending = cfg.max_pending_clamped();

        let mut pending: VecDeque<Item> = VecDeque::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut last_error: Option<FetchError> = None;
        let mut in_flight: Option<oneshot::Receiver<FetchOutcome>> = None;
        let mut next_poll = Instant::now();
        let mut streak: u32 = 0;

        loop {
            let can_poll = in_flight.is_none() && pending.len() < max_pending;
            let deliverable = !pending.is_empty();

            tokio::select! {
                request = closing.recv() => {
                    match request {
                        Some(reply) => {
                            let result = match last_error.take() {
                                Some(err) => Err(err),
                                None => Ok(()),
                            };
                            let _ = reply.send(result);
                            bus.publish(
                                Event::new(EventKind::SubscriptionClosed)
                                    .with_source(Arc::clone(&source)),
                            );
                        }
                        // Every handle is gone without an explicit close.
                        None => {
                            bus.publish(
                                Event::new(EventKind::SubscriptionClosed)
                                    .with_source(Arc::clone(&source))
                                    .with_reason("handle dropped"),
                            );
                        }
                    }
                    return;
                }

                _ = time::sleep_until(next_poll), if can_poll => {
                    let (done_tx, done_rx) = oneshot::channel();
                    let fetcher = Arc::clone(&fetcher);
                    tokio::spawn(async move {
                        // The send fails only if the loop is gone; the result
                        // is dropped and this task exits either way.
                        let _ = done_tx.send(fetcher.fetch().await);
                    });
                    in_flight = Some(done_rx);
                    bus.publish(
                        Event::new(EventKind::FetchStarted).with_source(Arc::clone(&source)),
                    );
                }

                outcome = await_fetch(&mut in_flight) => {
                    in_flight = None;
                    match outcome {
                        Ok(batch) => {
                            streak = 0;
                            next_poll = batch.next_poll;
                            let admitted = admit(
                                batch.items,
                                &mut pending,
                                &mut seen,
                                max_pending,
                                &bus,
                                &source,
                            );
                            if admitted > 0 {
                                bus.publish(
                                    Event::new(EventKind::BatchAdmitted)
                                        .with_source(Arc::clone(&source))
                                        .with_admitted(admitted),
                                );
                            }
                        }
                        Err(err) => {
                            // The capability's scheduling hint is not trusted
                            // after a failure; the retry policy decides.
                            let delay = cfg.retry.next(streak);
                            streak = streak.saturating_add(1);
                            next_poll = Instant::now() + delay;
                            bus.publish(
                                Event::new(EventKind::FetchFailed)
                                    .with_source(Arc::clone(&source))
                                    .with_reason(err.to_string())
                                    .with_attempt(streak),
                            );
                            bus.publish(
                                Event::new(EventKind::BackoffScheduled)
                                    .with_source(Arc::clone(&source))
                                    .with_delay(delay)
                                    .with_attempt(streak),
                            );
                            last_error = Some(err);
                        }
                    }
                }

                permit = updates.reserve(), if deliverable => {
                    match permit {
                        Ok(permit) => {
                            if let Some(item) = pending.pop_front() {
                                permit.send(item);
                            }
                        }
                        Err(_) => {
                            // The consumer's receiver is gone; nothing can be
                            // delivered anymore.
                            bus.publish(
                                Event::new(EventKind::SubscriptionClosed)
                                    .with_source(Arc::clone(&source))
                                    .with_reason("consumer dropped"),
                            );
                            return;
                        }
                    }
                }

                _ = updates.closed(), if !deliverable => {
                    bus.publish(
                        Event::new(EventKind::SubscriptionClosed)
                            .with_source(Arc::clone(&source))
                            .with_reason("consumer dropped"),
                    );
                    return;
                }
            }
        }
    }
}

/// Resolves to the in-flight fetch's outcome, or never if there is none.
///
/// A dropped result cell means the fetch task died before depositing
/// anything; that is reported as a failed attempt, not a crash.
async fn await_fetch(slot: &mut Option<oneshot::Receiver<FetchOutcome>>) -> FetchOutcome {
    match slot.as_mut() {
        Some(done) => match done.await {
            Ok(outcome) => outcome,
            Err(_) => Err(FetchError::Aborted),
        },
        None => std::future::pending().await,
    }
}

/// Appends unseen items to the queue tail, in batch order, up to capacity.
///
/// Items that do not fit are left unadmitted and unseen: a later batch may
/// offer them again once the consumer has drained the queue. Returns the
/// number of items admitted.
fn admit(
    items: Vec<Item>,
    pending: &mut VecDeque<Item>,
    seen: &mut HashSet<String>,
    max_pending: usize,
    bus: &Bus,
    source: &Arc<str>,
) -> u32 {
    let mut admitted = 0u32;
    for item in items {
        if seen.contains(&item.guid) {
            bus.publish(
                Event::new(EventKind::DuplicateDropped)
                    .with_source(Arc::clone(source))
                    .with_guid(item.guid),
            );
            continue;
        }
        if pending.len() >= max_pending {
            break;
        }
        seen.insert(item.guid.clone());
        pending.push_back(item);
        admitted += 1;
    }
    admitted
}
