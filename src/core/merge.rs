//! # Fan-in merge: many subscriptions, one stream.
//!
//! [`merge`] composes a fixed set of already-running subscriptions into a
//! single [`Subscription`] with the same receive/close contract, so merges
//! nest inside merges.
//!
//! ```text
//!   child 1 ──► forwarder ─┐
//!   child 2 ──► forwarder ─┼──► updates channel ──► merged Subscription
//!   child N ──► forwarder ─┘
//!                  ▲
//!         per-child shutdown token ◄── driver ◄── close request
//! ```
//!
//! Each forwarder repeats two independently-cancellable waits: next item from
//! its child **or** shutdown, then forward the item **or** shutdown. On
//! shutdown at either point it closes its child and reports the result on a
//! shared channel, then exits.
//!
//! The driver serves the close protocol: cancel each child's token (exactly
//! one shutdown signal per child), collect exactly one report per child,
//! keep the last non-`Ok` report as the aggregate, reply. Error collection is
//! the synchronization barrier: close does not return before every child has
//! shut down. Reports that lose the race are superseded; only the most recent
//! failure survives aggregation.
//!
//! Items flowing from one child keep their relative order; items from
//! different children interleave arbitrarily. An item caught mid-forward when
//! shutdown wins the second wait is dropped, exactly as if its subscription
//! had been closed before delivering it.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::core::config::Config;
use crate::core::subscription::{CloseRequest, Subscription};
use crate::error::FetchError;
use crate::events::{Bus, Event, EventKind};
use crate::feed::Item;

/// Merges subscriptions with default [`Config`] and a private event bus.
pub fn merge(subs: Vec<Subscription>) -> Subscription {
    merge_with(subs, Config::default(), Bus::default())
}

/// Merges subscriptions into one.
///
/// Takes ownership of every child; closing the merged subscription closes
/// them all and aggregates their close errors, keeping the last non-`Ok` one.
/// A merge over an empty set terminates immediately and closes clean.
pub fn merge_with(subs: Vec<Subscription>, cfg: Config, bus: Bus) -> Subscription {
    let (updates_tx, updates_rx) = mpsc::channel(cfg.updates_capacity_clamped());
    let (closing_tx, closing_rx) = mpsc::channel(1);
    // Buffered per child so a forwarder can always deposit its report and
    // exit, even when nobody is collecting yet.
    let (reports_tx, reports_rx) = mpsc::channel(subs.len().max(1));

    let mut quits = Vec::with_capacity(subs.len());
    for child in subs {
        let quit = CancellationToken::new();
        quits.push(quit.clone());
        tokio::spawn(forward(child, updates_tx.clone(), quit, reports_tx.clone()));
    }
    drop(reports_tx);
    // The forwarders hold the only remaining update senders: the merged
    // stream terminates once every one of them has exited.
    drop(updates_tx);

    tokio::spawn(drive_close(closing_rx, quits, reports_rx, bus));

    Subscription::from_parts(updates_rx, closing_tx)
}

/// Pumps one child into the merged stream until shutdown.
async fn forward(
    mut child: Subscription,
    updates: mpsc::Sender<Item>,
    quit: CancellationToken,
    reports: mpsc::Sender<Result<(), FetchError>>,
) {
    loop {
        let item = tokio::select! {
            _ = quit.cancelled() => break,
            next = child.recv() => match next {
                Some(item) => item,
                // The child stream ended on its own. Park until shutdown so
                // the close report is still collected by the driver.
                None => {
                    quit.cancelled().await;
                    break;
                }
            },
        };

        tokio::select! {
            _ = quit.cancelled() => break,
            permit = updates.reserve() => match permit {
                Ok(permit) => permit.send(item),
                // The merged receiver is gone; no point pumping further.
                Err(_) => break,
            },
        }
    }

    let _ = reports.send(child.close().await).await;
}

/// Serves the merged subscription's close protocol.
///
/// Also runs when the merged handle is dropped without an explicit close, so
/// children are never left polling behind an abandoned merge.
async fn drive_close(
    mut closing: mpsc::Receiver<CloseRequest>,
    quits: Vec<CancellationToken>,
    mut reports: mpsc::Receiver<Result<(), FetchError>>,
    bus: Bus,
) {
    // Parks here until a close request arrives or every handle is dropped.
    let reply = closing.recv().await;

    for quit in &quits {
        quit.cancel();
    }

    let mut aggregate = Ok(());
    for _ in 0..quits.len() {
        match reports.recv().await {
            // Last non-Ok report wins; earlier failures are superseded.
            Some(Err(err)) => aggregate = Err(err),
            Some(Ok(())) => {}
            None => break,
        }
    }

    if let Some(reply) = reply {
        let _ = reply.send(aggregate);
    }
    bus.publish(Event::new(EventKind::MergeClosed));
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time;

    use super::*;
    use crate::core::subscription::subscribe;
    use crate::feed::{Batch, FetcherFn, FetcherRef};

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
    async fn test_merge_forwards_all_children_and_aggregates_errors() {
        let a = subscribe(scripted("a", vec![Ok(vec!["a1"])]));
        let b = subscribe(scripted("b", vec![Ok(vec!["b1"]), Err("E")]));
        let mut merged = merge(vec![a, b]);

        let mut guids = Vec::new();
        for _ in 0..2 {
            guids.push(merged.recv().await.unwrap().guid);
        }
        guids.sort();
        assert_eq!(guids, ["a1", "b1"]);

        // Give b's second fetch time to fail and stick.
        time::sleep(Duration::from_secs(1)).await;

        let err = merged.close().await.unwrap_err();
        assert!(matches!(err, FetchError::Fail { ref error } if error == "E"));
        assert!(merged.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_merge_preserves_per_source_order_only() {
        let x = subscribe(scripted("x", vec![Ok(vec!["x1", "x2"]), Ok(vec!["x3"])]));
        let y = subscribe(scripted("y", vec![Ok(vec!["y1"]), Ok(vec!["y2", "y3"])]));
        let mut merged = merge(vec![x, y]);

        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for _ in 0..6 {
            let item = merged.recv().await.unwrap();
            match item.channel.as_str() {
                "x" => xs.push(item.guid),
                _ => ys.push(item.guid),
            }
        }
        assert_eq!(xs, ["x1", "x2", "x3"]);
        assert_eq!(ys, ["y1", "y2", "y3"]);

        assert!(merged.close().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_merge_composes_recursively() {
        let inner = merge(vec![subscribe(scripted("a", vec![Ok(vec!["a1"])]))]);
        let outer = subscribe(scripted("b", vec![Ok(vec!["b1"])]));
        let mut merged = merge(vec![inner, outer]);

        let mut guids = Vec::new();
        for _ in 0..2 {
            guids.push(merged.recv().await.unwrap().guid);
        }
        guids.sort();
        assert_eq!(guids, ["a1", "b1"]);

        assert!(merged.close().await.is_ok());
    }

    #[tokio::test]
    async fn test_empty_merge_terminates_and_closes_clean() {
        let mut merged = merge(Vec::new());
        assert!(merged.recv().await.is_none());
        assert!(merged.close().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_merge_close_reaches_children_mid_stream() {
        // Children keep producing; close must still land promptly and stop
        // the merged stream.
        let a = subscribe(scripted(
            "a",
            vec![Ok(vec!["a1"]), Ok(vec!["a2"]), Ok(vec!["a3"])],
        ));
        let b = subscribe(scripted("b", vec![Ok(vec!["b1"]), Ok(vec!["b2"])]));
        let mut merged = merge(vec![a, b]);

        // Read one item, then shut everything down with more still queued.
        assert!(merged.recv().await.is_some());
        assert!(merged.close().await.is_ok());
        assert!(merged.recv().await.is_none());
    }
}
