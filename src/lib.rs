//! # feedvisor
//!
//! **Feedvisor** is a feed-aggregation engine for Rust.
//!
//! It turns fetch capabilities into per-source polling subscriptions with
//! deduplication, bounded buffering and retry backoff, and merges many such
//! subscriptions into a single stream with synchronized, error-aggregating
//! shutdown.
//!
//! ## Architecture
//! ```text
//!   ┌────────────┐      ┌────────────┐      ┌────────────┐
//!   │  Fetcher   │      │  Fetcher   │      │  Fetcher   │   abstract capability:
//!   │ (source 1) │      │ (source 2) │      │ (source 3) │   one batch per call
//!   └─────┬──────┘      └─────┬──────┘      └─────┬──────┘
//!         ▼                   ▼                   ▼
//!   ┌────────────┐      ┌────────────┐      ┌────────────┐
//!   │   Poller   │      │   Poller   │      │   Poller   │   one loop per source:
//!   │   (task)   │      │   (task)   │      │   (task)   │   dedup + bounded queue
//!   └─────┬──────┘      └─────┬──────┘      └─────┬──────┘   + retry backoff
//!         ▼                   ▼                   ▼
//!    Subscription        Subscription        Subscription
//!         │                   │                   │
//!         └─────────────── merge ────────────────┘
//!                             │
//!                       Subscription   (same contract, recursively composable)
//! ```
//!
//! Every poll loop owns its state exclusively; coordination happens only
//! through channels. Closing a subscription blocks until its loop has fully
//! exited and returns the last fetch error the loop observed; closing a merge
//! cascades to every child and aggregates their errors.
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                    |
//! |-------------------|---------------------------------------------------------------|---------------------------------------|
//! | **Feed model**    | Items, batches, and the abstract fetch capability.            | [`Item`], [`Batch`], [`Fetcher`]      |
//! | **Subscriptions** | Polling loops with dedup, backpressure and sticky errors.     | [`subscribe`], [`Subscription`]       |
//! | **Merging**       | Fan-in of many subscriptions with aggregated shutdown.        | [`merge`], [`CloseHandle`]            |
//! | **Policies**      | Retry delay growth and jitter after failed fetches.           | [`RetryPolicy`], [`Jitter`]           |
//! | **Events**        | Engine lifecycle events over a broadcast bus.                 | [`Event`], [`Bus`], [`Subscriber`]    |
//! | **Errors**        | Typed fetch errors surfaced through the close protocol.       | [`FetchError`]                        |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```no_run
//! use std::time::Duration;
//! use feedvisor::{merge, subscribe, Batch, FetcherFn, Item};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let mut n = 0u32;
//!     let news = subscribe(FetcherFn::arc("news", move || {
//!         n += 1;
//!         let item = Item::new(format!("Item {n}"), "news", format!("news-{n}"));
//!         async move { Ok(Batch::after(vec![item], Duration::from_secs(2))) }
//!     }));
//!     let blog = subscribe(FetcherFn::arc("blog", || async {
//!         Ok(Batch::after(Vec::new(), Duration::from_secs(2)))
//!     }));
//!
//!     let mut all = merge(vec![news, blog]);
//!
//!     // Shut down from elsewhere after a while.
//!     let handle = all.close_handle();
//!     tokio::spawn(async move {
//!         tokio::time::sleep(Duration::from_secs(3)).await;
//!         println!("closed: {:?}", handle.close().await);
//!     });
//!
//!     while let Some(item) = all.recv().await {
//!         println!("{} {}", item.channel, item.title);
//!     }
//! }
//! ```

mod core;
mod error;
mod events;
mod feed;
mod policies;

// ---- Public re-exports ----

pub use crate::core::{
    merge, merge_with, subscribe, subscribe_with, CloseHandle, Config, Subscription,
};
pub use crate::error::FetchError;
pub use crate::events::{Bus, Event, EventKind, Subscriber};
pub use crate::feed::{Batch, Fetcher, FetcherFn, FetcherRef, Item};
pub use crate::policies::{Jitter, RetryPolicy};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use crate::events::LogWriter;
