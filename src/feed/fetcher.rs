//! # Fetch capability.
//!
//! [`Fetcher`] is the boundary between the engine and whatever actually
//! retrieves feed content (HTTP, disk, a fake in tests). One call produces a
//! [`Batch`]: the items retrieved plus an advisory instant for the next poll.
//!
//! The engine, not the capability, is responsible for deduplication: batches
//! from successive calls may freely repeat GUIDs seen in earlier calls. On
//! failure the scheduling hint is not trusted either; the poll loop
//! substitutes its own retry delay.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::FetchError;
use crate::feed::Item;

/// # Shared handle to a fetch capability.
///
/// This is the type consumed by [`subscribe`](crate::subscribe).
pub type FetcherRef = Arc<dyn Fetcher>;

/// The result of one successful fetch call.
#[derive(Clone, Debug)]
pub struct Batch {
    /// Retrieved items, in the order the source reported them.
    pub items: Vec<Item>,
    /// Advisory instant at which the source wants to be polled again.
    pub next_poll: Instant,
}

impl Batch {
    /// Creates a batch with an explicit next-poll instant.
    pub fn new(items: Vec<Item>, next_poll: Instant) -> Self {
        Self { items, next_poll }
    }

    /// Creates a batch that asks to be polled again after `delay`.
    pub fn after(items: Vec<Item>, delay: std::time::Duration) -> Self {
        Self {
            items,
            next_poll: Instant::now() + delay,
        }
    }
}

/// # Asynchronous fetch capability.
///
/// A `Fetcher` has a stable [`source`](Fetcher::source) label and an async
/// [`fetch`](Fetcher::fetch) method that retrieves one batch. The call may
/// block for as long as the underlying I/O takes; the engine never cancels an
/// attempt that has already started.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use feedvisor::{Batch, FetchError, Fetcher};
///
/// struct Empty;
///
/// #[async_trait]
/// impl Fetcher for Empty {
///     fn source(&self) -> &str { "empty" }
///
///     async fn fetch(&self) -> Result<Batch, FetchError> {
///         Ok(Batch::after(Vec::new(), std::time::Duration::from_secs(2)))
///     }
/// }
/// ```
#[async_trait]
pub trait Fetcher: Send + Sync + 'static {
    /// Returns a stable, human-readable source label (used as the channel
    /// name in events).
    fn source(&self) -> &str;

    /// Retrieves one batch of items, or fails.
    async fn fetch(&self) -> Result<Batch, FetchError>;
}
