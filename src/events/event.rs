//! # Events emitted by poll loops and merges.
//!
//! [`EventKind`] classifies what happened; [`Event`] carries the metadata
//! (source label, failure reason, retry delay, batch counts). Each event gets
//! a globally unique, monotonically increasing sequence number so consumers
//! can restore exact order even when delivery interleaves.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use feedvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::FetchFailed)
//!     .with_source("blog.golang.org")
//!     .with_reason("connection refused")
//!     .with_attempt(3);
//!
//! assert_eq!(ev.kind, EventKind::FetchFailed);
//! assert_eq!(ev.source.as_deref(), Some("blog.golang.org"));
//! assert_eq!(ev.attempt, Some(3));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of engine events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A fetch attempt was started for a source.
    ///
    /// Sets: `source`.
    FetchStarted,

    /// A successful batch was processed; at least one new item was admitted
    /// to the pending queue.
    ///
    /// Sets: `source`, `admitted`.
    BatchAdmitted,

    /// A fetch attempt failed. The error becomes the sticky last error.
    ///
    /// Sets: `source`, `reason`, `attempt` (failure streak, 1-based).
    FetchFailed,

    /// The next poll was scheduled after a failure.
    ///
    /// Sets: `source`, `delay_ms`, `attempt` (failure streak, 1-based).
    BackoffScheduled,

    /// An item was dropped because its GUID had already been admitted.
    ///
    /// Sets: `source`, `guid`.
    DuplicateDropped,

    /// A subscription's poll loop exited.
    ///
    /// Sets: `source`; `reason` when the exit was not an explicit close.
    SubscriptionClosed,

    /// A merge finished its shutdown: every child is closed and reported.
    ///
    /// Sets: nothing beyond `seq`/`at`.
    MergeClosed,
}

/// Engine event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Source label, if applicable.
    pub source: Option<Arc<str>>,
    /// Human-readable reason (failure messages, exit causes).
    pub reason: Option<Arc<str>>,
    /// GUID of the item involved, if applicable.
    pub guid: Option<Arc<str>>,
    /// Consecutive-failure streak (starting from 1).
    pub attempt: Option<u32>,
    /// Retry delay before the next attempt in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Number of items admitted from a batch.
    pub admitted: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next
    /// sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            source: None,
            reason: None,
            guid: None,
            attempt: None,
            delay_ms: None,
            admitted: None,
        }
    }

    /// Attaches a source label.
    #[inline]
    pub fn with_source(mut self, source: impl Into<Arc<str>>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches an item GUID.
    #[inline]
    pub fn with_guid(mut self, guid: impl Into<Arc<str>>) -> Self {
        self.guid = Some(guid.into());
        self
    }

    /// Attaches a failure streak count.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a retry delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches an admitted-item count.
    #[inline]
    pub fn with_admitted(mut self, n: u32) -> Self {
        self.admitted = Some(n);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_set_metadata() {
        let ev = Event::new(EventKind::BackoffScheduled)
            .with_source("feed")
            .with_delay(Duration::from_secs(10))
            .with_attempt(2);

        assert_eq!(ev.kind, EventKind::BackoffScheduled);
        assert_eq!(ev.source.as_deref(), Some("feed"));
        assert_eq!(ev.delay_ms, Some(10_000));
        assert_eq!(ev.attempt, Some(2));
        assert!(ev.reason.is_none());
    }

    #[test]
    fn test_sequence_is_monotonic() {
        let a = Event::new(EventKind::FetchStarted);
        let b = Event::new(EventKind::FetchStarted);
        assert!(b.seq > a.seq);
    }
}
