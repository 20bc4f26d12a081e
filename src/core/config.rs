//! # Subscription configuration.
//!
//! Provides [`Config`], the settings one poll loop (or merge) runs with.
//!
//! ## Sentinel values
//! - `max_pending = 0` and `updates_capacity = 0` are clamped to 1; prefer the
//!   `*_clamped` accessors over reading the raw fields.

use crate::policies::RetryPolicy;

/// Settings for a subscription or merge.
///
/// ## Field semantics
/// - `max_pending`: bound on the pending queue. Once the queue is full, no new
///   fetch is started until the consumer drains at least one item; this is
///   the engine's only flow-control mechanism.
/// - `updates_capacity`: buffer of the delivery channel between the loop and
///   the consumer. The default of 1 keeps the loop at most one item ahead of
///   the consumer.
/// - `retry`: delay policy applied after a failed fetch, in place of the
///   capability's scheduling hint.
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum number of admitted, not-yet-delivered items held per source.
    pub max_pending: usize,

    /// Capacity of the delivery channel towards the consumer.
    pub updates_capacity: usize,

    /// Retry delay policy for failed fetches.
    pub retry: RetryPolicy,
}

impl Config {
    /// Returns the pending-queue bound, clamped to a minimum of 1.
    #[inline]
    pub fn max_pending_clamped(&self) -> usize {
        self.max_pending.max(1)
    }

    /// Returns the delivery-channel capacity, clamped to a minimum of 1.
    #[inline]
    pub fn updates_capacity_clamped(&self) -> usize {
        self.updates_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `max_pending = 10`
    /// - `updates_capacity = 1`
    /// - `retry = RetryPolicy::default()` (fixed 10 second delay)
    fn default() -> Self {
        Self {
            max_pending: 10,
            updates_capacity: 1,
            retry: RetryPolicy::default(),
        }
    }
}
