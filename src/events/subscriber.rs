//! Subscriber trait for consuming engine events.

use async_trait::async_trait;

use crate::events::Event;

/// # Consumer of engine events.
///
/// Implementations are attached to a [`Bus`](crate::Bus) via
/// [`Bus::attach`](crate::Bus::attach) and receive every published event in
/// order. Handlers should return quickly; a slow subscriber that falls more
/// than the bus capacity behind skips the events it missed.
#[async_trait]
pub trait Subscriber: Send + Sync + 'static {
    /// Returns a stable name used when reporting subscriber failures.
    fn name(&self) -> &'static str {
        "subscriber"
    }

    /// Processes one event.
    async fn handle(&self, event: &Event);
}
