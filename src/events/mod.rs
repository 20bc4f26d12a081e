//! Engine events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by poll loops and merges.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//! - [`Subscriber`] trait for consuming events off a bus
//!
//! Publishing is fire-and-forget: a bus with no subscribers drops events
//! silently, so the engine pays next to nothing when observability is not
//! wired up.

mod bus;
mod event;
mod subscriber;

#[cfg(feature = "logging")]
mod log;

pub use bus::Bus;
pub use event::{Event, EventKind};
pub use subscriber::Subscriber;

#[cfg(feature = "logging")]
pub use log::LogWriter;
