//! # Feed data model and fetch capability.
//!
//! This module provides the types that flow through subscriptions:
//! - [`Item`] - a single feed entry, identified by its GUID
//! - [`Batch`] - the success payload of one fetch call
//! - [`Fetcher`] - trait for implementing async fetch capabilities
//! - [`FetcherFn`] - function-backed fetcher implementation
//! - [`FetcherRef`] - shared reference to a fetcher (`Arc<dyn Fetcher>`)

mod fetch_fn;
mod fetcher;
mod item;

pub use fetch_fn::FetcherFn;
pub use fetcher::{Batch, Fetcher, FetcherRef};
pub use item::Item;
