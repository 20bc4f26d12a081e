//! # Function-backed fetcher implementation.
//!
//! [`FetcherFn`] wraps a closure `Fnc: FnMut() -> Fut`. The closure is
//! protected by a [`Mutex`] so `fetch(&self)` can be called repeatedly even
//! though the closure is `FnMut`; the lock is held only while the future is
//! created, never across its execution.
//!
//! This is the injection point that replaces any global fake-data generator:
//! a stateful fake (counters, scripted failures) lives in the closure's
//! captured state, explicitly constructed and owned by whoever built it.

use std::{borrow::Cow, future::Future, sync::Mutex};

use async_trait::async_trait;

use crate::error::FetchError;
use crate::feed::fetcher::{Batch, Fetcher, FetcherRef};

/// Function-backed fetch capability.
///
/// Use [`FetcherFn::arc`] for a one-liner that returns a [`FetcherRef`].
///
/// # Example
/// ```
/// use std::time::Duration;
/// use feedvisor::{Batch, FetcherFn, FetcherRef, Item};
///
/// let mut n = 0u32;
/// let f: FetcherRef = FetcherFn::arc("demo", move || {
///     n += 1;
///     let item = Item::new(format!("Item {n}"), "demo", format!("guid-{n}"));
///     async move { Ok(Batch::after(vec![item], Duration::from_secs(2))) }
/// });
///
/// assert_eq!(f.source(), "demo");
/// ```
#[derive(Debug)]
pub struct FetcherFn<Fnc, Fut>
where
    Fnc: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Batch, FetchError>> + Send + 'static,
{
    /// Stable source label.
    source: Cow<'static, str>,
    /// Underlying function (guarded by a mutex to allow `FnMut` with `&self`).
    func: Mutex<Fnc>,
}

impl<Fnc, Fut> FetcherFn<Fnc, Fut>
where
    Fnc: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Batch, FetchError>> + Send + 'static,
{
    /// Creates a new function-backed fetcher.
    ///
    /// Prefer [`FetcherFn::arc`] when you immediately need a [`FetcherRef`].
    pub fn new(source: impl Into<Cow<'static, str>>, func: Fnc) -> Self {
        Self {
            source: source.into(),
            func: Mutex::new(func),
        }
    }

    /// Creates the fetcher and returns it as a shared handle (`Arc<dyn Fetcher>`).
    pub fn arc(source: impl Into<Cow<'static, str>>, func: Fnc) -> FetcherRef {
        std::sync::Arc::new(Self::new(source, func))
    }
}

#[async_trait]
impl<Fnc, Fut> Fetcher for FetcherFn<Fnc, Fut>
where
    Fnc: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Batch, FetchError>> + Send + 'static,
{
    fn source(&self) -> &str {
        &self.source
    }

    async fn fetch(&self) -> Result<Batch, FetchError> {
        let fut = {
            let mut f = self
                .func
                .lock()
                .map_err(|_| FetchError::failed("fetcher mutex poisoned"))?;
            (f)()
        };
        fut.await
    }
}
