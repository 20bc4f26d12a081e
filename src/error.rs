//! Error types surfaced by subscriptions and merges.
//!
//! A fetch failure never terminates a subscription: the poll loop records it
//! as the *sticky last error*, schedules a retry after a backoff delay, and
//! keeps going. The recorded value is surfaced exactly once, as the return
//! value of `close` on the owning [`Subscription`](crate::Subscription).

use thiserror::Error;

/// # Errors produced by fetch attempts.
///
/// Every variant is transient by policy: the subscription retries after a
/// backoff delay and only remembers the most recent failure. Which failure
/// that is can be inspected after shutdown, not before.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum FetchError {
    /// The fetch capability reported a failure.
    #[error("fetch failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The fetch task stopped before depositing a result (e.g. it panicked).
    #[error("fetch aborted before reporting a result")]
    Aborted,
}

impl FetchError {
    /// Wraps a message into [`FetchError::Fail`].
    ///
    /// # Example
    /// ```
    /// use feedvisor::FetchError;
    ///
    /// let err = FetchError::failed("connection refused");
    /// assert_eq!(err.to_string(), "fetch failed: connection refused");
    /// ```
    pub fn failed(error: impl Into<String>) -> Self {
        FetchError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use feedvisor::FetchError;
    ///
    /// assert_eq!(FetchError::failed("boom").as_label(), "fetch_failed");
    /// assert_eq!(FetchError::Aborted.as_label(), "fetch_aborted");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            FetchError::Fail { .. } => "fetch_failed",
            FetchError::Aborted => "fetch_aborted",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            FetchError::Fail { error } => format!("error: {error}"),
            FetchError::Aborted => "aborted before reporting a result".to_string(),
        }
    }
}
