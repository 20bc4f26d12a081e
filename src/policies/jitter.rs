//! # Jitter for retry delays.
//!
//! [`Jitter`] randomizes retry delays so many subscriptions that failed at
//! the same moment do not all poll again at the same moment.
//!
//! - [`Jitter::None`] - predictable, exact delays
//! - [`Jitter::Full`] - random delay in `[0, delay]`
//! - [`Jitter::Equal`] - `delay/2 + random[0, delay/2]`

use std::time::Duration;

use rand::Rng;

/// Randomization strategy for retry delays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Jitter {
    /// No jitter: use the exact delay.
    #[default]
    None,

    /// Random delay in `[0, delay]`. Maximum load spreading, can shrink the
    /// wait significantly.
    Full,

    /// `delay/2 + random[0, delay/2]`. Keeps at least half of the delay while
    /// still spreading retries.
    Equal,
}

impl Jitter {
    /// Applies this jitter to the given delay.
    pub fn apply(&self, delay: Duration) -> Duration {
        let ms = delay.as_millis() as u64;
        if ms == 0 {
            return Duration::ZERO;
        }

        match self {
            Jitter::None => delay,
            Jitter::Full => Duration::from_millis(rand::rng().random_range(0..=ms)),
            Jitter::Equal => {
                let half = ms / 2;
                let spread = if half == 0 {
                    0
                } else {
                    rand::rng().random_range(0..=half)
                };
                Duration::from_millis(half + spread)
            }
        }
    }
}
