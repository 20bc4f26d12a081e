//! # Retry policy for failed fetches.
//!
//! [`RetryPolicy`] maps a consecutive-failure streak to the delay imposed
//! before the next poll attempt. The delay for streak `n` is
//! `base × factor^n`, clamped to `cap`, with [`Jitter`] applied last. Because
//! the delay is derived purely from the streak, jitter output never feeds
//! back into later calculations.
//!
//! The streak resets to zero on any successful fetch, so with the default
//! `factor = 1.0` the policy degenerates to the classic fixed backoff.

use std::time::Duration;

use crate::policies::jitter::Jitter;

/// Retry delay policy.
///
/// - [`RetryPolicy::base`] - delay after the first failure;
/// - [`RetryPolicy::factor`] - multiplicative growth per consecutive failure;
/// - [`RetryPolicy::cap`] - maximum delay;
/// - [`RetryPolicy::jitter`] - randomization applied to the clamped delay.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// Delay after the first failure.
    pub base: Duration,
    /// Multiplicative growth factor (`>= 1.0` recommended).
    pub factor: f64,
    /// Maximum delay cap.
    pub cap: Duration,
    /// Jitter applied to the clamped delay.
    pub jitter: Jitter,
}

impl Default for RetryPolicy {
    /// Returns a fixed 10 second delay: `factor = 1.0`, `cap = 60s`, no jitter.
    fn default() -> Self {
        Self {
            base: Duration::from_secs(10),
            factor: 1.0,
            cap: Duration::from_secs(60),
            jitter: Jitter::None,
        }
    }
}

impl RetryPolicy {
    /// Creates a fixed-delay policy with no growth and no jitter.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            base: delay,
            factor: 1.0,
            cap: delay,
            jitter: Jitter::None,
        }
    }

    /// Computes the delay for the given consecutive-failure streak (0-indexed).
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use feedvisor::{Jitter, RetryPolicy};
    ///
    /// let policy = RetryPolicy {
    ///     base: Duration::from_secs(1),
    ///     factor: 2.0,
    ///     cap: Duration::from_secs(5),
    ///     jitter: Jitter::None,
    /// };
    ///
    /// assert_eq!(policy.next(0), Duration::from_secs(1));
    /// assert_eq!(policy.next(2), Duration::from_secs(4));
    /// assert_eq!(policy.next(10), Duration::from_secs(5));
    /// ```
    pub fn next(&self, streak: u32) -> Duration {
        let cap_secs = self.cap.as_secs_f64();
        let exp = streak.min(i32::MAX as u32) as i32;
        let raw = self.base.as_secs_f64() * self.factor.powi(exp);

        let clamped = if !raw.is_finite() || raw < 0.0 || raw > cap_secs {
            self.cap
        } else {
            Duration::from_secs_f64(raw)
        };

        self.jitter.apply(clamped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_fixed_ten_seconds() {
        let policy = RetryPolicy::default();
        for streak in 0..8 {
            assert_eq!(policy.next(streak), Duration::from_secs(10));
        }
    }

    #[test]
    fn test_factor_grows_delay_per_failure() {
        let policy = RetryPolicy {
            base: Duration::from_millis(100),
            factor: 2.0,
            cap: Duration::from_secs(30),
            jitter: Jitter::None,
        };

        assert_eq!(policy.next(0), Duration::from_millis(100));
        assert_eq!(policy.next(1), Duration::from_millis(200));
        assert_eq!(policy.next(3), Duration::from_millis(800));
    }

    #[test]
    fn test_delay_clamps_to_cap() {
        let policy = RetryPolicy {
            base: Duration::from_secs(1),
            factor: 2.0,
            cap: Duration::from_secs(8),
            jitter: Jitter::None,
        };

        assert_eq!(policy.next(30), Duration::from_secs(8));
        assert_eq!(policy.next(u32::MAX), Duration::from_secs(8));
    }

    #[test]
    fn test_base_above_cap_clamps_to_cap() {
        let policy = RetryPolicy {
            base: Duration::from_secs(20),
            factor: 1.0,
            cap: Duration::from_secs(5),
            jitter: Jitter::None,
        };

        assert_eq!(policy.next(0), Duration::from_secs(5));
    }

    #[test]
    fn test_full_jitter_never_exceeds_clamped_delay() {
        let policy = RetryPolicy {
            base: Duration::from_secs(1),
            factor: 1.0,
            cap: Duration::from_secs(1),
            jitter: Jitter::Full,
        };

        for _ in 0..100 {
            assert!(policy.next(0) <= Duration::from_secs(1));
        }
    }

    #[test]
    fn test_equal_jitter_stays_in_upper_half() {
        let policy = RetryPolicy {
            base: Duration::from_secs(2),
            factor: 1.0,
            cap: Duration::from_secs(2),
            jitter: Jitter::Equal,
        };

        for _ in 0..100 {
            let delay = policy.next(0);
            assert!(delay >= Duration::from_secs(1));
            assert!(delay <= Duration::from_secs(2));
        }
    }
}
