//! # Retry policy for a failing capture source.
//!
//! A [`RetryPolicy`] decides how long the capture task waits after a transient
//! source error and when to give up and declare a
//! [`ProducerFault`](crate::ProducerFault).
//!
//! The delay for failure `n` (1-based) is `first × factor^(n-1)`, clamped to
//! `max`, then jittered. The base is derived from the failure count alone, so
//! jitter never feeds back into later delays.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use logtap::{Jitter, RetryPolicy};
//!
//! let retry = RetryPolicy {
//!     first: Duration::from_millis(50),
//!     max: Duration::from_secs(1),
//!     factor: 2.0,
//!     jitter: Jitter::None,
//!     max_retries: 3,
//! };
//!
//! assert_eq!(retry.delay(1), Duration::from_millis(50));
//! assert_eq!(retry.delay(2), Duration::from_millis(100));
//! assert!(retry.allows(3));
//! assert!(!retry.allows(4));
//! ```

use std::time::Duration;

use rand::Rng;

/// Randomization applied to retry delays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Jitter {
    /// Exact delay.
    #[default]
    None,
    /// Uniform in `[0, delay]`.
    Full,
    /// `delay/2 + uniform[0, delay/2]`.
    Equal,
}

impl Jitter {
    /// Applies this jitter to `delay`.
    pub fn apply(self, delay: Duration) -> Duration {
        let ms = delay.as_millis().min(u128::from(u64::MAX)) as u64;
        if ms == 0 {
            return delay;
        }
        let mut rng = rand::rng();
        match self {
            Jitter::None => delay,
            Jitter::Full => Duration::from_millis(rng.random_range(0..=ms)),
            Jitter::Equal => {
                let half = ms / 2;
                Duration::from_millis(half + rng.random_range(0..=ms - half))
            }
        }
    }
}

/// How the capture task retries transient source errors.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// Delay after the first failure.
    pub first: Duration,
    /// Upper bound for any delay.
    pub max: Duration,
    /// Growth factor between consecutive failures.
    pub factor: f64,
    /// Randomization of each delay.
    pub jitter: Jitter,
    /// Consecutive failures tolerated before the source is declared faulty
    /// (`0` = fail on the first error).
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    /// `first = 100ms`, `factor = 2.0`, `max = 5s`, `jitter = Equal`, `max_retries = 5`.
    fn default() -> Self {
        Self {
            first: Duration::from_millis(100),
            max: Duration::from_secs(5),
            factor: 2.0,
            jitter: Jitter::Equal,
            max_retries: 5,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries.
    pub fn never() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Returns `true` if failure number `failures` (1-based) may still be retried.
    #[inline]
    pub fn allows(&self, failures: u32) -> bool {
        failures <= self.max_retries
    }

    /// Delay to wait after failure number `failures` (1-based).
    pub fn delay(&self, failures: u32) -> Duration {
        let exp = failures.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);
        let base = if !secs.is_finite() || secs < 0.0 || secs > self.max.as_secs_f64() {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        };
        self.jitter.apply(base)
    }
}
