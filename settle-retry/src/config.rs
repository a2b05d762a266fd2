//! Retry configuration.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for one retry call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Human-readable label used in logs and error messages.
    pub description: String,
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Wait strategy between attempts.
    #[serde(default)]
    pub wait: WaitStrategy,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            description: String::from("operation"),
            max_retries: 3,
            wait: WaitStrategy::default(),
        }
    }
}

impl RetryConfig {
    /// Create a config labelled `description` with the default retry count and wait.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    /// A config that makes exactly one attempt.
    pub fn no_retry(description: impl Into<String>) -> Self {
        Self::new(description).max_retries(0)
    }

    /// Allow `retries` retries after the first attempt.
    pub fn max_retries(self, retries: u32) -> Self {
        Self {
            max_retries: retries,
            ..self
        }
    }

    /// Wait between attempts according to `wait`.
    pub fn wait(self, wait: WaitStrategy) -> Self {
        Self { wait, ..self }
    }

    /// Sleep `delay` between every pair of attempts.
    pub fn fixed(self, delay: Duration) -> Self {
        self.wait(WaitStrategy::Fixed(delay))
    }

    /// Double the wait after each retry, starting at `initial` and capped at `max`.
    pub fn exponential(self, initial: Duration, max: Duration) -> Self {
        self.wait(WaitStrategy::ExponentialBackoff {
            initial,
            max,
            multiplier: 2.0,
        })
    }

    /// Total number of attempts this config allows.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Strategy for waiting between attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WaitStrategy {
    /// No waiting.
    None,
    /// Fixed delay.
    Fixed(Duration),
    /// Exponential backoff.
    ExponentialBackoff {
        /// Initial delay.
        initial: Duration,
        /// Maximum delay.
        max: Duration,
        /// Multiplier for each retry.
        multiplier: f64,
    },
    /// Exponential backoff with jitter.
    ExponentialJitter {
        /// Initial delay.
        initial: Duration,
        /// Maximum delay.
        max: Duration,
        /// Multiplier for each retry.
        multiplier: f64,
        /// Jitter factor (0.0 to 1.0).
        jitter: f64,
    },
    /// Linear backoff.
    Linear {
        /// Initial delay.
        initial: Duration,
        /// Increment per retry.
        increment: Duration,
        /// Maximum delay.
        max: Duration,
    },
}

impl Default for WaitStrategy {
    fn default() -> Self {
        WaitStrategy::Fixed(Duration::from_secs(1))
    }
}

impl WaitStrategy {
    /// Calculate the delay before the given retry (1-indexed).
    pub fn calculate(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(i32::MAX as u32) as i32;
        match self {
            WaitStrategy::None => Duration::ZERO,
            WaitStrategy::Fixed(d) => *d,
            WaitStrategy::ExponentialBackoff {
                initial,
                max,
                multiplier,
            } => {
                capped(initial.as_secs_f64() * multiplier.powi(exponent), *max)
            }
            WaitStrategy::ExponentialJitter {
                initial,
                max,
                multiplier,
                jitter,
            } => {
                let base = initial.as_secs_f64() * multiplier.powi(exponent);
                capped(base + base * jitter * random_jitter(), *max)
            }
            WaitStrategy::Linear {
                initial,
                increment,
                max,
            } => {
                let steps = retry.saturating_sub(1);
                initial.saturating_add(increment.saturating_mul(steps)).min(*max)
            }
        }
    }
}

/// Convert computed seconds to a delay no longer than `max`.
///
/// Values that do not fit a `Duration` (overflow, infinity, NaN) clamp to `max`.
fn capped(seconds: f64, max: Duration) -> Duration {
    Duration::try_from_secs_f64(seconds.max(0.0)).map_or(max, |delay| delay.min(max))
}

/// Generate a random jitter factor between -1.0 and 1.0.
fn random_jitter() -> f64 {
    let mut rng = rand::thread_rng();
    rng.gen_range(-1.0..1.0)
}
