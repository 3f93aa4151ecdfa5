//! Bounded backoff for idempotent engine checks.
//!
//! Only point checks are retried; tuple writes and deletes go out exactly
//! once to avoid duplicate side effects.

use std::time::Duration;

/// Backoff strategy between retry attempts.
#[derive(Debug, Clone, PartialEq)]
pub enum BackoffStrategy {
    /// No delay between retries.
    None,
    /// Constant delay.
    Constant {
        /// Delay in milliseconds.
        delay_ms: u64,
    },
    /// Exponential backoff.
    Exponential {
        /// Initial delay in milliseconds.
        initial_ms: u64,
        /// Multiplier per attempt.
        multiplier: f64,
        /// Maximum delay in milliseconds.
        max_ms: u64,
    },
}

impl BackoffStrategy {
    /// Delay before retrying a given attempt (0-indexed).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> u64 {
        match self {
            Self::None => 0,
            Self::Constant { delay_ms } => *delay_ms,
            Self::Exponential {
                initial_ms,
                multiplier,
                max_ms,
            } => {
                // Precision loss is acceptable for timing.
                #[allow(clippy::cast_precision_loss, clippy::cast_possible_wrap)]
                let delay = (*initial_ms as f64) * multiplier.powi(attempt as i32);
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let delay_ms = delay as u64;
                delay_ms.min(*max_ms)
            }
        }
    }
}

/// Retry policy applied to engine point checks.
#[derive(Debug, Clone)]
pub struct CheckRetry {
    /// Maximum number of attempts (1 = no retry).
    pub max_attempts: u32,
    /// Backoff between attempts.
    pub backoff: BackoffStrategy,
}

impl Default for CheckRetry {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: BackoffStrategy::Exponential {
                initial_ms: 50,
                multiplier: 2.0,
                max_ms: 500,
            },
        }
    }
}

impl CheckRetry {
    /// Policy that never retries.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: BackoffStrategy::None,
        }
    }

    /// Sleep for the backoff delay of the given attempt, if any.
    pub async fn wait(&self, attempt: u32) {
        let delay = self.backoff.delay_for_attempt(attempt);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }
}
