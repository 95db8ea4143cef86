//! Retry policy with exponential backoff

use std::collections::BTreeSet;
use std::time::Duration;

use rand::Rng;

use crate::api_error::DEFAULT_RETRYABLE_STATUS_CODES;

/// Configuration for retrying failed requests
///
/// Read-only once handed to a [`Transport`](crate::Transport).
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first attempt (total attempts = `max_retries + 1`)
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_backoff: Duration,
    /// Upper bound for any computed delay
    pub max_backoff: Duration,
    /// Growth factor per retry (e.g., 2.0 doubles the delay each time)
    pub backoff_multiplier: f64,
    /// Scale each delay by a random factor in `[0.5, 1.0]`
    pub jitter: bool,
    /// HTTP statuses that are worth another attempt
    pub retryable_status_codes: BTreeSet<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: true,
            retryable_status_codes: DEFAULT_RETRYABLE_STATUS_CODES.into_iter().collect(),
        }
    }
}

impl RetryConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of retries
    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    /// Set the first retry delay
    pub fn with_initial_backoff(mut self, delay: Duration) -> Self {
        self.initial_backoff = delay;
        self
    }

    /// Set the delay cap
    pub fn with_max_backoff(mut self, delay: Duration) -> Self {
        self.max_backoff = delay;
        self
    }

    /// Set backoff multiplier
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Enable or disable jitter
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Replace the set of retryable statuses
    pub fn with_retryable_status_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.retryable_status_codes = codes.into_iter().collect();
        self
    }

    /// Single attempt, no retries
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Check if a status is in the retryable set
    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retryable_status_codes.contains(&status)
    }

    /// Check if another attempt is allowed after `attempt` (0-indexed) failed
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// Delay before retry number `attempt` (0-indexed: 0 precedes the second attempt)
    ///
    /// `min(initial * multiplier^attempt, max)`, then scaled into `[0.5, 1.0]`
    /// of that value when jitter is on.
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let base = self.initial_backoff.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        let capped = base.min(self.max_backoff.as_secs_f64()).max(0.0);

        let secs = if self.jitter {
            capped * rand::thread_rng().gen_range(0.5..=1.0)
        } else {
            capped
        };

        Duration::try_from_secs_f64(secs)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}
