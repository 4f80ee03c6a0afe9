//! Connection retry policy
//!
//! Connection establishment is the only operation the session layer
//! retries. A remote agent can hold an exclusive resource for a short
//! window after a previous session's teardown, so transient connect
//! failures are tolerated for a bounded number of fixed-interval attempts
//! and no longer.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default total number of connection attempts
pub const DEFAULT_CONNECT_ATTEMPTS: u32 = 6;

/// Default wait between connection attempts in milliseconds
pub const DEFAULT_CONNECT_DELAY_MS: u64 = 10_000;

/// Configuration for connection retry behavior
///
/// Unlike backoff-based schemes, the wait is a fixed interval: the failure
/// being tolerated is a resource-release window, not load, so there is
/// nothing to back off from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectRetryConfig {
    /// Total connection attempts, including the first (minimum 1)
    pub max_attempts: u32,
    /// Wait between attempts in milliseconds
    pub delay_ms: u64,
}

impl Default for ConnectRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_CONNECT_ATTEMPTS,
            delay_ms: DEFAULT_CONNECT_DELAY_MS,
        }
    }
}

impl ConnectRetryConfig {
    /// Creates a retry configuration with the documented defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration that makes a single attempt with no retry
    #[must_use]
    pub const fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            delay_ms: 0,
        }
    }

    /// Sets the total number of attempts
    #[must_use]
    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets the wait between attempts
    #[must_use]
    pub const fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Returns the wait between attempts as a [`Duration`]
    #[must_use]
    pub const fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Returns the effective attempt bound (never below 1)
    #[must_use]
    pub const fn effective_attempts(&self) -> u32 {
        if self.max_attempts == 0 {
            1
        } else {
            self.max_attempts
        }
    }
}

/// Attempt tracker for one connection establishment
#[derive(Debug, Clone)]
pub struct RetryState {
    attempts_made: u32,
    config: ConnectRetryConfig,
    last_error: Option<String>,
}

impl RetryState {
    /// Creates a tracker for the given configuration
    #[must_use]
    pub fn new(config: ConnectRetryConfig) -> Self {
        Self {
            attempts_made: 0,
            config,
            last_error: None,
        }
    }

    /// Returns the number of attempts made so far
    #[must_use]
    pub const fn attempts_made(&self) -> u32 {
        self.attempts_made
    }

    /// Returns the 1-based number of the attempt about to run
    #[must_use]
    pub const fn next_attempt(&self) -> u32 {
        self.attempts_made + 1
    }

    /// Records a failed attempt; returns true if another attempt remains
    pub fn record_failure(&mut self, error: impl Into<String>) -> bool {
        self.last_error = Some(error.into());
        self.attempts_made += 1;
        self.attempts_made < self.config.effective_attempts()
    }

    /// Returns the wait to apply before the next attempt
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.config.delay()
    }

    /// Returns the last recorded failure, if any
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
