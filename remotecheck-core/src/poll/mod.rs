//! Bounded-retry polling against an eventually-consistent backend
//!
//! A state change made on a remote host can take an unbounded but
//! typically short time to show up in the monitoring backend. The poller
//! bounds worst-case latency with a fixed cadence and a hard attempt
//! ceiling: query, check, wait, repeat, never indefinitely.
//!
//! The query is a caller-supplied async closure and its observations are
//! opaque here; only the caller's predicate decides satisfaction.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{PollError, PollResult};

/// Default maximum number of poll attempts
pub const DEFAULT_POLL_ATTEMPTS: u32 = 10;

/// Default wait between poll attempts in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 30_000;

/// Configuration for a bounded poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Maximum query invocations (minimum 1)
    pub max_attempts: u32,
    /// Wait between attempts in milliseconds; attempt 1 never waits
    pub interval_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_POLL_ATTEMPTS,
            interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl PollConfig {
    /// Creates a configuration with the documented defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of attempts
    #[must_use]
    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets the wait between attempts
    #[must_use]
    pub const fn with_interval_ms(mut self, interval_ms: u64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    /// Returns the wait between attempts as a [`Duration`]
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
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

/// Record of one poll attempt
///
/// Attempts within a poll invocation are strictly sequential, never
/// concurrent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollAttempt {
    /// 1-based attempt index
    pub index: u32,
    /// Wait applied before this attempt ran (zero for attempt 1)
    pub waited: Duration,
    /// Debug rendering of the observed value, or the query error text;
    /// `None` only when the query produced neither
    pub observation: Option<String>,
    /// Whether the predicate accepted this attempt's observation
    pub satisfied: bool,
}

/// Successful poll result: the satisfying value plus the attempt log
#[derive(Debug, Clone)]
pub struct PollOutcome<T> {
    /// The first observation the predicate accepted
    pub value: T,
    /// Every attempt made, the satisfying one last
    pub attempts: Vec<PollAttempt>,
}

impl<T> PollOutcome<T> {
    /// Returns the number of query invocations that were made
    #[must_use]
    pub fn attempts_made(&self) -> u32 {
        u32::try_from(self.attempts.len()).unwrap_or(u32::MAX)
    }
}

/// Bounded-retry poller
///
/// Holds no resource between calls; a single instance can drive any number
/// of sequential polls.
#[derive(Debug, Clone, Default)]
pub struct ConditionPoller {
    config: PollConfig,
}

impl ConditionPoller {
    /// Creates a poller with the given configuration
    #[must_use]
    pub const fn new(config: PollConfig) -> Self {
        Self { config }
    }

    /// Creates a poller with the default configuration
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(PollConfig::default())
    }

    /// Returns the poller's configuration
    #[must_use]
    pub const fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Repeatedly queries until the predicate is satisfied or the attempt
    /// budget is exhausted
    ///
    /// Attempt 1 queries immediately; each further attempt waits the
    /// configured interval first. A query-level error does not abort the
    /// poll — it is logged and consumes one attempt. Exactly
    /// `max_attempts` query invocations are made on the failure path.
    ///
    /// # Errors
    /// Returns [`PollError::Timeout`] naming the last observed value (or
    /// that no result was observed) when the budget is exhausted.
    pub async fn poll_until<T, E, Q, Fut, P>(
        &self,
        mut query: Q,
        is_satisfied: P,
    ) -> PollResult<PollOutcome<T>>
    where
        T: std::fmt::Debug,
        E: std::fmt::Display,
        Q: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&T) -> bool,
    {
        let max_attempts = self.config.effective_attempts();
        let interval = self.config.interval();
        let mut attempts = Vec::with_capacity(max_attempts as usize);
        let mut last_observed: Option<String> = None;

        for index in 1..=max_attempts {
            let waited = if index == 1 {
                Duration::ZERO
            } else {
                tokio::time::sleep(interval).await;
                interval
            };

            match query().await {
                Ok(value) => {
                    let observation = format!("{value:?}");
                    let satisfied = is_satisfied(&value);
                    attempts.push(PollAttempt {
                        index,
                        waited,
                        observation: Some(observation.clone()),
                        satisfied,
                    });
                    if satisfied {
                        tracing::debug!(attempt = index, max_attempts, "condition satisfied");
                        return Ok(PollOutcome { value, attempts });
                    }
                    tracing::debug!(
                        attempt = index,
                        max_attempts,
                        observed = %observation,
                        "condition not yet satisfied"
                    );
                    last_observed = Some(observation);
                }
                Err(err) => {
                    // A failing query consumes the attempt but never aborts
                    // the poll.
                    tracing::debug!(
                        attempt = index,
                        max_attempts,
                        error = %err,
                        "query failed, counting attempt"
                    );
                    attempts.push(PollAttempt {
                        index,
                        waited,
                        observation: Some(err.to_string()),
                        satisfied: false,
                    });
                }
            }
        }

        tracing::warn!(
            attempts = max_attempts,
            last_observed = last_observed.as_deref().unwrap_or("no result observed"),
            "poll budget exhausted"
        );
        Err(PollError::Timeout {
            attempts: max_attempts,
            last_observed,
        })
    }

    /// Waits a fixed delay, then checks the condition exactly once
    ///
    /// For callers that already know the expected propagation time and do
    /// not want repeated polling. There is no retry: a query error or an
    /// unsatisfying observation fails immediately.
    ///
    /// # Errors
    /// Returns [`PollError::Query`] when the single query call fails, and
    /// [`PollError::Timeout`] (with one attempt) when the observation does
    /// not satisfy the predicate.
    pub async fn check_after_delay<T, E, Q, Fut, P>(
        &self,
        query: Q,
        is_satisfied: P,
        delay: Duration,
    ) -> PollResult<T>
    where
        T: std::fmt::Debug,
        E: std::fmt::Display,
        Q: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&T) -> bool,
    {
        tokio::time::sleep(delay).await;

        let value = query().await.map_err(|e| PollError::Query {
            message: e.to_string(),
        })?;

        if is_satisfied(&value) {
            Ok(value)
        } else {
            Err(PollError::Timeout {
                attempts: 1,
                last_observed: Some(format!("{value:?}")),
            })
        }
    }
}
