//! Property tests for the connection retry policy

use proptest::prelude::*;
use remotecheck_core::session::{ConnectRetryConfig, RetryState};
use std::time::Duration;

proptest! {
    /// Property: builder pattern preserves all configuration values
    #[test]
    fn config_builder_preserves_values(
        max_attempts in 0u32..100,
        delay_ms in 0u64..100_000,
    ) {
        let config = ConnectRetryConfig::new()
            .with_max_attempts(max_attempts)
            .with_delay_ms(delay_ms);

        prop_assert_eq!(config.max_attempts, max_attempts);
        prop_assert_eq!(config.delay_ms, delay_ms);
        prop_assert_eq!(config.delay(), Duration::from_millis(delay_ms));
    }

    /// Property: at least one attempt is always made
    #[test]
    fn effective_attempts_never_below_one(max_attempts in 0u32..100) {
        let config = ConnectRetryConfig::new().with_max_attempts(max_attempts);
        prop_assert!(config.effective_attempts() >= 1);
        prop_assert_eq!(config.effective_attempts(), max_attempts.max(1));
    }

    /// Property: the tracker exhausts after exactly the configured number
    /// of recorded failures
    #[test]
    fn state_exhausts_exactly_at_bound(
        max_attempts in 1u32..20,
        delay_ms in 0u64..1000,
    ) {
        let config = ConnectRetryConfig::new()
            .with_max_attempts(max_attempts)
            .with_delay_ms(delay_ms);
        let mut state = RetryState::new(config);

        for n in 1..=max_attempts {
            let retrying = state.record_failure("busy");
            prop_assert_eq!(retrying, n < max_attempts);
            prop_assert_eq!(state.attempts_made(), n);
        }
        prop_assert_eq!(state.last_error(), Some("busy"));
    }

    /// Property: serde round-trip preserves the configuration
    #[test]
    fn config_serde_round_trip(
        max_attempts in 0u32..100,
        delay_ms in 0u64..100_000,
    ) {
        let config = ConnectRetryConfig::new()
            .with_max_attempts(max_attempts)
            .with_delay_ms(delay_ms);
        let json = serde_json::to_string(&config).unwrap();
        let back: ConnectRetryConfig = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, config);
    }
}
