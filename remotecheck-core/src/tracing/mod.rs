//! Structured logging setup for harness runs
//!
//! The library itself only emits `tracing` events (retry waits, poll
//! attempts, teardown failures); this module gives embedding harnesses a
//! one-call subscriber setup honoring `RUST_LOG`.

use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag indicating whether tracing has been initialized
static TRACING_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Errors that can occur during tracing initialization
#[derive(Debug, Error)]
pub enum TracingError {
    /// Failed to install the subscriber
    #[error("failed to initialize tracing: {0}")]
    InitializationFailed(String),

    /// Tracing already initialized
    #[error("tracing has already been initialized")]
    AlreadyInitialized,
}

/// Result type for tracing operations
pub type TracingResult<T> = Result<T, TracingError>;

/// Log level for the default filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TracingLevel {
    /// Only errors
    Error,
    /// Errors and warnings
    Warn,
    /// Errors, warnings, and info (default)
    #[default]
    Info,
    /// All above plus debug messages
    Debug,
    /// All messages including trace
    Trace,
}

impl TracingLevel {
    /// Converts to the tracing crate's `Level`
    #[must_use]
    pub const fn to_tracing_level(self) -> Level {
        match self {
            Self::Error => Level::ERROR,
            Self::Warn => Level::WARN,
            Self::Info => Level::INFO,
            Self::Debug => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }
}

impl std::str::FromStr for TracingLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(()),
        }
    }
}

/// Initializes a stderr subscriber with the given default level
///
/// `RUST_LOG` overrides the default when set. Safe to call from exactly one
/// place in the embedding harness.
///
/// # Errors
/// Returns [`TracingError::AlreadyInitialized`] on a second call, and
/// [`TracingError::InitializationFailed`] when a subscriber is already
/// installed by other means.
pub fn init_tracing(level: TracingLevel) -> TracingResult<()> {
    if TRACING_INITIALIZED.swap(true, Ordering::SeqCst) {
        return Err(TracingError::AlreadyInitialized);
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| TracingError::InitializationFailed(e.to_string()))
}
