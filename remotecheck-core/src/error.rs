//! Shared error taxonomy for session and polling operations
//!
//! Each failure category gets its own named variant so callers can log a
//! terminal error verbatim and know what went wrong without re-running the
//! scenario. Nothing in this crate swallows an error silently.

use thiserror::Error;

/// Errors raised by [`crate::session::RemoteSession`] operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Connection establishment failed after the retry budget was exhausted
    #[error("failed to connect to {host}:{port} after {attempts} attempts: {message}")]
    Connection {
        /// Remote host the session tried to reach
        host: String,
        /// Remote port
        port: u16,
        /// Total connection attempts made, including the first
        attempts: u32,
        /// Description of the last underlying connect failure
        message: String,
    },

    /// The transport failed mid-operation (e.g. connection dropped while a
    /// command was in flight)
    #[error("transport failure while running '{command}': {message}")]
    Transport {
        /// Command that was in flight when the transport failed
        command: String,
        /// Underlying cause
        message: String,
    },

    /// The remote command completed but returned a non-zero status
    #[error("command '{command}' returned status {status}: {output}")]
    Execution {
        /// Command that was executed
        command: String,
        /// Non-zero exit status reported by the remote host
        status: i32,
        /// Output captured alongside the failing status
        output: String,
    },

    /// Captured output did not match the expected value
    #[error("unexpected output from '{command}': expected '{expected}', actual '{actual}'")]
    Verification {
        /// Command whose output was checked
        command: String,
        /// Expected output
        expected: String,
        /// Output actually captured
        actual: String,
    },

    /// Connection teardown reported a non-zero status; the handle is still
    /// released from the session
    #[error("failed to disconnect from {host}: teardown status {status}")]
    Disconnect {
        /// Host the session was connected to
        host: String,
        /// Non-zero status reported by the transport on disconnect
        status: i32,
    },
}

/// Result type alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors raised by [`crate::poll::ConditionPoller`] operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PollError {
    /// The condition was never satisfied within the attempt budget
    #[error("condition not satisfied after {attempts} attempts; last observed: {}",
        .last_observed.as_deref().unwrap_or("no result observed"))]
    Timeout {
        /// Number of query invocations made
        attempts: u32,
        /// Last value the query produced, if any attempt returned one
        last_observed: Option<String>,
    },

    /// A single-shot query call failed
    #[error("query failed: {message}")]
    Query {
        /// Description of the query failure
        message: String,
    },
}

/// Result type alias for polling operations
pub type PollResult<T> = Result<T, PollError>;
