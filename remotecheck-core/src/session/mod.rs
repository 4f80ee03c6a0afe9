//! Session layer: one live connection per session, sequential operations
//!
//! [`RemoteSession`] pairs a [`crate::transport::Transport`] with retry
//! policy and lifecycle bookkeeping. See [`retry`] for the connection
//! retry policy.

mod remote;
pub mod retry;

pub use remote::{CommandResult, RemoteSession, SessionState};
pub use retry::{
    ConnectRetryConfig, DEFAULT_CONNECT_ATTEMPTS, DEFAULT_CONNECT_DELAY_MS, RetryState,
};
