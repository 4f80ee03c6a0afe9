//! `remotecheck` Core Library
//!
//! Remote command execution and eventual-consistency verification core for
//! end-to-end test harnesses. A harness opens a [`session::RemoteSession`]
//! against a remote Unix host, runs commands that mutate remote state, then
//! hands a query closure to a [`poll::ConditionPoller`] to wait until the
//! monitoring backend reflects the mutation, and finally closes the
//! session.
//!
//! # Crate Structure
//!
//! - [`transport`] - The transport capability boundary and the SSH
//!   subprocess implementation
//! - [`session`] - Session lifecycle, connection retry, command execution
//! - [`poll`] - Bounded-retry condition polling
//! - [`error`] - Shared error taxonomy and result aliases
//! - [`tracing`] - Structured logging setup helpers

// Enable missing_docs warning for public API documentation
#![warn(missing_docs)]

pub mod error;
pub mod poll;
pub mod session;
pub mod tracing;
pub mod transport;

pub use error::{PollError, PollResult, SessionError, SessionResult};
pub use poll::{ConditionPoller, PollAttempt, PollConfig, PollOutcome};
pub use session::{CommandResult, ConnectRetryConfig, RemoteSession, SessionState};
pub use transport::{
    ConnectError, Credential, Endpoint, ExecOutput, SshTransport, Transport, TransportFailure,
};
