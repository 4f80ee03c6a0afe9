//! Transport capability boundary for remote sessions
//!
//! A [`Transport`] turns connection parameters into an opaque handle and
//! runs commands over it. The concrete protocol (how a remote shell is
//! invoked, what the handle holds) is the implementation's business; the
//! session layer only relies on this contract. The crate ships one
//! implementation, [`SshTransport`], which shells out to the OpenSSH
//! client tools.

mod ssh;

pub use ssh::{SshHandle, SshTransport};

use async_trait::async_trait;
use secrecy::SecretString;
use std::path::Path;
use thiserror::Error;

/// Remote host address and port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Hostname or IP address
    pub host: String,
    /// TCP port
    pub port: u16,
}

impl Endpoint {
    /// Creates an endpoint from host and port
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Username/password credential for a remote host
///
/// The password is held as a [`SecretString`] so it is zeroized on drop and
/// never shows up in `Debug` output or logs.
#[derive(Debug, Clone)]
pub struct Credential {
    /// Login username
    pub username: String,
    /// Login password
    pub password: SecretString,
}

impl Credential {
    /// Creates a credential from username and password
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Status and captured output of one remote command invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    /// Exit status reported by the remote host (0 = success)
    pub status: i32,
    /// Captured output text
    pub output: String,
}

/// Connection establishment failure, classified for retry purposes
///
/// Transient failures are worth retrying: the typical case is a remote
/// agent still holding an exclusive resource for a short window after a
/// previous session's teardown. Fatal failures (bad parameters, rejected
/// credentials) fail the attempt immediately.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectError {
    /// Retryable low-level connect failure
    #[error("transient connect failure: {0}")]
    Transient(String),
    /// Non-retryable failure; retrying cannot help
    #[error("fatal connect failure: {0}")]
    Fatal(String),
}

impl ConnectError {
    /// Returns true if the failure is worth retrying
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Returns the failure description
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Transient(msg) | Self::Fatal(msg) => msg,
        }
    }
}

/// Mid-operation transport failure (connection dropped, process spawn
/// failure, timeout)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportFailure {
    /// Underlying cause
    pub message: String,
}

impl TransportFailure {
    /// Creates a failure from a cause description
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Capability contract consumed by [`crate::session::RemoteSession`]
///
/// Implementations must not keep state outside the handle: the session owns
/// the handle exclusively and drives all operations sequentially.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Opaque connection handle owned by the session
    type Handle: Send;

    /// Establishes a connection, returning a live handle
    ///
    /// # Errors
    /// Returns [`ConnectError::Transient`] for retryable failures and
    /// [`ConnectError::Fatal`] for failures that retrying cannot fix.
    async fn connect(
        &self,
        endpoint: &Endpoint,
        credential: &Credential,
    ) -> Result<Self::Handle, ConnectError>;

    /// Runs a command on the open connection, blocking until a status code
    /// and output are available
    ///
    /// # Errors
    /// Returns [`TransportFailure`] if the transport itself fails
    /// mid-command; a non-zero remote status is not a transport failure and
    /// is reported through [`ExecOutput::status`].
    async fn exec(
        &self,
        handle: &mut Self::Handle,
        command: &str,
    ) -> Result<ExecOutput, TransportFailure>;

    /// Tears down the connection, consuming the handle
    ///
    /// Returns the teardown status (0 = clean).
    ///
    /// # Errors
    /// Returns [`TransportFailure`] if teardown could not be performed at
    /// all.
    async fn disconnect(&self, handle: Self::Handle) -> Result<i32, TransportFailure>;

    /// Copies a remote file to the local machine
    ///
    /// # Errors
    /// Returns [`TransportFailure`] if the copy fails.
    async fn copy_to_local(
        &self,
        handle: &mut Self::Handle,
        remote_path: &Path,
        local_path: &Path,
    ) -> Result<(), TransportFailure>;

    /// Copies a local file to the remote machine
    ///
    /// # Errors
    /// Returns [`TransportFailure`] if the copy fails.
    async fn copy_to_remote(
        &self,
        handle: &mut Self::Handle,
        local_path: &Path,
        remote_path: &Path,
    ) -> Result<(), TransportFailure>;
}
