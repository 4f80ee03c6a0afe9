//! Remote session lifecycle and command execution
//!
//! A [`RemoteSession`] owns exactly one live connection handle and drives
//! all operations on it sequentially. Connection establishment is retried
//! per [`ConnectRetryConfig`]; command execution is never retried here —
//! a failed command surfaces immediately and the caller decides.

use std::path::Path;

use crate::error::{SessionError, SessionResult};
use crate::transport::{Credential, Endpoint, Transport};

use super::retry::{ConnectRetryConfig, RetryState};

/// Connection state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No live connection handle
    #[default]
    Disconnected,
    /// Connection established; commands may run
    Connected,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connected => write!(f, "connected"),
        }
    }
}

/// Status and output captured from one executed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// The command that produced this result
    pub command: String,
    /// Exit status (0 = success)
    pub status: i32,
    /// Captured output text
    pub output: String,
}

impl CommandResult {
    /// Creates the empty result returned when executing on a disconnected
    /// session
    #[must_use]
    pub fn empty(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            status: 0,
            output: String::new(),
        }
    }

    /// Returns true if the command exited with status 0
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status == 0
    }
}

/// One live connection to a remote host
///
/// The handle is exclusively owned: no other component can observe or
/// mutate it, and at most one handle exists per session. Sessions targeting
/// different hosts are independent and share no state.
pub struct RemoteSession<T: Transport> {
    transport: T,
    endpoint: Endpoint,
    credential: Credential,
    handle: Option<T::Handle>,
}

impl<T: Transport> RemoteSession<T> {
    /// Establishes a connection and returns a connected session
    ///
    /// Transient connect failures are retried up to `retry.max_attempts`
    /// total attempts with a fixed wait between them; the final failure is
    /// surfaced as [`SessionError::Connection`]. Fatal failures (malformed
    /// parameters, rejected credentials) are surfaced immediately without
    /// consuming the retry budget.
    ///
    /// # Errors
    /// Returns [`SessionError::Connection`] when no attempt succeeds.
    pub async fn open(
        transport: T,
        endpoint: Endpoint,
        credential: Credential,
        retry: ConnectRetryConfig,
    ) -> SessionResult<Self> {
        let mut state = RetryState::new(retry);

        loop {
            tracing::debug!(
                endpoint = %endpoint,
                attempt = state.next_attempt(),
                "attempting connection"
            );
            match transport.connect(&endpoint, &credential).await {
                Ok(handle) => {
                    tracing::debug!(endpoint = %endpoint, "connection established");
                    return Ok(Self {
                        transport,
                        endpoint,
                        credential,
                        handle: Some(handle),
                    });
                }
                Err(err) if err.is_transient() => {
                    let retrying = state.record_failure(err.message());
                    if !retrying {
                        return Err(SessionError::Connection {
                            host: endpoint.host,
                            port: endpoint.port,
                            attempts: state.attempts_made(),
                            message: err.message().to_string(),
                        });
                    }
                    tracing::warn!(
                        endpoint = %endpoint,
                        attempt = state.attempts_made(),
                        error = err.message(),
                        "transient connect failure, waiting before retry"
                    );
                    tokio::time::sleep(state.delay()).await;
                }
                Err(err) => {
                    return Err(SessionError::Connection {
                        host: endpoint.host,
                        port: endpoint.port,
                        attempts: state.next_attempt(),
                        message: err.message().to_string(),
                    });
                }
            }
        }
    }

    /// Returns the session's connection state
    #[must_use]
    pub const fn state(&self) -> SessionState {
        if self.handle.is_some() {
            SessionState::Connected
        } else {
            SessionState::Disconnected
        }
    }

    /// Returns true while a connection handle is live
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    /// Returns the endpoint this session targets
    #[must_use]
    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Returns the username this session authenticated as
    #[must_use]
    pub fn username(&self) -> &str {
        &self.credential.username
    }

    /// Executes a command, capturing status and output
    ///
    /// On a disconnected session this is a no-op returning an empty
    /// successful result; callers needing a guarantee of execution must
    /// check [`Self::is_connected`] first.
    ///
    /// # Errors
    /// Returns [`SessionError::Transport`] if the transport fails
    /// mid-command, or [`SessionError::Execution`] when the remote command
    /// exits non-zero.
    pub async fn execute(&mut self, command: &str) -> SessionResult<CommandResult> {
        let Some(handle) = self.handle.as_mut() else {
            tracing::debug!(command, "execute on disconnected session is a no-op");
            return Ok(CommandResult::empty(command));
        };

        let exec = self
            .transport
            .exec(handle, command)
            .await
            .map_err(|e| SessionError::Transport {
                command: command.to_string(),
                message: e.message,
            })?;

        if exec.status != 0 {
            return Err(SessionError::Execution {
                command: command.to_string(),
                status: exec.status,
                output: exec.output,
            });
        }

        Ok(CommandResult {
            command: command.to_string(),
            status: exec.status,
            output: exec.output,
        })
    }

    /// Executes a command and verifies its output against an expected value
    ///
    /// The comparison is case-insensitive, matching the loose conventions
    /// of remote shell output.
    ///
    /// # Errors
    /// Propagates [`Self::execute`] errors, and returns
    /// [`SessionError::Verification`] when the captured output does not
    /// match `expected`.
    pub async fn execute_checked(
        &mut self,
        command: &str,
        expected: &str,
    ) -> SessionResult<CommandResult> {
        let result = self.execute(command).await?;

        if result.output.eq_ignore_ascii_case(expected) {
            Ok(result)
        } else {
            Err(SessionError::Verification {
                command: command.to_string(),
                expected: expected.to_string(),
                actual: result.output,
            })
        }
    }

    /// Copies a remote file to the local machine
    ///
    /// # Errors
    /// Returns [`SessionError::Transport`] when the session is disconnected
    /// or the transfer fails. Not retried.
    pub async fn copy_to_local(
        &mut self,
        remote_path: &Path,
        local_path: &Path,
    ) -> SessionResult<()> {
        let label = format!("copy {} to local", remote_path.display());
        let Some(handle) = self.handle.as_mut() else {
            return Err(SessionError::Transport {
                command: label,
                message: "session is not connected".into(),
            });
        };
        self.transport
            .copy_to_local(handle, remote_path, local_path)
            .await
            .map_err(|e| SessionError::Transport {
                command: label,
                message: e.message,
            })
    }

    /// Copies a local file to the remote machine
    ///
    /// # Errors
    /// Returns [`SessionError::Transport`] when the session is disconnected
    /// or the transfer fails. Not retried.
    pub async fn copy_to_remote(
        &mut self,
        local_path: &Path,
        remote_path: &Path,
    ) -> SessionResult<()> {
        let label = format!("copy {} to remote", local_path.display());
        let Some(handle) = self.handle.as_mut() else {
            return Err(SessionError::Transport {
                command: label,
                message: "session is not connected".into(),
            });
        };
        self.transport
            .copy_to_remote(handle, local_path, remote_path)
            .await
            .map_err(|e| SessionError::Transport {
                command: label,
                message: e.message,
            })
    }

    /// Releases the connection handle
    ///
    /// The handle is taken out of the session before teardown runs, so it
    /// is released exactly once even when teardown reports a failure.
    /// Closing an already-closed session is a no-op.
    ///
    /// # Errors
    /// Returns [`SessionError::Disconnect`] when teardown reports a
    /// non-zero status, and [`SessionError::Transport`] when teardown could
    /// not run at all; in both cases the session is left disconnected.
    pub async fn close(&mut self) -> SessionResult<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        let status = self
            .transport
            .disconnect(handle)
            .await
            .map_err(|e| SessionError::Transport {
                command: "disconnect".into(),
                message: e.message,
            })?;

        if status == 0 {
            tracing::debug!(endpoint = %self.endpoint, "session closed");
            Ok(())
        } else {
            tracing::warn!(
                endpoint = %self.endpoint,
                status,
                "teardown reported a failure; handle released anyway"
            );
            Err(SessionError::Disconnect {
                host: self.endpoint.host.clone(),
                status,
            })
        }
    }
}

impl<T: Transport> std::fmt::Debug for RemoteSession<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSession")
            .field("endpoint", &self.endpoint)
            .field("username", &self.credential.username)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
