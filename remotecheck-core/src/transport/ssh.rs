//! Process-backed SSH transport
//!
//! Runs commands on remote hosts via `ssh` (or `sshpass -e ssh` for
//! password-authenticated connections) and transfers files via `scp`. Each
//! operation spawns a fresh client process; the handle carries the resolved
//! destination and credentials rather than a persistent channel.

use std::path::Path;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tokio::process::Command;

use super::{ConnectError, Credential, Endpoint, ExecOutput, Transport, TransportFailure};

/// Default timeout for remote commands (seconds)
const DEFAULT_EXEC_TIMEOUT_SECS: u64 = 60;

/// Connect-probe timeout passed to the ssh client (seconds)
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Stderr fragments that mark a connect failure as retryable
const TRANSIENT_MARKERS: &[&str] = &[
    "connection refused",
    "connection reset",
    "connection timed out",
    "timed out",
    "temporarily unavailable",
    "resource busy",
];

/// Live handle for an SSH-backed session
///
/// No persistent channel is held; the handle is the resolved set of
/// parameters every subsequent process invocation reuses.
#[derive(Debug)]
pub struct SshHandle {
    destination: String,
    port: u16,
    password: Option<SecretString>,
}

/// [`Transport`] implementation shelling out to OpenSSH client tools
#[derive(Debug, Clone)]
pub struct SshTransport {
    exec_timeout: Duration,
    use_sshpass: bool,
}

impl SshTransport {
    /// Creates a transport with the default command timeout
    ///
    /// Checks `sshpass` availability once here; without it, password
    /// authentication falls back to whatever keys the ambient ssh agent
    /// offers.
    #[must_use]
    pub fn new() -> Self {
        let use_sshpass = std::process::Command::new("sshpass")
            .arg("-V")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .is_ok();
        Self {
            exec_timeout: Duration::from_secs(DEFAULT_EXEC_TIMEOUT_SECS),
            use_sshpass,
        }
    }

    /// Sets the per-command timeout
    #[must_use]
    pub const fn with_exec_timeout(mut self, timeout: Duration) -> Self {
        self.exec_timeout = timeout;
        self
    }

    /// Builds the ssh invocation for one command against a handle
    fn ssh_command(&self, handle: &SshHandle, command: &str) -> Command {
        let mut cmd;
        if self.use_sshpass && handle.password.is_some() {
            cmd = Command::new("sshpass");
            cmd.arg("-e").arg("ssh");
            if let Some(ref pw) = handle.password {
                cmd.env("SSHPASS", pw.expose_secret());
            }
        } else {
            cmd = Command::new("ssh");
            cmd.arg("-o").arg("BatchMode=yes");
        }

        cmd.arg("-o").arg("StrictHostKeyChecking=no");
        cmd.arg("-o")
            .arg(format!("ConnectTimeout={CONNECT_TIMEOUT_SECS}"));
        if handle.port != 22 {
            cmd.arg("-p").arg(handle.port.to_string());
        }
        cmd.arg(&handle.destination);
        cmd.arg(command);
        cmd.stdout(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::piped());
        cmd
    }

    /// Builds the scp invocation for a file copy
    fn scp_command(&self, handle: &SshHandle, source: &str, dest: &str) -> Command {
        let mut cmd;
        if self.use_sshpass && handle.password.is_some() {
            cmd = Command::new("sshpass");
            cmd.arg("-e").arg("scp");
            if let Some(ref pw) = handle.password {
                cmd.env("SSHPASS", pw.expose_secret());
            }
        } else {
            cmd = Command::new("scp");
            cmd.arg("-o").arg("BatchMode=yes");
        }

        cmd.arg("-o").arg("StrictHostKeyChecking=no");
        if handle.port != 22 {
            cmd.arg("-P").arg(handle.port.to_string());
        }
        cmd.arg(source);
        cmd.arg(dest);
        cmd.stdout(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::piped());
        cmd
    }

    /// Runs a prepared client process under the transport timeout
    async fn run(&self, mut cmd: Command, what: &str) -> Result<std::process::Output, TransportFailure> {
        match tokio::time::timeout(self.exec_timeout, cmd.output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(TransportFailure::new(format!(
                "failed to spawn {what} process: {e}"
            ))),
            Err(_) => Err(TransportFailure::new(format!(
                "{what} timed out after {}s",
                self.exec_timeout.as_secs()
            ))),
        }
    }
}

impl Default for SshTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Classifies a connect-probe failure from the client's stderr
fn classify_connect_failure(stderr: &str) -> ConnectError {
    let lower = stderr.to_lowercase();
    if TRANSIENT_MARKERS.iter().any(|m| lower.contains(m)) {
        ConnectError::Transient(stderr.trim().to_string())
    } else {
        ConnectError::Fatal(stderr.trim().to_string())
    }
}

#[async_trait::async_trait]
impl Transport for SshTransport {
    type Handle = SshHandle;

    async fn connect(
        &self,
        endpoint: &Endpoint,
        credential: &Credential,
    ) -> Result<Self::Handle, ConnectError> {
        if endpoint.host.is_empty() {
            return Err(ConnectError::Fatal("empty host".into()));
        }
        if endpoint.port == 0 {
            return Err(ConnectError::Fatal("port must be non-zero".into()));
        }
        if credential.username.is_empty() {
            return Err(ConnectError::Fatal("empty username".into()));
        }

        let handle = SshHandle {
            destination: format!("{}@{}", credential.username, endpoint.host),
            port: endpoint.port,
            password: Some(credential.password.clone()),
        };

        // Probe the connection with a no-op command; the ssh client exits
        // 255 on any connection or authentication failure.
        let probe = self.ssh_command(&handle, "exit 0");
        let output = self
            .run(probe, "ssh connect probe")
            .await
            .map_err(|e| ConnectError::Transient(e.message))?;

        if output.status.success() {
            Ok(handle)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(classify_connect_failure(&stderr))
        }
    }

    async fn exec(
        &self,
        handle: &mut Self::Handle,
        command: &str,
    ) -> Result<ExecOutput, TransportFailure> {
        let cmd = self.ssh_command(handle, command);
        let output = self.run(cmd, "ssh").await?;

        let status = output.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&output.stdout)
            .trim_end()
            .to_string();

        // Exit 255 with no remote output is the client reporting its own
        // connection failure, not the remote command's status.
        if status == 255 && stdout.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TransportFailure::new(format!(
                "ssh client failed: {}",
                stderr.trim()
            )));
        }

        Ok(ExecOutput {
            status,
            output: stdout,
        })
    }

    async fn disconnect(&self, handle: Self::Handle) -> Result<i32, TransportFailure> {
        // Nothing persistent to tear down; dropping the handle zeroizes the
        // credential copy.
        drop(handle);
        Ok(0)
    }

    async fn copy_to_local(
        &self,
        handle: &mut Self::Handle,
        remote_path: &Path,
        local_path: &Path,
    ) -> Result<(), TransportFailure> {
        let source = format!("{}:{}", handle.destination, remote_path.display());
        let cmd = self.scp_command(handle, &source, &local_path.display().to_string());
        let output = self.run(cmd, "scp").await?;
        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(TransportFailure::new(format!(
                "scp to local failed (exit {}): {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )))
        }
    }

    async fn copy_to_remote(
        &self,
        handle: &mut Self::Handle,
        local_path: &Path,
        remote_path: &Path,
    ) -> Result<(), TransportFailure> {
        let dest = format!("{}:{}", handle.destination, remote_path.display());
        let cmd = self.scp_command(handle, &local_path.display().to_string(), &dest);
        let output = self.run(cmd, "scp").await?;
        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(TransportFailure::new(format!(
                "scp to remote failed (exit {}): {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )))
        }
    }
}
