//! Session lifecycle and command execution tests against a scripted
//! transport

use remotecheck_core::session::{ConnectRetryConfig, RemoteSession, SessionState};
use remotecheck_core::transport::{Credential, Endpoint};
use remotecheck_core::SessionError;
use std::path::Path;

use super::support::ScriptedTransport;

fn endpoint() -> Endpoint {
    Endpoint::new("db01.example.net", 22)
}

fn credential() -> Credential {
    Credential::new("tester", "hunter2")
}

fn fast_retry(max_attempts: u32) -> ConnectRetryConfig {
    ConnectRetryConfig::new()
        .with_max_attempts(max_attempts)
        .with_delay_ms(0)
}

async fn open_session(transport: &ScriptedTransport) -> RemoteSession<ScriptedTransport> {
    RemoteSession::open(transport.clone(), endpoint(), credential(), fast_retry(6))
        .await
        .expect("scripted connect should succeed")
}

#[tokio::test]
async fn open_succeeds_when_transport_accepts_on_last_attempt() {
    let transport = ScriptedTransport::new();
    transport.fail_connects_transient(5);

    let session = open_session(&transport).await;

    assert_eq!(session.state(), SessionState::Connected);
    assert_eq!(transport.connect_attempts(), 6);
    assert_eq!(transport.live_handles(), 1);
}

#[tokio::test]
async fn open_fails_after_retry_budget_with_no_leaked_handle() {
    let transport = ScriptedTransport::new();
    transport.fail_connects_transient(7);

    let err = RemoteSession::open(transport.clone(), endpoint(), credential(), fast_retry(6))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        SessionError::Connection {
            host: "db01.example.net".into(),
            port: 22,
            attempts: 6,
            message: "resource busy".into(),
        }
    );
    assert_eq!(transport.connect_attempts(), 6);
    assert_eq!(transport.live_handles(), 0);
}

#[tokio::test]
async fn fatal_connect_failure_does_not_consume_retries() {
    let transport = ScriptedTransport::new();
    transport.fail_connect_fatal("bad port");

    let err = RemoteSession::open(transport.clone(), endpoint(), credential(), fast_retry(6))
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::Connection { attempts: 1, .. }));
    assert_eq!(transport.connect_attempts(), 1);
}

#[tokio::test]
async fn execute_echo_round_trip() {
    let transport = ScriptedTransport::new();
    let mut session = open_session(&transport).await;

    let result = session.execute("echo propagation-marker").await.unwrap();

    assert_eq!(result.status, 0);
    assert_eq!(result.output, "propagation-marker");
    assert_eq!(result.command, "echo propagation-marker");
    assert!(result.is_success());
}

#[tokio::test]
async fn execute_on_disconnected_session_is_a_noop() {
    let transport = ScriptedTransport::new();
    let mut session = open_session(&transport).await;
    session.close().await.unwrap();

    let result = session.execute("rm -f /tmp/marker").await.unwrap();

    assert!(result.is_success());
    assert_eq!(result.output, "");
    // The transport never saw the command.
    assert!(transport.executed().is_empty());
}

#[tokio::test]
async fn nonzero_status_surfaces_as_execution_error() {
    let transport = ScriptedTransport::new();
    transport.respond("service mysql status", 3, "mysql is stopped");
    let mut session = open_session(&transport).await;

    let err = session.execute("service mysql status").await.unwrap_err();

    assert_eq!(
        err,
        SessionError::Execution {
            command: "service mysql status".into(),
            status: 3,
            output: "mysql is stopped".into(),
        }
    );
}

#[tokio::test]
async fn transport_drop_surfaces_as_transport_error() {
    let transport = ScriptedTransport::new();
    transport.fail_command("cat /var/log/mysqld.log", "connection reset by peer");
    let mut session = open_session(&transport).await;

    let err = session.execute("cat /var/log/mysqld.log").await.unwrap_err();

    assert!(matches!(err, SessionError::Transport { .. }));
    assert!(err.to_string().contains("connection reset by peer"));
}

#[tokio::test]
async fn execute_checked_matches_case_insensitively() {
    let transport = ScriptedTransport::new();
    let mut session = open_session(&transport).await;

    for variant in ["FOO", "foo", "Foo"] {
        transport.respond("cat /tmp/state", 0, variant);
        session.execute_checked("cat /tmp/state", "foo").await.unwrap();
    }

    transport.respond("cat /tmp/state", 0, "bar");
    let err = session
        .execute_checked("cat /tmp/state", "foo")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        SessionError::Verification {
            command: "cat /tmp/state".into(),
            expected: "foo".into(),
            actual: "bar".into(),
        }
    );
}

#[tokio::test]
async fn close_is_idempotent_and_releases_once() {
    let transport = ScriptedTransport::new();
    let mut session = open_session(&transport).await;

    session.close().await.unwrap();
    session.close().await.unwrap();

    assert_eq!(session.state(), SessionState::Disconnected);
    assert_eq!(transport.disconnects(), 1);
    assert_eq!(transport.live_handles(), 0);
}

#[tokio::test]
async fn failed_teardown_still_clears_the_handle() {
    let transport = ScriptedTransport::new();
    transport.set_disconnect_status(1);
    let mut session = open_session(&transport).await;

    let err = session.close().await.unwrap_err();

    assert_eq!(
        err,
        SessionError::Disconnect {
            host: "db01.example.net".into(),
            status: 1,
        }
    );
    assert!(!session.is_connected());
    // A second close is a clean no-op; no double release.
    session.close().await.unwrap();
    assert_eq!(transport.disconnects(), 1);
}

#[tokio::test]
async fn file_copies_require_an_open_connection() {
    let transport = ScriptedTransport::new();
    let mut session = open_session(&transport).await;

    session
        .copy_to_remote(Path::new("fixtures/module.sh"), Path::new("/tmp/module.sh"))
        .await
        .unwrap();
    assert_eq!(transport.copies().len(), 1);

    session.close().await.unwrap();
    let err = session
        .copy_to_local(Path::new("/var/log/mysqld.log"), Path::new("out.log"))
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Transport { .. }));
    assert!(err.to_string().contains("not connected"));
}
