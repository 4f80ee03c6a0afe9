//! End-to-end flow: mutate remote state over a session, then poll a
//! lagging backend until the mutation is observed

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use remotecheck_core::poll::{ConditionPoller, PollConfig};
use remotecheck_core::session::{ConnectRetryConfig, RemoteSession};
use remotecheck_core::transport::{Credential, Endpoint};

use super::support::ScriptedTransport;

/// Backend that starts reporting an alert only after a few queries, the
/// way an eventually-consistent monitoring server trails the agent
struct LaggingBackend {
    queries: AtomicU32,
    visible_after: u32,
}

impl LaggingBackend {
    fn alerts(&self) -> Result<Vec<String>, String> {
        let n = self.queries.fetch_add(1, Ordering::SeqCst) + 1;
        if n >= self.visible_after {
            Ok(vec!["mysql service stopped".to_string()])
        } else {
            Ok(Vec::new())
        }
    }
}

#[tokio::test]
async fn command_then_poll_until_backend_reflects_it() {
    let transport = ScriptedTransport::new();
    let mut session = RemoteSession::open(
        transport.clone(),
        Endpoint::new("db01.example.net", 22),
        Credential::new("tester", "hunter2"),
        ConnectRetryConfig::no_retry(),
    )
    .await
    .unwrap();

    // Cause: stop the service on the remote host.
    let result = session.execute("service mysql stop").await.unwrap();
    assert!(result.is_success());

    // Effect: the backend reports the alert only on the third query.
    let backend = Arc::new(LaggingBackend {
        queries: AtomicU32::new(0),
        visible_after: 3,
    });

    let poller = ConditionPoller::new(PollConfig::new().with_max_attempts(5).with_interval_ms(0));
    let backend_ref = Arc::clone(&backend);
    let outcome = poller
        .poll_until(
            move || {
                let backend = Arc::clone(&backend_ref);
                async move { backend.alerts() }
            },
            |alerts: &Vec<String>| !alerts.is_empty(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.value, vec!["mysql service stopped".to_string()]);
    assert_eq!(outcome.attempts_made(), 3);
    assert_eq!(backend.queries.load(Ordering::SeqCst), 3);

    session.close().await.unwrap();
    assert_eq!(transport.live_handles(), 0);
}
