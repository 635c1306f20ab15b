use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::instrument;

use tome_core::backend::Backend;
use tome_core::errors::ClientError;
use tome_core::ids::SessionId;
use tome_core::report::{StatusKind, StatusSink};

/// Outcome slot for the creation attempt the guard protects. Callers
/// queued behind an in-flight attempt read it instead of re-triggering.
#[derive(Default)]
struct LastAttempt {
    error: Option<ClientError>,
}

/// Sole owner of the active session id. Lifecycle is
/// `Empty → Creating → Active → Empty`; `Creating` exists while the
/// creation guard is held across the network call. Everyone else reads the
/// id through [`current`](Self::current) at call time.
pub struct SessionManager {
    backend: Arc<dyn Backend>,
    sink: Arc<dyn StatusSink>,
    current: RwLock<Option<SessionId>>,
    // Held across the creation request so at most one is ever in flight.
    creating: Mutex<LastAttempt>,
    // Bumped when an attempt concludes; lets a queued caller tell "an
    // attempt finished while I waited" from "nothing was in flight".
    attempts: AtomicU64,
}

impl SessionManager {
    pub fn new(backend: Arc<dyn Backend>, sink: Arc<dyn StatusSink>) -> Self {
        Self {
            backend,
            sink,
            current: RwLock::new(None),
            creating: Mutex::new(LastAttempt::default()),
            attempts: AtomicU64::new(0),
        }
    }

    /// Synchronous, non-blocking read of the active session id.
    pub fn current(&self) -> Option<SessionId> {
        self.current.read().clone()
    }

    pub fn is_active(&self) -> bool {
        self.current.read().is_some()
    }

    /// Return the active session id, creating one if absent. Idempotent
    /// when active: no network call. Concurrent callers share a single
    /// creation request and observe the same id or the same failure; a
    /// fresh request takes a fresh user action.
    #[instrument(skip(self))]
    pub async fn ensure(&self) -> Result<SessionId, ClientError> {
        if let Some(id) = self.current() {
            return Ok(id);
        }

        let entered_at = self.attempts.load(Ordering::Acquire);
        let mut attempt = self.creating.lock().await;

        // A caller queued behind an in-flight creation lands here after the
        // winner resolved: reuse its id, or surface its failure.
        if let Some(id) = self.current() {
            return Ok(id);
        }
        if self.attempts.load(Ordering::Acquire) != entered_at {
            if let Some(e) = attempt.error.clone() {
                return Err(e);
            }
        }

        self.sink.status(StatusKind::Loading, "creating session");
        let result = self.backend.create_session().await;
        self.attempts.fetch_add(1, Ordering::AcqRel);
        match result {
            Ok(id) => {
                attempt.error = None;
                *self.current.write() = Some(id.clone());
                tracing::info!(session_id = %id, "session created");
                self.sink
                    .status(StatusKind::Success, &format!("session created: {id}"));
                Ok(id)
            }
            Err(e) => {
                attempt.error = Some(e.clone());
                tracing::warn!(kind = e.error_kind(), error = %e, "session creation failed");
                self.sink
                    .status(StatusKind::Error, &format!("failed to create session: {e}"));
                Err(e)
            }
        }
    }

    /// Delete the active session. With none active this is a reported
    /// notice and zero network calls. The id is cleared only on confirmed
    /// success; on failure the session stays active and the error is
    /// reported.
    #[instrument(skip(self))]
    pub async fn delete(&self) -> Result<(), ClientError> {
        let Some(id) = self.current() else {
            self.sink.status(StatusKind::Info, "no session to delete");
            return Ok(());
        };

        match self.backend.delete_session(&id).await {
            Ok(()) => {
                *self.current.write() = None;
                tracing::info!(session_id = %id, "session deleted");
                self.sink
                    .status(StatusKind::Success, &format!("session deleted: {id}"));
                Ok(())
            }
            Err(e) => {
                tracing::warn!(session_id = %id, kind = e.error_kind(), error = %e, "session deletion failed");
                self.sink
                    .status(StatusKind::Error, &format!("failed to delete session {id}: {e}"));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tome_client::MockBackend;
    use tome_core::report::RecordingSink;

    fn manager_with(mock: MockBackend) -> (SessionManager, Arc<MockBackend>, Arc<RecordingSink>) {
        let mock = Arc::new(mock);
        let sink = Arc::new(RecordingSink::new());
        let mgr = SessionManager::new(mock.clone(), sink.clone());
        (mgr, mock, sink)
    }

    #[tokio::test]
    async fn ensure_creates_then_reuses() {
        let (mgr, mock, _sink) = manager_with(MockBackend::new().with_session("s-1"));

        assert!(mgr.current().is_none());
        let first = mgr.ensure().await.unwrap();
        let second = mgr.ensure().await.unwrap();

        assert_eq!(first.as_str(), "s-1");
        assert_eq!(first, second);
        assert_eq!(mock.create_calls(), 1);
        assert_eq!(mgr.current(), Some(first));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_ensure_issues_one_request() {
        let (mgr, mock, _sink) = manager_with(
            MockBackend::new()
                .with_session("s-1")
                .with_create_delay(Duration::from_millis(200)),
        );

        let (a, b) = tokio::join!(mgr.ensure(), mgr.ensure());

        assert_eq!(a.unwrap().as_str(), "s-1");
        assert_eq!(b.unwrap().as_str(), "s-1");
        assert_eq!(mock.create_calls(), 1, "late caller must not re-trigger creation");
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_ensure_shares_the_failure() {
        let (mgr, mock, sink) = manager_with(
            MockBackend::new()
                .with_create_error(ClientError::NetworkUnreachable("refused".into()))
                .with_create_delay(Duration::from_millis(200)),
        );

        let (a, b) = tokio::join!(mgr.ensure(), mgr.ensure());

        assert!(a.is_err());
        assert!(b.is_err());
        assert_eq!(mock.create_calls(), 1, "queued caller shares the failure, not a retry");

        let error_reports = sink
            .statuses()
            .into_iter()
            .filter(|(k, _)| *k == StatusKind::Error)
            .count();
        assert_eq!(error_reports, 1, "the shared failure is reported once");
    }

    #[tokio::test]
    async fn failed_creation_returns_to_empty() {
        let (mgr, mock, sink) = manager_with(
            MockBackend::new()
                .with_create_error(ClientError::NetworkUnreachable("refused".into()))
                .with_session("s-2"),
        );

        assert!(mgr.ensure().await.is_err());
        assert!(mgr.current().is_none());
        assert!(sink.saw(StatusKind::Error, "failed to create session"));

        // A fresh user action starts a fresh request.
        let id = mgr.ensure().await.unwrap();
        assert_eq!(id.as_str(), "s-2");
        assert_eq!(mock.create_calls(), 2);
    }

    #[tokio::test]
    async fn delete_without_session_is_a_reported_noop() {
        let (mgr, mock, sink) = manager_with(MockBackend::new());

        mgr.delete().await.unwrap();

        assert!(sink.saw(StatusKind::Info, "no session to delete"));
        assert!(mock.deleted_sessions().is_empty());
        assert_eq!(mock.create_calls(), 0);
    }

    #[tokio::test]
    async fn delete_clears_only_on_confirmed_success() {
        let (mgr, mock, sink) = manager_with(
            MockBackend::new()
                .with_session("s-1")
                .with_delete_error(ClientError::from_status(500, "cannot remove".into())),
        );
        mgr.ensure().await.unwrap();

        assert!(mgr.delete().await.is_err());
        assert!(mgr.is_active(), "failed deletion must leave the session active");
        assert!(sink.saw(StatusKind::Error, "failed to delete"));

        // Second attempt (mock defaults to success) clears the id.
        mgr.delete().await.unwrap();
        assert!(mgr.current().is_none());
        assert_eq!(mock.deleted_sessions().len(), 2);
    }
}
