//! Orchestration core: session lifecycle, sequential upload pipeline, and
//! query dispatch. All state lives behind `SessionManager`; everything else
//! reads it at call time and reports through the `StatusSink` seam.

pub mod query;
pub mod session;
pub mod upload;

use std::sync::Arc;

use tome_core::api::{UploadCandidate, UploadReport};
use tome_core::backend::Backend;
use tome_core::errors::ClientError;
use tome_core::ids::SessionId;
use tome_core::report::{StatusKind, StatusSink};
use tome_core::transcript::{ChatTranscript, TranscriptEntry};

pub use query::QueryDispatcher;
pub use session::SessionManager;
pub use upload::UploadPipeline;

/// Append an entry and forward it to the surface, as one step. The
/// transcript stays the source of truth; the sink only mirrors it.
pub(crate) fn record(
    transcript: &ChatTranscript,
    sink: &dyn StatusSink,
    entry: TranscriptEntry,
) {
    sink.entry(&entry);
    transcript.append(entry);
}

/// Command surface over the orchestration components. A UI adapter
/// translates user gestures into these calls; every outcome is delivered
/// through the transcript and the status sink, so the adapter never
/// inspects return values except to log.
pub struct Engine {
    pub sessions: Arc<SessionManager>,
    pub uploads: UploadPipeline,
    pub queries: QueryDispatcher,
    pub transcript: Arc<ChatTranscript>,
    backend: Arc<dyn Backend>,
    sink: Arc<dyn StatusSink>,
}

impl Engine {
    pub fn new(backend: Arc<dyn Backend>, sink: Arc<dyn StatusSink>) -> Self {
        let transcript = Arc::new(ChatTranscript::new());
        let sessions = Arc::new(SessionManager::new(backend.clone(), sink.clone()));
        let uploads = UploadPipeline::new(
            sessions.clone(),
            backend.clone(),
            transcript.clone(),
            sink.clone(),
        );
        let queries = QueryDispatcher::new(
            sessions.clone(),
            backend.clone(),
            transcript.clone(),
            sink.clone(),
        );
        Self {
            sessions,
            uploads,
            queries,
            transcript,
            backend,
            sink,
        }
    }

    /// Explicit new-session intent. Idempotent: an already-active session
    /// is reported, not replaced.
    pub async fn new_session(&self) -> Result<SessionId, ClientError> {
        if let Some(id) = self.sessions.current() {
            self.sink
                .status(StatusKind::Info, &format!("session already active: {id}"));
            return Ok(id);
        }
        self.sessions.ensure().await
    }

    pub async fn delete_session(&self) -> Result<(), ClientError> {
        self.sessions.delete().await
    }

    pub async fn upload(&self, candidates: Vec<UploadCandidate>) -> Result<UploadReport, ClientError> {
        self.uploads.submit(candidates).await
    }

    pub async fn ask(&self, text: &str, top_k: u32, use_global: bool) {
        self.queries.ask(text, top_k, use_global).await;
    }

    /// Probe the backend and report the result. Returns whether it answered.
    pub async fn health(&self) -> bool {
        match self.backend.health().await {
            Ok(()) => {
                self.sink.status(StatusKind::Success, "health: ok");
                true
            }
            Err(e) => {
                self.sink
                    .status(StatusKind::Error, &format!("health: down ({e})"));
                false
            }
        }
    }
}
