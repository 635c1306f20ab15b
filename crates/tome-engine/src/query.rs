use std::sync::Arc;

use tracing::instrument;

use tome_core::api::ChatRequest;
use tome_core::backend::Backend;
use tome_core::errors::ClientError;
use tome_core::report::StatusSink;
use tome_core::transcript::{ChatTranscript, EntryMeta, TranscriptEntry};

use crate::record;
use crate::session::SessionManager;

/// Dispatches a single chat query scoped to the current session (or
/// unscoped) and folds the response, or its failure, into the
/// transcript. The transcript is the error channel here: a failed query
/// becomes a bot entry carrying the diagnostic, not a side-channel report.
pub struct QueryDispatcher {
    sessions: Arc<SessionManager>,
    backend: Arc<dyn Backend>,
    transcript: Arc<ChatTranscript>,
    sink: Arc<dyn StatusSink>,
}

impl QueryDispatcher {
    pub fn new(
        sessions: Arc<SessionManager>,
        backend: Arc<dyn Backend>,
        transcript: Arc<ChatTranscript>,
        sink: Arc<dyn StatusSink>,
    ) -> Self {
        Self {
            sessions,
            backend,
            transcript,
            sink,
        }
    }

    /// Ask a question. Empty or whitespace-only text is ignored. The user
    /// entry is echoed before the round trip starts; an absent session is
    /// the legal "answer without document grounding" mode, never forced
    /// into creation here.
    #[instrument(skip(self, text))]
    pub async fn ask(&self, text: &str, top_k: u32, use_global: bool) {
        let query = text.trim();
        if query.is_empty() {
            tracing::debug!("ignoring empty query");
            return;
        }

        record(
            &self.transcript,
            self.sink.as_ref(),
            TranscriptEntry::user(query),
        );

        let request = ChatRequest {
            query: query.to_owned(),
            session_id: self.sessions.current(),
            top_k,
            use_global,
        };

        let entry = match self.backend.chat(&request).await {
            Ok(answer) => {
                tracing::info!(
                    mode = answer.mode.as_ref().map(|m| m.as_str()).unwrap_or("-"),
                    sources = answer.sources.len(),
                    "answer received"
                );
                TranscriptEntry::bot_with_meta(
                    answer.answer,
                    EntryMeta {
                        mode: answer.mode,
                        sources: answer.sources,
                    },
                )
            }
            Err(e) => self.failure_entry(e),
        };
        record(&self.transcript, self.sink.as_ref(), entry);
    }

    fn failure_entry(&self, e: ClientError) -> TranscriptEntry {
        tracing::warn!(kind = e.error_kind(), error = %e, "chat request failed");
        TranscriptEntry::bot(e.diagnostic())
    }
}
