use std::sync::Arc;

use tracing::instrument;

use tome_core::api::{UploadCandidate, UploadOutcome, UploadReport};
use tome_core::backend::Backend;
use tome_core::errors::ClientError;
use tome_core::report::{StatusKind, StatusSink};
use tome_core::transcript::{ChatTranscript, TranscriptEntry};

use crate::record;
use crate::session::SessionManager;

const UNSUPPORTED_TYPE: &str = "unsupported type";

/// Sequences a batch of candidate files into the active session, one file
/// at a time, in input order. One in-flight upload bounds backend load and
/// keeps progress reporting deterministic; a file's failure never aborts
/// its siblings.
pub struct UploadPipeline {
    sessions: Arc<SessionManager>,
    backend: Arc<dyn Backend>,
    transcript: Arc<ChatTranscript>,
    sink: Arc<dyn StatusSink>,
}

impl UploadPipeline {
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

    /// Submit a batch. Returns one outcome per candidate in input order,
    /// or an error if the session the batch needed could not be obtained
    /// (in which case no per-file attempt was made).
    #[instrument(skip(self, candidates), fields(count = candidates.len()))]
    pub async fn submit(
        &self,
        candidates: Vec<UploadCandidate>,
    ) -> Result<UploadReport, ClientError> {
        if candidates.is_empty() {
            self.sink.status(StatusKind::Info, "nothing to upload");
            return Ok(UploadReport::default());
        }

        if let Err(e) = self.sessions.ensure().await {
            self.sink
                .status(StatusKind::Error, &format!("upload aborted: {e}"));
            return Err(ClientError::session_required(e));
        }

        self.sink.status(
            StatusKind::Loading,
            &format!("uploading {} file(s)", candidates.len()),
        );

        let mut outcomes = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            outcomes.push(self.submit_one(candidate).await);
        }

        let report = UploadReport { outcomes };
        self.sink.status(StatusKind::Info, &report.summary());
        Ok(report)
    }

    async fn submit_one(&self, candidate: &UploadCandidate) -> UploadOutcome {
        let name = &candidate.file_name;

        if !candidate.is_pdf() {
            self.sink
                .status(StatusKind::Info, &format!("skipped {name}: {UNSUPPORTED_TYPE}"));
            return UploadOutcome::failed(name, UNSUPPORTED_TYPE);
        }

        // Re-read at call time: a session deleted mid-batch must not
        // receive further uploads.
        let Some(session_id) = self.sessions.current() else {
            self.sink
                .status(StatusKind::Error, &format!("upload failed for {name}: session no longer active"));
            return UploadOutcome::failed(name, "session no longer active");
        };

        match self.backend.upload(&session_id, candidate).await {
            Ok(receipt) => {
                let ingested = receipt
                    .files_ingested
                    .first()
                    .cloned()
                    .unwrap_or_else(|| name.clone());
                tracing::info!(
                    session_id = %session_id,
                    file_name = %name,
                    chunks = receipt.chunks_added,
                    "file ingested"
                );
                self.sink.status(
                    StatusKind::Success,
                    &format!("ingested {ingested} (+{} chunks)", receipt.chunks_added),
                );
                record(
                    &self.transcript,
                    self.sink.as_ref(),
                    TranscriptEntry::bot(format!(
                        "Ingested: {ingested} (+{} chunks)",
                        receipt.chunks_added
                    )),
                );
                UploadOutcome::succeeded(name, ingested, receipt.chunks_added)
            }
            Err(e) => {
                tracing::warn!(file_name = %name, kind = e.error_kind(), error = %e, "upload failed");
                self.sink
                    .status(StatusKind::Error, &format!("upload failed for {name}: {e}"));
                UploadOutcome::failed(name, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tome_client::MockBackend;
    use tome_core::api::{UploadReceipt, UploadStatus};
    use tome_core::ids::SessionId;
    use tome_core::report::RecordingSink;

    fn receipt(name: &str, chunks: u32) -> UploadReceipt {
        UploadReceipt {
            session_id: SessionId::from_raw("s-1"),
            files_ingested: vec![name.to_owned()],
            chunks_added: chunks,
        }
    }

    struct Fixture {
        pipeline: UploadPipeline,
        sessions: Arc<SessionManager>,
        mock: Arc<MockBackend>,
        sink: Arc<RecordingSink>,
        transcript: Arc<ChatTranscript>,
    }

    fn fixture(mock: MockBackend) -> Fixture {
        let mock = Arc::new(mock);
        let sink = Arc::new(RecordingSink::new());
        let transcript = Arc::new(ChatTranscript::new());
        let sessions = Arc::new(SessionManager::new(mock.clone(), sink.clone()));
        let pipeline = UploadPipeline::new(
            sessions.clone(),
            mock.clone(),
            transcript.clone(),
            sink.clone(),
        );
        Fixture {
            pipeline,
            sessions,
            mock,
            sink,
            transcript,
        }
    }

    fn pdf(name: &str) -> UploadCandidate {
        UploadCandidate::new(name, vec![0x25, 0x50, 0x44, 0x46])
    }

    #[tokio::test]
    async fn empty_batch_makes_no_network_calls() {
        let f = fixture(MockBackend::new());

        let report = f.pipeline.submit(vec![]).await.unwrap();

        assert!(report.is_empty());
        assert!(f.sink.saw(StatusKind::Info, "nothing to upload"));
        assert_eq!(f.mock.create_calls(), 0);
        assert!(f.mock.upload_calls().is_empty());
    }

    #[tokio::test]
    async fn session_failure_aborts_before_any_file() {
        let f = fixture(
            MockBackend::new()
                .with_create_error(ClientError::NetworkUnreachable("refused".into())),
        );

        let err = f.pipeline.submit(vec![pdf("a.pdf"), pdf("b.pdf")]).await.unwrap_err();

        assert!(matches!(err, ClientError::SessionRequired(_)), "got: {err:?}");
        assert!(f.mock.upload_calls().is_empty());
        assert!(f.sink.saw(StatusKind::Error, "upload aborted"));
    }

    #[tokio::test]
    async fn mixed_batch_preserves_order_and_isolates_failures() {
        let f = fixture(
            MockBackend::new()
                .with_session("s-1")
                .with_upload(receipt("a.pdf", 10))
                .with_upload(receipt("c.pdf", 4)),
        );

        let report = f
            .pipeline
            .submit(vec![pdf("a.pdf"), pdf("b.txt"), pdf("c.pdf")])
            .await
            .unwrap();

        assert_eq!(report.len(), 3);
        assert_eq!(report.outcomes[0], UploadOutcome::succeeded("a.pdf", "a.pdf", 10));
        assert_eq!(report.outcomes[1], UploadOutcome::failed("b.txt", "unsupported type"));
        assert_eq!(report.outcomes[2], UploadOutcome::succeeded("c.pdf", "c.pdf", 4));
        assert_eq!(report.summary(), "2 succeeded, 1 failed");
        assert!(f.sink.saw(StatusKind::Info, "2 succeeded, 1 failed"));

        // The non-PDF never reached the wire.
        let names: Vec<String> = f.mock.upload_calls().into_iter().map(|(_, n)| n).collect();
        assert_eq!(names, vec!["a.pdf", "c.pdf"]);
    }

    #[tokio::test]
    async fn server_failure_does_not_abort_siblings() {
        let f = fixture(
            MockBackend::new()
                .with_session("s-1")
                .with_upload_error(ClientError::from_status(500, "extraction failed".into()))
                .with_upload(receipt("b.pdf", 7)),
        );

        let report = f.pipeline.submit(vec![pdf("a.pdf"), pdf("b.pdf")]).await.unwrap();

        assert_eq!(report.len(), 2);
        assert!(!report.outcomes[0].is_succeeded());
        assert!(report.outcomes[1].is_succeeded());
        match &report.outcomes[0].status {
            UploadStatus::Failed { reason } => {
                assert!(reason.contains("500"), "reason carries the detail: {reason}")
            }
            other => panic!("expected failure, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn creates_session_on_demand_and_scopes_uploads_to_it() {
        let f = fixture(
            MockBackend::new()
                .with_session("fresh")
                .with_upload(receipt("a.pdf", 2)),
        );
        assert!(f.sessions.current().is_none());

        f.pipeline.submit(vec![pdf("a.pdf")]).await.unwrap();

        assert_eq!(f.mock.create_calls(), 1);
        let calls = f.mock.upload_calls();
        assert_eq!(calls[0].0.as_str(), "fresh");
    }

    #[tokio::test]
    async fn successes_land_in_the_transcript() {
        let f = fixture(
            MockBackend::new()
                .with_session("s-1")
                .with_upload(receipt("a.pdf", 10)),
        );

        f.pipeline.submit(vec![pdf("a.pdf"), pdf("b.txt")]).await.unwrap();

        let entries = f.transcript.snapshot();
        assert_eq!(entries.len(), 1, "only the ingested file gets an entry");
        assert!(entries[0].text.contains("a.pdf"));
        assert!(entries[0].text.contains("10 chunks"));
        // Mirrored to the sink in the same order.
        assert_eq!(f.sink.entries().len(), 1);
    }

    #[tokio::test]
    async fn deleted_session_is_not_reused_by_a_later_batch() {
        let f = fixture(
            MockBackend::new()
                .with_session("s-1")
                .with_upload(receipt("a.pdf", 1)),
        );
        f.sessions.ensure().await.unwrap();

        // First file goes through; then the session disappears.
        let report_first = f.pipeline.submit(vec![pdf("a.pdf")]).await.unwrap();
        assert!(report_first.outcomes[0].is_succeeded());

        f.sessions.delete().await.unwrap();
        // ensure() will create a fresh session for the next batch; script
        // none so the batch aborts instead.
        let err = f.pipeline.submit(vec![pdf("b.pdf")]).await.unwrap_err();
        assert!(matches!(err, ClientError::SessionRequired(_)));
        assert_eq!(f.mock.upload_calls().len(), 1, "no upload for the dead session");
    }
}
