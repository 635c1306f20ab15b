use async_trait::async_trait;

use crate::api::{ChatAnswer, ChatRequest, UploadCandidate, UploadReceipt};
use crate::errors::ClientError;
use crate::ids::SessionId;

/// The fixed HTTP contract the orchestration core consumes. Implemented
/// over the wire by `HttpBackend` and in memory by `MockBackend`.
#[async_trait]
pub trait Backend: Send + Sync {
    /// `GET /health`. Any 2xx means healthy.
    async fn health(&self) -> Result<(), ClientError>;

    /// `POST /sessions`. Returns the server-issued session id.
    async fn create_session(&self) -> Result<SessionId, ClientError>;

    /// `DELETE /sessions/{id}`.
    async fn delete_session(&self, id: &SessionId) -> Result<(), ClientError>;

    /// `POST /upload`. Multipart, one file per call, scoped to `session_id`.
    async fn upload(
        &self,
        session_id: &SessionId,
        file: &UploadCandidate,
    ) -> Result<UploadReceipt, ClientError>;

    /// `POST /chat`. A single question/answer round trip.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatAnswer, ClientError>;
}
