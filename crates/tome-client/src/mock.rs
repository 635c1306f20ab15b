use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use tome_core::api::{ChatAnswer, ChatRequest, UploadCandidate, UploadReceipt};
use tome_core::backend::Backend;
use tome_core::errors::ClientError;
use tome_core::ids::SessionId;

/// Scripted `Backend` for deterministic tests without a server. Responses
/// are consumed in FIFO order per endpoint; an exhausted queue is an error,
/// so a test that triggers an unplanned call fails loudly. Every call is
/// recorded for assertions.
#[derive(Default)]
pub struct MockBackend {
    down: AtomicBool,
    sessions: Mutex<VecDeque<Result<SessionId, ClientError>>>,
    uploads: Mutex<VecDeque<Result<UploadReceipt, ClientError>>>,
    chats: Mutex<VecDeque<Result<ChatAnswer, ClientError>>>,
    deletes: Mutex<VecDeque<Result<(), ClientError>>>,
    create_delay: Mutex<Option<Duration>>,
    upload_delay: Mutex<Option<Duration>>,
    chat_delay: Mutex<Option<Duration>>,

    create_calls: AtomicUsize,
    upload_calls: Mutex<Vec<(SessionId, String)>>,
    chat_calls: Mutex<Vec<ChatRequest>>,
    delete_calls: Mutex<Vec<SessionId>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    // --- scripting ---

    pub fn with_session(self, id: &str) -> Self {
        self.sessions
            .lock()
            .push_back(Ok(SessionId::from_raw(id)));
        self
    }

    pub fn with_create_error(self, err: ClientError) -> Self {
        self.sessions.lock().push_back(Err(err));
        self
    }

    pub fn with_create_delay(self, delay: Duration) -> Self {
        *self.create_delay.lock() = Some(delay);
        self
    }

    pub fn with_upload(self, receipt: UploadReceipt) -> Self {
        self.uploads.lock().push_back(Ok(receipt));
        self
    }

    pub fn with_upload_error(self, err: ClientError) -> Self {
        self.uploads.lock().push_back(Err(err));
        self
    }

    pub fn with_upload_delay(self, delay: Duration) -> Self {
        *self.upload_delay.lock() = Some(delay);
        self
    }

    pub fn with_chat(self, answer: ChatAnswer) -> Self {
        self.chats.lock().push_back(Ok(answer));
        self
    }

    pub fn with_chat_error(self, err: ClientError) -> Self {
        self.chats.lock().push_back(Err(err));
        self
    }

    pub fn with_chat_delay(self, delay: Duration) -> Self {
        *self.chat_delay.lock() = Some(delay);
        self
    }

    pub fn with_delete_error(self, err: ClientError) -> Self {
        self.deletes.lock().push_back(Err(err));
        self
    }

    pub fn unhealthy(self) -> Self {
        self.down.store(true, Ordering::Relaxed);
        self
    }

    // --- call log ---

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::Relaxed)
    }

    pub fn upload_calls(&self) -> Vec<(SessionId, String)> {
        self.upload_calls.lock().clone()
    }

    pub fn chat_requests(&self) -> Vec<ChatRequest> {
        self.chat_calls.lock().clone()
    }

    pub fn deleted_sessions(&self) -> Vec<SessionId> {
        self.delete_calls.lock().clone()
    }

    fn pop<T>(queue: &Mutex<VecDeque<Result<T, ClientError>>>, endpoint: &str) -> Result<T, ClientError> {
        queue.lock().pop_front().unwrap_or_else(|| {
            Err(ClientError::Validation(format!(
                "mock: no {endpoint} response configured"
            )))
        })
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn health(&self) -> Result<(), ClientError> {
        if self.down.load(Ordering::Relaxed) {
            Err(ClientError::NetworkUnreachable("mock: down".into()))
        } else {
            Ok(())
        }
    }

    async fn create_session(&self) -> Result<SessionId, ClientError> {
        self.create_calls.fetch_add(1, Ordering::Relaxed);
        let delay = *self.create_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Self::pop(&self.sessions, "session creation")
    }

    async fn delete_session(&self, id: &SessionId) -> Result<(), ClientError> {
        self.delete_calls.lock().push(id.clone());
        // Deletion defaults to success unless an error was scripted.
        self.deletes.lock().pop_front().unwrap_or(Ok(()))
    }

    async fn upload(
        &self,
        session_id: &SessionId,
        file: &UploadCandidate,
    ) -> Result<UploadReceipt, ClientError> {
        self.upload_calls
            .lock()
            .push((session_id.clone(), file.file_name.clone()));
        let delay = *self.upload_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Self::pop(&self.uploads, "upload")
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatAnswer, ClientError> {
        self.chat_calls.lock().push(request.clone());
        let delay = *self.chat_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Self::pop(&self.chats, "chat")
    }
}
