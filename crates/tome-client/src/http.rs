use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use tome_core::api::{ChatAnswer, ChatRequest, UploadCandidate, UploadReceipt};
use tome_core::backend::Backend;
use tome_core::errors::ClientError;
use tome_core::ids::SessionId;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const PDF_MIME: &str = "application/pdf";

/// `Backend` over the wire. One shared reqwest client; no per-request
/// deadline is imposed once a connection is established.
pub struct HttpBackend {
    client: Client,
    base: String,
}

#[derive(Deserialize)]
struct SessionCreated {
    session_id: String,
}

impl HttpBackend {
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into().trim_end_matches('/').to_owned();
        Self {
            client: Client::builder()
                .connect_timeout(CONNECT_TIMEOUT)
                .build()
                .expect("failed to build HTTP client"),
            base,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    /// Reject a non-2xx response, surfacing status and body text.
    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        Err(ClientError::from_status(status, body))
    }
}

fn network_err(e: reqwest::Error) -> ClientError {
    ClientError::NetworkUnreachable(e.to_string())
}

#[async_trait]
impl Backend for HttpBackend {
    #[instrument(skip(self))]
    async fn health(&self) -> Result<(), ClientError> {
        let resp = self
            .client
            .get(self.endpoint("health"))
            .send()
            .await
            .map_err(network_err)?;
        Self::check(resp).await.map(|_| ())
    }

    #[instrument(skip(self))]
    async fn create_session(&self) -> Result<SessionId, ClientError> {
        let resp = self
            .client
            .post(self.endpoint("sessions"))
            .send()
            .await
            .map_err(network_err)?;
        let created: SessionCreated = Self::check(resp).await?.json().await.map_err(network_err)?;
        Ok(SessionId::from_raw(created.session_id))
    }

    #[instrument(skip(self), fields(session_id = %id))]
    async fn delete_session(&self, id: &SessionId) -> Result<(), ClientError> {
        let resp = self
            .client
            .delete(self.endpoint(&format!("sessions/{id}")))
            .send()
            .await
            .map_err(network_err)?;
        Self::check(resp).await.map(|_| ())
    }

    #[instrument(skip(self, file), fields(session_id = %session_id, file_name = %file.file_name, bytes = file.len()))]
    async fn upload(
        &self,
        session_id: &SessionId,
        file: &UploadCandidate,
    ) -> Result<UploadReceipt, ClientError> {
        let part = Part::bytes(file.payload.to_vec())
            .file_name(file.file_name.clone())
            .mime_str(PDF_MIME)
            .map_err(network_err)?;
        let form = Form::new()
            .part("files", part)
            .text("session_id", session_id.to_string());

        let resp = self
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await
            .map_err(network_err)?;
        Self::check(resp).await?.json().await.map_err(network_err)
    }

    #[instrument(skip(self, request), fields(top_k = request.top_k, use_global = request.use_global))]
    async fn chat(&self, request: &ChatRequest) -> Result<ChatAnswer, ClientError> {
        let resp = self
            .client
            .post(self.endpoint("chat"))
            .json(request)
            .send()
            .await
            .map_err(network_err)?;
        Self::check(resp).await?.json().await.map_err(network_err)
    }
}
