use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::ids::SessionId;

/// JSON body of `POST /chat`. Field names are load-bearing: the backend
/// matches them verbatim. `session_id` serializes as `null` when absent;
/// that is the legal "answer without document grounding" mode, not an
/// omitted field.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    pub session_id: Option<SessionId>,
    pub top_k: u32,
    pub use_global: bool,
}

/// Backend default for `top_k`.
pub const DEFAULT_TOP_K: u32 = 4;

/// Backend default for `use_global`.
pub const DEFAULT_USE_GLOBAL: bool = true;

/// JSON body of a successful `POST /chat` response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatAnswer {
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<AnswerMode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourceRef>,
}

/// How the backend produced an answer. Unknown strings are preserved
/// rather than failing deserialization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AnswerMode {
    SessionRag,
    GlobalRag,
    LlmOnly,
    Other(String),
}

impl AnswerMode {
    pub fn as_str(&self) -> &str {
        match self {
            Self::SessionRag => "session_rag",
            Self::GlobalRag => "global_rag",
            Self::LlmOnly => "llm_only",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for AnswerMode {
    fn from(s: String) -> Self {
        match s.as_str() {
            "session_rag" => Self::SessionRag,
            "global_rag" => Self::GlobalRag,
            "llm_only" => Self::LlmOnly,
            _ => Self::Other(s),
        }
    }
}

impl From<AnswerMode> for String {
    fn from(mode: AnswerMode) -> Self {
        mode.as_str().to_owned()
    }
}

impl std::fmt::Display for AnswerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One source citation attached to an answer. `score` is carried as-is;
/// the client never interprets it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl SourceRef {
    /// Display label: document name (or "doc") plus the page when known.
    pub fn label(&self) -> String {
        let doc = self.doc_name.as_deref().unwrap_or("doc");
        match self.page {
            Some(p) => format!("{doc} p.{p}"),
            None => doc.to_owned(),
        }
    }
}

/// JSON body of a successful `POST /upload` response. The backend echoes
/// the session the documents were ingested into.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub session_id: SessionId,
    #[serde(default)]
    pub files_ingested: Vec<String>,
    pub chunks_added: u32,
}

/// A file the user asked to ingest: name plus byte payload.
#[derive(Clone, Debug)]
pub struct UploadCandidate {
    pub file_name: String,
    pub payload: Bytes,
}

impl UploadCandidate {
    pub fn new(file_name: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            payload: payload.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Only `.pdf` names (case-insensitive) are eligible for ingestion.
    pub fn is_pdf(&self) -> bool {
        self.file_name.to_lowercase().ends_with(".pdf")
    }
}

/// Per-file result of one submission batch, in input order.
#[derive(Clone, Debug, PartialEq)]
pub struct UploadOutcome {
    pub file_name: String,
    pub status: UploadStatus,
}

#[derive(Clone, Debug, PartialEq)]
pub enum UploadStatus {
    Succeeded {
        ingested_name: String,
        chunks_added: u32,
    },
    Failed {
        reason: String,
    },
}

impl UploadOutcome {
    pub fn succeeded(
        file_name: impl Into<String>,
        ingested_name: impl Into<String>,
        chunks_added: u32,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            status: UploadStatus::Succeeded {
                ingested_name: ingested_name.into(),
                chunks_added,
            },
        }
    }

    pub fn failed(file_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            status: UploadStatus::Failed {
                reason: reason.into(),
            },
        }
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self.status, UploadStatus::Succeeded { .. })
    }
}

/// Aggregate of one `submit` call: one outcome per candidate, input order
/// preserved.
#[derive(Clone, Debug, Default)]
pub struct UploadReport {
    pub outcomes: Vec<UploadOutcome>,
}

impl UploadReport {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }

    pub fn summary(&self) -> String {
        format!("{} succeeded, {} failed", self.succeeded(), self.failed())
    }
}
