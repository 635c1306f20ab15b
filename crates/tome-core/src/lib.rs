pub mod api;
pub mod backend;
pub mod errors;
pub mod ids;
pub mod report;
pub mod transcript;

pub use api::{
    AnswerMode, ChatAnswer, ChatRequest, SourceRef, UploadCandidate, UploadOutcome, UploadReceipt,
    UploadReport, UploadStatus,
};
pub use backend::Backend;
pub use errors::ClientError;
pub use ids::{EntryId, SessionId};
pub use report::{StatusKind, StatusSink};
pub use transcript::{ChatTranscript, EntryMeta, Speaker, TranscriptEntry};
