use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::api::{AnswerMode, SourceRef};
use crate::ids::EntryId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Bot,
}

/// Provenance attached to a bot entry: how the answer was produced and
/// which documents it cites.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<AnswerMode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourceRef>,
}

impl EntryMeta {
    pub fn is_empty(&self) -> bool {
        self.mode.is_none() && self.sources.is_empty()
    }
}

/// One exchanged message. Never edited or removed once appended.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub id: EntryId,
    pub speaker: Speaker,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<EntryMeta>,
    pub at: DateTime<Utc>,
}

impl TranscriptEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: EntryId::new(),
            speaker: Speaker::User,
            text: text.into(),
            meta: None,
            at: Utc::now(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            id: EntryId::new(),
            speaker: Speaker::Bot,
            text: text.into(),
            meta: None,
            at: Utc::now(),
        }
    }

    pub fn bot_with_meta(text: impl Into<String>, meta: EntryMeta) -> Self {
        Self {
            meta: if meta.is_empty() { None } else { Some(meta) },
            ..Self::bot(text)
        }
    }
}

/// Append-only ordered log of exchanged messages. `append` is the sole
/// mutator; the lock is never held across an await, so entries land in the
/// exact order their owning operations completed.
#[derive(Default)]
pub struct ChatTranscript {
    entries: Mutex<Vec<TranscriptEntry>>,
}

impl ChatTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, entry: TranscriptEntry) {
        self.entries.lock().push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn snapshot(&self) -> Vec<TranscriptEntry> {
        self.entries.lock().clone()
    }
}
