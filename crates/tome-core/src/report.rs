use parking_lot::Mutex;

use crate::transcript::TranscriptEntry;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Loading,
    Error,
    Success,
}

impl StatusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Loading => "loading",
            Self::Error => "error",
            Self::Success => "success",
        }
    }
}

/// Notification seam between the orchestration core and whatever surface
/// presents it. Stateless relay: each call is delivered in order, exactly
/// once. Implementations must not block.
pub trait StatusSink: Send + Sync {
    /// Human-readable status/progress/error line.
    fn status(&self, kind: StatusKind, message: &str);

    /// A transcript entry was appended.
    fn entry(&self, entry: &TranscriptEntry);
}

/// Discards everything. Useful as a placeholder surface.
pub struct NullSink;

impl StatusSink for NullSink {
    fn status(&self, _kind: StatusKind, _message: &str) {}
    fn entry(&self, _entry: &TranscriptEntry) {}
}

/// Captures reports in call order for assertions.
#[derive(Default)]
pub struct RecordingSink {
    statuses: Mutex<Vec<(StatusKind, String)>>,
    entries: Mutex<Vec<TranscriptEntry>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statuses(&self) -> Vec<(StatusKind, String)> {
        self.statuses.lock().clone()
    }

    pub fn entries(&self) -> Vec<TranscriptEntry> {
        self.entries.lock().clone()
    }

    /// True if any captured status line of `kind` contains `needle`.
    pub fn saw(&self, kind: StatusKind, needle: &str) -> bool {
        self.statuses
            .lock()
            .iter()
            .any(|(k, m)| *k == kind && m.contains(needle))
    }
}

impl StatusSink for RecordingSink {
    fn status(&self, kind: StatusKind, message: &str) {
        self.statuses.lock().push((kind, message.to_owned()));
    }

    fn entry(&self, entry: &TranscriptEntry) {
        self.entries.lock().push(entry.clone());
    }
}
