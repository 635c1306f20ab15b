use tome_core::report::{StatusKind, StatusSink};
use tome_core::transcript::{Speaker, TranscriptEntry};

/// Terminal presentation of core reports: status lines prefixed by kind,
/// transcript entries prefixed by speaker, provenance indented below bot
/// answers.
pub struct PlainSink;

impl StatusSink for PlainSink {
    fn status(&self, kind: StatusKind, message: &str) {
        println!("[{}] {}", kind.as_str(), message);
    }

    fn entry(&self, entry: &TranscriptEntry) {
        match entry.speaker {
            Speaker::User => println!("you> {}", entry.text),
            Speaker::Bot => {
                println!("bot> {}", entry.text);
                if let Some(meta) = &entry.meta {
                    if let Some(mode) = &meta.mode {
                        println!("     mode: {mode}");
                    }
                    if !meta.sources.is_empty() {
                        let labels: Vec<String> =
                            meta.sources.iter().map(|s| s.label()).collect();
                        println!("     sources: {}", labels.join(", "));
                    }
                }
            }
        }
    }
}
