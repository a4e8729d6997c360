//! Generated artifacts and their hand-off to the presentation layer

use crate::types::OutputMode;
use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ARTIFACT_ID: AtomicU64 = AtomicU64::new(1);

/// Handle to a generated artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArtifactId(pub u64);

/// Finished binary output of a generation request
#[derive(Debug, Clone)]
pub struct GeneratedArtifact {
    pub id: ArtifactId,
    pub kind: OutputMode,
    pub bytes: Arc<[u8]>,
    pub filename: String,
}

impl GeneratedArtifact {
    pub fn new(kind: OutputMode, bytes: Vec<u8>, filename: String) -> Self {
        Self {
            id: ArtifactId(NEXT_ARTIFACT_ID.fetch_add(1, Ordering::SeqCst)),
            kind,
            bytes: bytes.into(),
            filename,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Receives finished artifacts and is told when they stop being current.
///
/// A sink typically turns an artifact into a download link; `release` is the
/// signal to drop whatever backs that link.
pub trait ArtifactSink: Send + Sync {
    fn publish(&mut self, artifact: &GeneratedArtifact);
    fn release(&mut self, id: ArtifactId);
}

/// Sink for headless use: artifacts stay reachable through the session only
#[derive(Debug, Default)]
pub struct DiscardSink;

impl ArtifactSink for DiscardSink {
    fn publish(&mut self, _artifact: &GeneratedArtifact) {}
    fn release(&mut self, _id: ArtifactId) {}
}

/// ISO-8601 UTC timestamp with millisecond precision, with ':' and '.'
/// replaced by '-' so it is safe inside a file name
pub fn file_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

/// `<customer id>_<timestamp>.<pdf|zip>`
pub fn suggested_filename(customer_id: &str, kind: OutputMode, at: DateTime<Utc>) -> String {
    format!(
        "{}_{}.{}",
        customer_id.trim(),
        file_timestamp(at),
        kind.extension()
    )
}
