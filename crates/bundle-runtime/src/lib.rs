use std::sync::Arc;

mod logger;
mod worker;

pub use logger::{AppLogger, LogEntry};
pub use worker::{ChannelSink, SessionHandle, spawn_session, worker_task};

// Re-export types from the library crate
pub use image_bundle::{
    ArtifactId, BundleOptions, CandidateFile, MessageKind, MessageSlot, OutputMode, RejectedFile,
    SessionSnapshot, SessionState, TransientMessage,
};

/// Events sent from the presentation layer to the session worker
#[derive(Debug)]
pub enum SessionCommand {
    /// A drop/select event from the capture surface
    Ingest {
        batch: Vec<CandidateFile>,
        rejected: Vec<RejectedFile>,
    },
    SetCustomerId {
        value: String,
    },
    SetOutputMode {
        mode: OutputMode,
    },
    Generate,
    Reset,
}

/// Updates sent from the session worker to the presentation layer
#[derive(Debug, Clone)]
pub enum SessionUpdate {
    /// Session state after a transition
    Snapshot(SessionSnapshot),
    /// A new artifact is available for download
    ArtifactPublished {
        id: ArtifactId,
        kind: OutputMode,
        filename: String,
        bytes: Arc<[u8]>,
    },
    /// The artifact is no longer current; drop whatever backs its link
    ArtifactReleased {
        id: ArtifactId,
    },
}
