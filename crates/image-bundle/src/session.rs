//! Session state and the snapshot handed to the presentation layer

use crate::artifact::{ArtifactId, GeneratedArtifact};
use crate::types::*;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_MESSAGE_ID: AtomicU64 = AtomicU64::new(1);

/// Lifecycle state, derived from the session contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SessionState {
    /// No files accepted yet
    Idle,
    /// Files accepted, no artifact
    Populated,
    /// An artifact build is in flight
    Generating,
    /// An artifact is available
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MessageKind {
    Info,
    Error,
}

/// The two independent transient message slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MessageSlot {
    Upload,
    Error,
}

impl MessageSlot {
    pub const ALL: [MessageSlot; 2] = [MessageSlot::Upload, MessageSlot::Error];
}

/// Identity of one transient message; a clear timer only clears its own message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MessageId(pub u64);

/// What an error message refers to, so correcting input can clear it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorCause {
    CustomerId,
    Files,
    Generation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransientMessage {
    pub id: MessageId,
    pub kind: MessageKind,
    pub text: String,
}

impl TransientMessage {
    pub fn new(kind: MessageKind, text: impl Into<String>) -> Self {
        Self {
            id: MessageId(NEXT_MESSAGE_ID.fetch_add(1, Ordering::SeqCst)),
            kind,
            text: text.into(),
        }
    }
}

/// All mutable state of one operator session
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub customer_id: String,
    pub accepted_files: Vec<AcceptedFile>,
    pub output_mode: OutputMode,
    pub upload_message: Option<TransientMessage>,
    pub error_message: Option<(TransientMessage, ErrorCause)>,
    pub last_artifact: Option<GeneratedArtifact>,
    pub(crate) generating: bool,
}

impl Session {
    pub fn state(&self) -> SessionState {
        if self.generating {
            SessionState::Generating
        } else if self.last_artifact.is_some() {
            SessionState::Ready
        } else if self.accepted_files.is_empty() {
            SessionState::Idle
        } else {
            SessionState::Populated
        }
    }

    pub fn file_names(&self) -> Vec<String> {
        self.accepted_files.iter().map(|f| f.name.clone()).collect()
    }

    pub fn message(&self, slot: MessageSlot) -> Option<&TransientMessage> {
        match slot {
            MessageSlot::Upload => self.upload_message.as_ref(),
            MessageSlot::Error => self.error_message.as_ref().map(|(message, _)| message),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state(),
            customer_id: self.customer_id.clone(),
            file_names: self.file_names(),
            file_count: self.accepted_files.len(),
            output_mode: self.output_mode,
            upload_message: self.upload_message.clone(),
            error_message: self.message(MessageSlot::Error).cloned(),
            artifact: self.last_artifact.as_ref().map(ArtifactInfo::from),
        }
    }
}

/// Download details of the current artifact
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArtifactInfo {
    pub id: ArtifactId,
    pub kind: OutputMode,
    pub filename: String,
    pub size: usize,
}

impl From<&GeneratedArtifact> for ArtifactInfo {
    fn from(artifact: &GeneratedArtifact) -> Self {
        Self {
            id: artifact.id,
            kind: artifact.kind,
            filename: artifact.filename.clone(),
            size: artifact.size(),
        }
    }
}

/// Read-only view of a session after a transition
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub customer_id: String,
    pub file_names: Vec<String>,
    pub file_count: usize,
    pub output_mode: OutputMode,
    pub upload_message: Option<TransientMessage>,
    pub error_message: Option<TransientMessage>,
    pub artifact: Option<ArtifactInfo>,
}
