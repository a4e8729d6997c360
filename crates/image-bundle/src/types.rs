use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BundleError {
    #[error("Rejected file '{name}': unsupported type '{mime_type}'")]
    RejectedFileType { name: String, mime_type: String },
    #[error("Please enter a customer identification number")]
    MissingCustomerId,
    #[error("Please upload at least one image")]
    NoFiles,
    #[error("A generation is already running")]
    GenerationInProgress,
    #[error("Failed to decode image '{name}': {reason}")]
    ImageDecode { name: String, reason: String },
    #[error("Failed to build archive: {0}")]
    ArchiveCompression(String),
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, BundleError>;

/// A file handed over by the capture surface, before validation
#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Arc<[u8]>,
}

impl CandidateFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }
}

/// A file that did not make it into the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedFile {
    pub name: String,
    pub mime_type: String,
}

impl RejectedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
        }
    }
}

impl From<&CandidateFile> for RejectedFile {
    fn from(candidate: &CandidateFile) -> Self {
        Self::new(candidate.name.clone(), candidate.mime_type.clone())
    }
}

/// An image that passed validation and holds a session-unique name.
///
/// The byte buffer is shared and never mutated after acceptance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Arc<[u8]>,
}

/// Which artifact a generation request produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OutputMode {
    /// Multi-page PDF, one image per page
    #[default]
    Document,
    /// ZIP archive of the original bytes
    Archive,
}

impl OutputMode {
    pub fn extension(self) -> &'static str {
        match self {
            OutputMode::Document => "pdf",
            OutputMode::Archive => "zip",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OutputMode::Document => "PDF",
            OutputMode::Archive => "ZIP",
        }
    }
}

/// Paper orientation
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Orientation {
    /// Portrait: height > width (default for most paper sizes)
    #[default]
    Portrait,
    /// Landscape: width > height
    Landscape,
}

/// Standard paper sizes
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PaperSize {
    A3,
    #[default]
    A4,
    A5,
    Letter,
    Legal,
    Tabloid,
    Custom { width_mm: f32, height_mm: f32 },
}

impl PaperSize {
    /// Get base dimensions (always portrait: width < height for standard sizes)
    pub fn dimensions_mm(self) -> (f32, f32) {
        match self {
            PaperSize::A3 => (297.0, 420.0),
            PaperSize::A4 => (210.0, 297.0),
            PaperSize::A5 => (148.0, 210.0),
            PaperSize::Letter => (215.9, 279.4),
            PaperSize::Legal => (215.9, 355.6),
            PaperSize::Tabloid => (279.4, 431.8),
            PaperSize::Custom {
                width_mm,
                height_mm,
            } => (width_mm, height_mm),
        }
    }

    /// Get dimensions with orientation applied
    pub fn dimensions_with_orientation(self, orientation: Orientation) -> (f32, f32) {
        let (w, h) = self.dimensions_mm();
        match orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }
}

/// Page margins - the band around each page that images never enter
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageMargins {
    pub top_mm: f32,
    pub bottom_mm: f32,
    pub left_mm: f32,
    pub right_mm: f32,
}

impl Default for PageMargins {
    fn default() -> Self {
        Self::uniform(crate::constants::DEFAULT_MARGIN_MM)
    }
}

impl PageMargins {
    /// Create uniform margins on all sides
    pub fn uniform(margin_mm: f32) -> Self {
        Self {
            top_mm: margin_mm,
            bottom_mm: margin_mm,
            left_mm: margin_mm,
            right_mm: margin_mm,
        }
    }
}
