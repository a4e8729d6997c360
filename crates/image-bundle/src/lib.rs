pub mod archive;
pub mod artifact;
pub mod constants;
pub mod controller;
pub mod decode;
pub mod document;
pub mod geometry;
pub mod ingest;
pub mod naming;
mod options;
pub mod session;
mod types;

pub use archive::{build_archive, pack_archive};
pub use artifact::{ArtifactId, ArtifactSink, DiscardSink, GeneratedArtifact, suggested_filename};
pub use controller::{GenerationJob, SessionController};
pub use decode::{ImageDecoder, RasterDecoder};
pub use document::{AssembledDocument, PagePlan, assemble_document, build_document};
pub use geometry::{EmbedFormat, Placement, resolve_embed_format, resolve_placement};
pub use ingest::{IngestOutcome, UploadSummary, ingest_batch};
pub use naming::normalize_name;
pub use options::*;
pub use session::*;
pub use types::*;
