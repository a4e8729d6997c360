//! Session controller - the only code path that mutates a `Session`
//!
//! Transitions:
//! - ingest:          Idle | Populated | Ready -> Populated (an artifact survives)
//! - generate:        Populated | Ready -> Generating -> Ready | Populated
//! - set_output_mode: any state, drops the current artifact and any in-flight job
//! - reset:           any state -> Idle

use crate::archive::build_archive;
use crate::artifact::{ArtifactId, ArtifactSink, DiscardSink, GeneratedArtifact};
use crate::decode::{ImageDecoder, RasterDecoder};
use crate::document::build_document;
use crate::ingest::{UploadSummary, ingest_batch};
use crate::options::BundleOptions;
use crate::session::*;
use crate::types::*;
use chrono::{DateTime, Utc};

/// Inputs captured when a generation starts.
///
/// The job owns copies of everything it needs, so it can run while the
/// session keeps accepting events.
#[derive(Debug, Clone)]
pub struct GenerationJob {
    files: Vec<AcceptedFile>,
    customer_id: String,
    mode: OutputMode,
    at: DateTime<Utc>,
    epoch: u64,
}

impl GenerationJob {
    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Build the artifact for the captured mode
    pub async fn run<D: ImageDecoder>(
        &self,
        options: &BundleOptions,
        decoder: &D,
    ) -> Result<GeneratedArtifact> {
        match self.mode {
            OutputMode::Document => {
                build_document(&self.files, &self.customer_id, self.at, options, decoder).await
            }
            OutputMode::Archive => build_archive(&self.files, &self.customer_id, self.at).await,
        }
    }
}

pub struct SessionController<D: ImageDecoder = RasterDecoder> {
    session: Session,
    options: BundleOptions,
    decoder: D,
    sink: Box<dyn ArtifactSink>,
    /// Bumped whenever in-flight generations become stale (reset, mode switch)
    epoch: u64,
}

impl SessionController<RasterDecoder> {
    pub fn new(options: BundleOptions) -> Self {
        Self::with_decoder(options, RasterDecoder)
    }
}

impl<D: ImageDecoder> SessionController<D> {
    pub fn with_decoder(options: BundleOptions, decoder: D) -> Self {
        Self {
            session: Session::default(),
            options,
            decoder,
            sink: Box::new(DiscardSink),
            epoch: 0,
        }
    }

    pub fn with_sink(mut self, sink: impl ArtifactSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    pub fn options(&self) -> &BundleOptions {
        &self.options
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// Accept a batch from the capture surface
    pub fn ingest(
        &mut self,
        batch: Vec<CandidateFile>,
        externally_rejected: Vec<RejectedFile>,
    ) -> UploadSummary {
        let outcome = ingest_batch(
            &self.session.accepted_files,
            batch,
            externally_rejected,
            &self.options,
        );
        let summary = outcome.summary;

        log::info!(
            "Ingested batch: {} accepted, {} renamed, {} rejected",
            summary.accepted,
            summary.renamed,
            summary.rejected
        );

        self.session.accepted_files.extend(outcome.accepted);
        self.session.upload_message = summary.message().map(|text| {
            let kind = if summary.has_rejections() {
                MessageKind::Error
            } else {
                MessageKind::Info
            };
            TransientMessage::new(kind, text)
        });

        if summary.accepted > 0 {
            self.clear_error_caused_by(ErrorCause::Files);
        }

        summary
    }

    pub fn set_customer_id(&mut self, value: impl Into<String>) {
        self.session.customer_id = value.into();
        if !self.session.customer_id.trim().is_empty() {
            self.clear_error_caused_by(ErrorCause::CustomerId);
        }
    }

    /// Switch between document and archive output, dropping the current artifact
    pub fn set_output_mode(&mut self, mode: OutputMode) {
        log::debug!("Output mode set to {}", mode.name());
        self.session.output_mode = mode;
        self.release_artifact();
        // An in-flight job is now stale and will be discarded on finish
        self.session.generating = false;
        self.epoch += 1;
    }

    /// Check the guards and capture the inputs of a new generation
    pub fn begin_generation(&mut self) -> Result<GenerationJob> {
        if self.session.generating {
            log::debug!("Generation already running, request ignored");
            return Err(BundleError::GenerationInProgress);
        }
        let customer_id = self.session.customer_id.trim().to_string();
        if customer_id.is_empty() {
            return Err(self.fail_guard(BundleError::MissingCustomerId, ErrorCause::CustomerId));
        }
        if self.session.accepted_files.is_empty() {
            return Err(self.fail_guard(BundleError::NoFiles, ErrorCause::Files));
        }

        let job = GenerationJob {
            files: self.session.accepted_files.clone(),
            customer_id,
            mode: self.session.output_mode,
            at: Utc::now(),
            epoch: self.epoch,
        };

        log::info!(
            "Generating {} from {} file(s)",
            job.mode.name(),
            job.files.len()
        );

        self.session.error_message = None;
        self.session.generating = true;
        Ok(job)
    }

    /// Apply the result of `job`.
    ///
    /// Returns `Ok(None)` when the session moved on (reset or mode switch)
    /// while the job ran; the result is dropped and the session is untouched.
    pub fn finish_generation(
        &mut self,
        job: GenerationJob,
        result: Result<GeneratedArtifact>,
    ) -> Result<Option<ArtifactId>> {
        if self.is_stale(&job) {
            log::debug!("Discarding stale {} generation", job.mode.name());
            return Ok(None);
        }

        self.session.generating = false;

        match result {
            Ok(artifact) => {
                self.release_artifact();
                self.sink.publish(&artifact);
                let id = artifact.id;
                self.session.last_artifact = Some(artifact);
                Ok(Some(id))
            }
            Err(e) => {
                log::warn!("{} generation failed: {}", job.mode.name(), e);
                self.release_artifact();
                self.set_error(
                    format!("Failed to generate {}: {}", job.mode.name(), e),
                    ErrorCause::Generation,
                );
                Err(e)
            }
        }
    }

    /// Run a complete generation for the current output mode
    pub async fn generate(&mut self) -> Result<Option<ArtifactId>> {
        let job = self.begin_generation()?;
        let result = job.run(&self.options, &self.decoder).await;
        self.finish_generation(job, result)
    }

    /// Return every session field to its initial value
    pub fn reset(&mut self) {
        log::info!("Session reset");
        self.release_artifact();
        self.session = Session::default();
        self.epoch += 1;
    }

    /// Whether `job` was started before the latest reset or mode switch
    pub fn is_stale(&self, job: &GenerationJob) -> bool {
        job.epoch != self.epoch
    }

    /// Clear `slot` if it still shows the message `id`
    pub fn expire_message(&mut self, slot: MessageSlot, id: MessageId) -> bool {
        if self.session.message(slot).map(|m| m.id) != Some(id) {
            return false;
        }
        match slot {
            MessageSlot::Upload => self.session.upload_message = None,
            MessageSlot::Error => self.session.error_message = None,
        }
        true
    }

    fn fail_guard(&mut self, error: BundleError, cause: ErrorCause) -> BundleError {
        log::warn!("Generation refused: {}", error);
        self.set_error(error.to_string(), cause);
        error
    }

    fn set_error(&mut self, text: String, cause: ErrorCause) {
        self.session.error_message = Some((TransientMessage::new(MessageKind::Error, text), cause));
    }

    fn clear_error_caused_by(&mut self, cause: ErrorCause) {
        if matches!(self.session.error_message, Some((_, c)) if c == cause) {
            self.session.error_message = None;
        }
    }

    fn release_artifact(&mut self) {
        if let Some(artifact) = self.session.last_artifact.take() {
            log::debug!("Releasing artifact {}", artifact.filename);
            self.sink.release(artifact.id);
        }
    }
}
