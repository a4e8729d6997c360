//! Batch ingestion: MIME filtering, naming and upload feedback

use crate::constants::ALLOWED_FORMATS_LABEL;
use crate::naming::normalize_batch;
use crate::options::BundleOptions;
use crate::types::*;
use std::collections::HashSet;

/// Counts reported back to the operator after a batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub accepted: usize,
    /// Accepted files whose final name differs from the original one
    pub renamed: usize,
    /// Rejected by the allow-list plus rejected by the capture surface
    pub rejected: usize,
    pub rejected_files: Vec<RejectedFile>,
}

impl UploadSummary {
    pub fn has_rejections(&self) -> bool {
        self.rejected > 0
    }

    /// Feedback text for the batch, `None` when there is nothing to report
    pub fn message(&self) -> Option<String> {
        let mut message = String::new();
        if self.accepted > 0 {
            message.push_str(&format!(
                "{} image(s) uploaded successfully.",
                self.accepted
            ));
            if self.renamed > 0 {
                message.push_str(&format!(
                    " {} file(s) were renamed to avoid duplicates.",
                    self.renamed
                ));
            }
        }
        if self.rejected > 0 {
            message.push_str(&format!(
                " {} file(s) rejected (only {} allowed).",
                self.rejected, ALLOWED_FORMATS_LABEL
            ));
        }

        let message = message.trim();
        (!message.is_empty()).then(|| message.to_string())
    }
}

/// Result of ingesting one batch
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    /// Newly accepted files, in batch order, to append to the session
    pub accepted: Vec<AcceptedFile>,
    pub summary: UploadSummary,
}

/// Filter a batch against the allow-list and give every valid file a name
/// that is unique among `existing` and the earlier files of the batch.
pub fn ingest_batch(
    existing: &[AcceptedFile],
    batch: Vec<CandidateFile>,
    externally_rejected: Vec<RejectedFile>,
    options: &BundleOptions,
) -> IngestOutcome {
    let mut taken: HashSet<String> = existing.iter().map(|f| f.name.clone()).collect();
    let mut rejected_files = Vec::new();

    let (valid, invalid): (Vec<_>, Vec<_>) = batch
        .into_iter()
        .partition(|candidate| options.is_allowed(&candidate.mime_type));

    for candidate in &invalid {
        let rejected = RejectedFile::from(candidate);
        log::warn!(
            "{}",
            BundleError::RejectedFileType {
                name: rejected.name.clone(),
                mime_type: rejected.mime_type.clone(),
            }
        );
        rejected_files.push(rejected);
    }

    let names = normalize_batch(valid.iter().map(|c| c.name.as_str()), &mut taken);

    let mut renamed = 0;
    let mut accepted = Vec::with_capacity(valid.len());
    for (candidate, name) in valid.into_iter().zip(names) {
        if name != candidate.name {
            log::debug!("Renamed '{}' to '{}'", candidate.name, name);
            renamed += 1;
        }
        accepted.push(AcceptedFile {
            name,
            mime_type: candidate.mime_type,
            bytes: candidate.bytes,
        });
    }

    for rejected in &externally_rejected {
        log::warn!(
            "Capture surface rejected '{}' ({})",
            rejected.name,
            rejected.mime_type
        );
    }
    rejected_files.extend(externally_rejected);

    let summary = UploadSummary {
        accepted: accepted.len(),
        renamed,
        rejected: rejected_files.len(),
        rejected_files,
    };

    IngestOutcome { accepted, summary }
}
