//! ZIP packaging of the original image bytes

use crate::artifact::{GeneratedArtifact, suggested_filename};
use crate::types::*;
use chrono::{DateTime, Utc};
use std::io::{Cursor, Write};
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

/// Pack `files` into a ZIP container, one entry per file in list order.
///
/// Entry names are the accepted (already unique) names and entry contents
/// are the accepted bytes, unmodified.
pub async fn pack_archive(files: &[AcceptedFile]) -> Result<Vec<u8>> {
    if files.is_empty() {
        return Err(BundleError::NoFiles);
    }

    let files = files.to_vec();

    // Compression is CPU-bound, spawn blocking
    tokio::task::spawn_blocking(move || pack_archive_sync(&files)).await?
}

/// Pack `files` into a ZIP artifact named after `customer_id` and `at`
pub async fn build_archive(
    files: &[AcceptedFile],
    customer_id: &str,
    at: DateTime<Utc>,
) -> Result<GeneratedArtifact> {
    let bytes = pack_archive(files).await?;
    let filename = suggested_filename(customer_id, OutputMode::Archive, at);

    log::info!(
        "Packed {} file(s) into archive ({} bytes) → {}",
        files.len(),
        bytes.len(),
        filename
    );

    Ok(GeneratedArtifact::new(OutputMode::Archive, bytes, filename))
}

fn pack_archive_sync(files: &[AcceptedFile]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let entry_options =
        SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for file in files {
        log::debug!("Adding '{}' ({} bytes)", file.name, file.bytes.len());
        writer
            .start_file(file.name.as_str(), entry_options)
            .map_err(compression_error)?;
        writer.write_all(&file.bytes).map_err(compression_error)?;
    }

    let cursor = writer.finish().map_err(compression_error)?;
    Ok(cursor.into_inner())
}

fn compression_error(e: impl std::fmt::Display) -> BundleError {
    BundleError::ArchiveCompression(e.to_string())
}
