use crate::geometry::EmbedFormat;
use crate::types::*;
use image::DynamicImage;
use std::future::Future;
use std::sync::Arc;

/// Turns accepted file bytes into pixels.
///
/// Decoding is asynchronous; the document assembler awaits one decode at a
/// time so page order never depends on which decode finishes first.
pub trait ImageDecoder: Send + Sync {
    fn decode(
        &self,
        file: &AcceptedFile,
        format: EmbedFormat,
    ) -> impl Future<Output = Result<DynamicImage>> + Send;
}

/// Decoder backed by the `image` crate, run on the blocking pool
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterDecoder;

impl ImageDecoder for RasterDecoder {
    async fn decode(&self, file: &AcceptedFile, format: EmbedFormat) -> Result<DynamicImage> {
        let bytes = Arc::clone(&file.bytes);

        // Decoding is CPU-bound, spawn blocking
        let decoded = tokio::task::spawn_blocking(move || {
            image::load_from_memory_with_format(&bytes, format.image_format())
        })
        .await?;

        decoded.map_err(|e| decode_error(file, e))
    }
}

pub(crate) fn decode_error(file: &AcceptedFile, reason: impl ToString) -> BundleError {
    BundleError::ImageDecode {
        name: file.name.clone(),
        reason: reason.to_string(),
    }
}
