use crate::constants::{DEFAULT_ALLOWED_MIME_TYPES, DEFAULT_MESSAGE_TTL_MS};
use crate::types::*;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Session-wide configuration: page geometry, ingestion rules and message timing
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BundleOptions {
    // Page geometry
    pub paper_size: PaperSize,
    pub orientation: Orientation,
    pub margins: PageMargins,

    // Ingestion
    pub allowed_mime_types: Vec<String>,

    // Transient messages
    pub message_ttl_ms: u64,
}

impl Default for BundleOptions {
    fn default() -> Self {
        Self {
            paper_size: PaperSize::A4,
            orientation: Orientation::Portrait,
            margins: PageMargins::default(),
            allowed_mime_types: DEFAULT_ALLOWED_MIME_TYPES
                .iter()
                .map(|mime| mime.to_string())
                .collect(),
            message_ttl_ms: DEFAULT_MESSAGE_TTL_MS,
        }
    }
}

impl BundleOptions {
    /// Load options from JSON file
    #[cfg(feature = "serde")]
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let options: Self = serde_json::from_slice(&bytes)
            .map_err(|e| BundleError::Config(format!("Failed to parse config: {}", e)))?;
        options.validate()?;
        Ok(options)
    }

    /// Save options to JSON file
    #[cfg(feature = "serde")]
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| BundleError::Config(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        if self.allowed_mime_types.is_empty() {
            return Err(BundleError::Config(
                "At least one MIME type must be allowed".to_string(),
            ));
        }

        if self.message_ttl_ms == 0 {
            return Err(BundleError::Config(
                "Message display duration must be positive".to_string(),
            ));
        }

        let m = &self.margins;
        if [m.top_mm, m.bottom_mm, m.left_mm, m.right_mm]
            .iter()
            .any(|v| *v < 0.0 || !v.is_finite())
        {
            return Err(BundleError::Config(
                "Margins must be finite and non-negative".to_string(),
            ));
        }

        let (max_width, max_height) = self.printable_area();
        if max_width <= 0.0 || max_height <= 0.0 {
            return Err(BundleError::Config(format!(
                "Margins leave no printable area on a {:.1}x{:.1}mm page",
                self.page_size_mm().0,
                self.page_size_mm().1
            )));
        }

        Ok(())
    }

    /// Page size in millimeters with orientation applied
    pub fn page_size_mm(&self) -> (f32, f32) {
        self.paper_size.dimensions_with_orientation(self.orientation)
    }

    /// Width and height available to images after subtracting margins
    pub fn printable_area(&self) -> (f32, f32) {
        let (width, height) = self.page_size_mm();
        (
            width - self.margins.left_mm - self.margins.right_mm,
            height - self.margins.top_mm - self.margins.bottom_mm,
        )
    }

    pub fn is_allowed(&self, mime_type: &str) -> bool {
        self.allowed_mime_types.iter().any(|m| m == mime_type)
    }

    pub fn message_ttl(&self) -> Duration {
        Duration::from_millis(self.message_ttl_ms)
    }
}
