//! Shared constants for ingestion, layout and messaging

// =============================================================================
// Unit Conversion
// =============================================================================

/// Points per millimeter (1 inch = 72 points, 1 inch = 25.4mm)
pub const POINTS_PER_MM: f32 = 72.0 / 25.4; // ≈ 2.83465

/// Convert millimeters to points
#[inline]
pub fn mm_to_pt(mm: f32) -> f32 {
    mm * POINTS_PER_MM
}

/// Convert points to millimeters
#[inline]
pub fn pt_to_mm(pt: f32) -> f32 {
    pt / POINTS_PER_MM
}

// =============================================================================
// Layout
// =============================================================================

/// Default margin on every page side, in millimeters
pub const DEFAULT_MARGIN_MM: f32 = 10.0;

/// Resource name of the image XObject on every page
pub const IMAGE_XOBJECT_NAME: &str = "Im0";

/// PDF version written for generated documents
pub const PDF_VERSION: &str = "1.7";

// =============================================================================
// Ingestion
// =============================================================================

/// MIME types accepted by default, matched exactly
pub const DEFAULT_ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
    "image/bmp",
];

/// Human-readable list of accepted formats, used in upload feedback
pub const ALLOWED_FORMATS_LABEL: &str = "JPEG, PNG, GIF, WebP, SVG, BMP";

// =============================================================================
// Messaging
// =============================================================================

/// How long a transient message stays visible, in milliseconds
pub const DEFAULT_MESSAGE_TTL_MS: u64 = 5_000;
