//! Image placement on a page
//!
//! Images are fit inside the printable area with their aspect ratio kept:
//! width-constrained first, height-constrained when the result would be too
//! tall. The image sits at the top-left margin corner; remaining space is
//! left empty.

use crate::options::BundleOptions;

/// Encoding an image is read as before it is embedded in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmbedFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
    Bmp,
}

impl EmbedFormat {
    pub fn name(self) -> &'static str {
        match self {
            EmbedFormat::Png => "PNG",
            EmbedFormat::Jpeg => "JPEG",
            EmbedFormat::Gif => "GIF",
            EmbedFormat::Webp => "WEBP",
            EmbedFormat::Bmp => "BMP",
        }
    }

    pub fn image_format(self) -> image::ImageFormat {
        match self {
            EmbedFormat::Png => image::ImageFormat::Png,
            EmbedFormat::Jpeg => image::ImageFormat::Jpeg,
            EmbedFormat::Gif => image::ImageFormat::Gif,
            EmbedFormat::Webp => image::ImageFormat::WebP,
            EmbedFormat::Bmp => image::ImageFormat::Bmp,
        }
    }
}

/// Map a declared MIME type to its embed format.
///
/// Unmapped types, SVG in particular, fall back to JPEG. Vector input is not
/// rasterized, so such files fail to decode and abort the document.
pub fn resolve_embed_format(mime_type: &str) -> EmbedFormat {
    match mime_type {
        "image/png" => EmbedFormat::Png,
        "image/jpeg" | "image/jpg" => EmbedFormat::Jpeg,
        "image/gif" => EmbedFormat::Gif,
        "image/webp" => EmbedFormat::Webp,
        "image/bmp" => EmbedFormat::Bmp,
        _ => EmbedFormat::Jpeg,
    }
}

/// Where an image lands on its page, in millimeters from the top-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub width: f32,
    pub height: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub format: EmbedFormat,
}

/// Largest (width, height) with the image's aspect ratio inside the box
pub fn fit_within(
    image_width: u32,
    image_height: u32,
    max_width: f32,
    max_height: f32,
) -> (f32, f32) {
    let aspect_ratio = image_width as f32 / image_height as f32;

    let width = max_width;
    let height = max_width / aspect_ratio;
    if height > max_height {
        (max_height * aspect_ratio, max_height)
    } else {
        (width, height)
    }
}

/// Compute the placement of a decoded image on a page described by `options`
pub fn resolve_placement(
    image_width: u32,
    image_height: u32,
    mime_type: &str,
    options: &BundleOptions,
) -> Placement {
    let (max_width, max_height) = options.printable_area();
    let (width, height) = fit_within(image_width, image_height, max_width, max_height);

    Placement {
        width,
        height,
        offset_x: options.margins.left_mm,
        offset_y: options.margins.top_mm,
        format: resolve_embed_format(mime_type),
    }
}
