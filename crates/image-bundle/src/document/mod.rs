//! Multi-page document assembly
//!
//! Assembly runs in two phases:
//! 1. Decode and place every image, strictly one after another in list order
//! 2. Render all pages and serialize the PDF on the blocking pool
//!
//! Any decode failure aborts the whole document.

mod page;
mod xobject;

pub use page::render_image_page;
pub use xobject::create_image_xobject;

use crate::artifact::{GeneratedArtifact, suggested_filename};
use crate::constants::PDF_VERSION;
use crate::decode::{ImageDecoder, decode_error};
use crate::geometry::{Placement, resolve_embed_format, resolve_placement};
use crate::options::BundleOptions;
use crate::types::*;
use chrono::{DateTime, Utc};
use image::DynamicImage;
use lopdf::{Dictionary, Document, Object};

/// One page of the document: which file it shows and where
#[derive(Debug, Clone, PartialEq)]
pub struct PagePlan {
    pub file_name: String,
    pub image_width: u32,
    pub image_height: u32,
    pub placement: Placement,
}

/// Serialized document together with its page layout
#[derive(Debug, Clone)]
pub struct AssembledDocument {
    pub pages: Vec<PagePlan>,
    pub bytes: Vec<u8>,
}

/// Decode, place and render `files`, one page per file in list order
pub async fn assemble_document<D: ImageDecoder>(
    files: &[AcceptedFile],
    options: &BundleOptions,
    decoder: &D,
) -> Result<AssembledDocument> {
    if files.is_empty() {
        return Err(BundleError::NoFiles);
    }

    let mut pages = Vec::with_capacity(files.len());
    let mut images = Vec::with_capacity(files.len());

    // One decode in flight at a time: page order must follow list order
    for (index, file) in files.iter().enumerate() {
        let format = resolve_embed_format(&file.mime_type);
        log::debug!(
            "Decoding '{}' as {} ({}/{})",
            file.name,
            format.name(),
            index + 1,
            files.len()
        );

        let image = decoder.decode(file, format).await?;
        if image.width() == 0 || image.height() == 0 {
            return Err(decode_error(file, "image has no pixels"));
        }

        let placement = resolve_placement(image.width(), image.height(), &file.mime_type, options);
        pages.push(PagePlan {
            file_name: file.name.clone(),
            image_width: image.width(),
            image_height: image.height(),
            placement,
        });
        images.push(image);
    }

    let plans = pages.clone();
    let options = options.clone();

    // PDF generation is CPU-bound, spawn blocking
    let bytes =
        tokio::task::spawn_blocking(move || render_document(&plans, &images, &options)).await??;

    Ok(AssembledDocument { pages, bytes })
}

/// Assemble `files` into a PDF artifact named after `customer_id` and `at`
pub async fn build_document<D: ImageDecoder>(
    files: &[AcceptedFile],
    customer_id: &str,
    at: DateTime<Utc>,
    options: &BundleOptions,
    decoder: &D,
) -> Result<GeneratedArtifact> {
    let assembled = assemble_document(files, options, decoder).await?;
    let filename = suggested_filename(customer_id, OutputMode::Document, at);

    log::info!(
        "Generated {}-page document ({} bytes) → {}",
        assembled.pages.len(),
        assembled.bytes.len(),
        filename
    );

    Ok(GeneratedArtifact::new(
        OutputMode::Document,
        assembled.bytes,
        filename,
    ))
}

fn render_document(
    pages: &[PagePlan],
    images: &[DynamicImage],
    options: &BundleOptions,
) -> Result<Vec<u8>> {
    let (page_width_mm, page_height_mm) = options.page_size_mm();

    let mut output = Document::with_version(PDF_VERSION);
    let pages_tree_id = output.new_object_id();
    let mut page_refs = Vec::with_capacity(pages.len());

    for (plan, image) in pages.iter().zip(images) {
        let xobject_id = create_image_xobject(&mut output, image);
        let page_id = render_image_page(
            &mut output,
            pages_tree_id,
            xobject_id,
            &plan.placement,
            page_width_mm,
            page_height_mm,
        );
        page_refs.push(Object::Reference(page_id));
    }

    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(page_refs.len() as i64)),
        ("Kids", Object::Array(page_refs)),
    ]);
    output
        .objects
        .insert(pages_tree_id, Object::Dictionary(pages_dict));

    let catalog_id = output.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_tree_id)),
    ]));
    output.trailer.set("Root", catalog_id);

    output.compress();

    let mut writer = Vec::new();
    output.save_to(&mut writer)?;
    Ok(writer)
}
