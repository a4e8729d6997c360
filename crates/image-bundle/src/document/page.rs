//! Output page rendering

use crate::constants::{IMAGE_XOBJECT_NAME, mm_to_pt};
use crate::geometry::Placement;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

/// Render one page holding a single image XObject.
///
/// `placement` is measured from the top-left page corner; PDF user space
/// starts at the bottom-left, so the vertical offset is flipped here.
pub fn render_image_page(
    output: &mut Document,
    parent_pages_id: ObjectId,
    xobject_id: ObjectId,
    placement: &Placement,
    page_width_mm: f32,
    page_height_mm: f32,
) -> ObjectId {
    let page_width_pt = mm_to_pt(page_width_mm);
    let page_height_pt = mm_to_pt(page_height_mm);

    let mut page_dict = Dictionary::new();
    page_dict.set("Type", Object::Name(b"Page".to_vec()));
    page_dict.set("Parent", Object::Reference(parent_pages_id));
    page_dict.set(
        "MediaBox",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(page_width_pt),
            Object::Real(page_height_pt),
        ]),
    );

    let mut xobjects = Dictionary::new();
    xobjects.set(IMAGE_XOBJECT_NAME, Object::Reference(xobject_id));
    let mut resources = Dictionary::new();
    resources.set("XObject", Object::Dictionary(xobjects));

    let content = placement_command(placement, page_height_pt);
    let content_id = output.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

    page_dict.set("Contents", Object::Reference(content_id));
    page_dict.set("Resources", Object::Dictionary(resources));

    output.add_object(page_dict)
}

/// Content stream drawing the unit-square image scaled to the placement
fn placement_command(placement: &Placement, page_height_pt: f32) -> String {
    let width = mm_to_pt(placement.width);
    let height = mm_to_pt(placement.height);
    let x = mm_to_pt(placement.offset_x);
    let y = page_height_pt - mm_to_pt(placement.offset_y) - height;

    format!(
        "q {} 0 0 {} {} {} cm /{} Do Q\n",
        width, height, x, y, IMAGE_XOBJECT_NAME
    )
}
