//! Image XObject creation
//!
//! Decoded pixels are written as 8-bit DeviceRGB samples. An alpha channel,
//! if present, becomes a DeviceGray soft mask so transparent regions stay
//! transparent on the page.

use image::DynamicImage;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

/// Add `image` to `output` as an Image XObject and return its object ID
pub fn create_image_xobject(output: &mut Document, image: &DynamicImage) -> ObjectId {
    let width = image.width();
    let height = image.height();

    let mut xobject_dict = image_dictionary(width, height, b"DeviceRGB");

    let rgb = if image.color().has_alpha() {
        let rgba = image.to_rgba8();
        let pixel_count = width as usize * height as usize;
        let mut rgb = Vec::with_capacity(pixel_count * 3);
        let mut alpha = Vec::with_capacity(pixel_count);
        for pixel in rgba.pixels() {
            rgb.extend_from_slice(&pixel.0[..3]);
            alpha.push(pixel.0[3]);
        }

        let smask_id = output.add_object(Stream::new(
            image_dictionary(width, height, b"DeviceGray"),
            alpha,
        ));
        xobject_dict.set("SMask", Object::Reference(smask_id));
        rgb
    } else {
        image.to_rgb8().into_raw()
    };

    output.add_object(Stream::new(xobject_dict, rgb))
}

fn image_dictionary(width: u32, height: u32, color_space: &[u8]) -> Dictionary {
    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Image".to_vec()));
    dict.set("Width", Object::Integer(width as i64));
    dict.set("Height", Object::Integer(height as i64));
    dict.set("ColorSpace", Object::Name(color_space.to_vec()));
    dict.set("BitsPerComponent", Object::Integer(8));
    dict
}
