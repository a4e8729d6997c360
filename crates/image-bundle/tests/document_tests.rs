use chrono::{TimeZone, Utc};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use image_bundle::*;
use lopdf::Document;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

fn png_file(name: &str, width: u32, height: u32) -> AcceptedFile {
    let image = RgbImage::from_pixel(width, height, Rgb([200, 40, 40]));
    AcceptedFile {
        name: name.to_string(),
        mime_type: "image/png".to_string(),
        bytes: encode(DynamicImage::ImageRgb8(image), ImageFormat::Png).into(),
    }
}

/// Decoder that sleeps per file and records when each decode starts and ends
struct DelayedDecoder {
    delays_ms: HashMap<String, u64>,
    events: Arc<Mutex<Vec<String>>>,
}

impl ImageDecoder for DelayedDecoder {
    async fn decode(&self, file: &AcceptedFile, format: EmbedFormat) -> Result<DynamicImage> {
        self.events.lock().unwrap().push(format!("start {}", file.name));
        let delay = self.delays_ms.get(&file.name).copied().unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        let image = RasterDecoder.decode(file, format).await;
        self.events.lock().unwrap().push(format!("end {}", file.name));
        image
    }
}

#[tokio::test]
async fn test_two_page_document_geometry() {
    let files = vec![png_file("wide.png", 400, 200), png_file("tall.png", 200, 400)];

    let assembled = assemble_document(&files, &BundleOptions::default(), &RasterDecoder)
        .await
        .unwrap();

    assert_eq!(assembled.pages.len(), 2);

    let first = &assembled.pages[0];
    assert_eq!(first.file_name, "wide.png");
    assert!((first.placement.width - 190.0).abs() < 1e-3);
    assert!((first.placement.height - 95.0).abs() < 1e-3);

    let second = &assembled.pages[1];
    assert_eq!(second.file_name, "tall.png");
    assert!((second.placement.width - 138.5).abs() < 1e-3);
    assert!((second.placement.height - 277.0).abs() < 1e-3);

    for page in &assembled.pages {
        assert!((page.placement.offset_x - 10.0).abs() < 1e-3);
        assert!((page.placement.offset_y - 10.0).abs() < 1e-3);
    }
}

#[tokio::test]
async fn test_output_is_a_pdf_with_one_page_per_image() {
    let files = vec![
        png_file("1.png", 30, 20),
        png_file("2.png", 20, 30),
        png_file("3.png", 10, 10),
    ];

    let assembled = assemble_document(&files, &BundleOptions::default(), &RasterDecoder)
        .await
        .unwrap();

    assert!(assembled.bytes.starts_with(b"%PDF-1.7"));
    let doc = Document::load_mem(&assembled.bytes).unwrap();
    let pages = doc.get_pages();
    assert_eq!(pages.len(), 3);

    for page_id in pages.values() {
        let content = doc.get_page_content(*page_id).unwrap();
        let content = String::from_utf8_lossy(&content);
        assert!(content.contains("/Im0 Do"), "page content: {content}");
    }
}

#[tokio::test]
async fn test_page_content_uses_bottom_left_origin() {
    let files = vec![png_file("wide.png", 400, 200)];

    let assembled = assemble_document(&files, &BundleOptions::default(), &RasterDecoder)
        .await
        .unwrap();

    let doc = Document::load_mem(&assembled.bytes).unwrap();
    let page_id = *doc.get_pages().values().next().unwrap();
    let content = String::from_utf8(doc.get_page_content(page_id).unwrap()).unwrap();

    // q w 0 0 h x y cm /Im0 Do Q
    let numbers: Vec<f32> = content
        .split_whitespace()
        .skip(1)
        .take(6)
        .map(|token| token.parse().unwrap())
        .collect();
    let width_mm = constants::pt_to_mm(numbers[0]);
    let height_mm = constants::pt_to_mm(numbers[3]);
    let x_mm = constants::pt_to_mm(numbers[4]);
    let y_mm = constants::pt_to_mm(numbers[5]);

    assert!((width_mm - 190.0).abs() < 1e-2);
    assert!((height_mm - 95.0).abs() < 1e-2);
    assert!((x_mm - 10.0).abs() < 1e-2);
    // 297 - 10 (top margin) - 95 (image height)
    assert!((y_mm - 192.0).abs() < 1e-2);
}

#[tokio::test]
async fn test_page_order_follows_upload_order_not_decode_speed() {
    let files = vec![
        png_file("slow.png", 40, 20),
        png_file("fast.png", 20, 40),
        png_file("medium.png", 30, 30),
    ];
    let events = Arc::new(Mutex::new(Vec::new()));
    let decoder = DelayedDecoder {
        delays_ms: HashMap::from([
            ("slow.png".to_string(), 60),
            ("fast.png".to_string(), 0),
            ("medium.png".to_string(), 20),
        ]),
        events: events.clone(),
    };

    let assembled = assemble_document(&files, &BundleOptions::default(), &decoder)
        .await
        .unwrap();

    let order: Vec<&str> = assembled
        .pages
        .iter()
        .map(|p| p.file_name.as_str())
        .collect();
    assert_eq!(order, vec!["slow.png", "fast.png", "medium.png"]);

    // Exactly one decode in flight at a time
    assert_eq!(
        *events.lock().unwrap(),
        vec![
            "start slow.png",
            "end slow.png",
            "start fast.png",
            "end fast.png",
            "start medium.png",
            "end medium.png",
        ]
    );
}

#[tokio::test]
async fn test_corrupt_image_aborts_whole_document() {
    let mut broken = png_file("broken.png", 10, 10);
    broken.bytes = vec![0x89, b'P', b'N', b'G', 0, 0, 0].into();
    let files = vec![png_file("ok.png", 10, 10), broken, png_file("later.png", 10, 10)];

    let result = assemble_document(&files, &BundleOptions::default(), &RasterDecoder).await;

    match result {
        Err(BundleError::ImageDecode { name, .. }) => assert_eq!(name, "broken.png"),
        other => panic!("Expected ImageDecode error, got {:?}", other.map(|d| d.pages)),
    }
}

#[tokio::test]
async fn test_svg_is_not_rasterized() {
    let svg = AcceptedFile {
        name: "logo.svg".to_string(),
        mime_type: "image/svg+xml".to_string(),
        bytes: br#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"/>"#
            .to_vec()
            .into(),
    };

    let result = assemble_document(&[svg], &BundleOptions::default(), &RasterDecoder).await;

    match result {
        Err(BundleError::ImageDecode { name, .. }) => assert_eq!(name, "logo.svg"),
        other => panic!("Expected ImageDecode error, got {:?}", other.map(|d| d.pages)),
    }
}

#[tokio::test]
async fn test_decode_uses_declared_format() {
    let jpeg = encode(
        DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 8, Rgb([10, 20, 30]))),
        ImageFormat::Jpeg,
    );
    let files = vec![AcceptedFile {
        name: "photo.jpg".to_string(),
        mime_type: "image/jpg".to_string(),
        bytes: jpeg.into(),
    }];

    let assembled = assemble_document(&files, &BundleOptions::default(), &RasterDecoder)
        .await
        .unwrap();

    assert_eq!(assembled.pages[0].image_width, 16);
    assert_eq!(assembled.pages[0].image_height, 8);
    assert_eq!(assembled.pages[0].placement.format, EmbedFormat::Jpeg);
}

#[tokio::test]
async fn test_alpha_channel_becomes_soft_mask() {
    let image = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 255, 128]));
    let files = vec![AcceptedFile {
        name: "overlay.png".to_string(),
        mime_type: "image/png".to_string(),
        bytes: encode(DynamicImage::ImageRgba8(image), ImageFormat::Png).into(),
    }];

    let assembled = assemble_document(&files, &BundleOptions::default(), &RasterDecoder)
        .await
        .unwrap();

    let doc = Document::load_mem(&assembled.bytes).unwrap();
    let has_smask = doc.objects.values().any(|object| {
        object
            .as_stream()
            .map(|stream| stream.dict.has(b"SMask"))
            .unwrap_or(false)
    });
    assert!(has_smask);
}

#[tokio::test]
async fn test_empty_file_list_is_rejected() {
    let result = assemble_document(&[], &BundleOptions::default(), &RasterDecoder).await;
    assert!(matches!(result, Err(BundleError::NoFiles)));
}

#[tokio::test]
async fn test_build_document_names_artifact() {
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 20, 30).unwrap()
        + chrono::Duration::milliseconds(123);

    let artifact = build_document(
        &[png_file("a.png", 10, 10)],
        "C42",
        at,
        &BundleOptions::default(),
        &RasterDecoder,
    )
    .await
    .unwrap();

    assert_eq!(artifact.kind, OutputMode::Document);
    assert_eq!(artifact.filename, "C42_2024-05-01T10-20-30-123Z.pdf");
    assert!(artifact.bytes.starts_with(b"%PDF"));
}
