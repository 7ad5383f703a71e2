use facecap_mobile::*;

fn make_test_png(width: u32, height: u32) -> Vec<u8> {
    use image::codecs::png::PngEncoder;
    use image::{ImageEncoder, RgbImage};

    let mut img = RgbImage::new(width, height);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        *pixel = image::Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ]);
    }
    let mut buffer = Vec::new();
    let encoder = PngEncoder::new(&mut buffer);
    encoder
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    buffer
}

#[test]
fn guide_reports_no_face_for_empty_list() {
    let hint = guide(vec![], None, None);
    assert_eq!(hint, Guidance::NoFace);
}

#[test]
fn guide_reports_hold_still_for_centered_face() {
    let face = FaceBox {
        x: 0.33,
        y: 0.29,
        width: 0.34,
        height: 0.45,
        confidence: 0.9,
    };
    let hint = guide(vec![face], None, None);
    assert_eq!(hint, Guidance::HoldStill);
}

#[test]
fn guide_reports_multiple_faces() {
    let a = FaceBox {
        x: 0.1,
        y: 0.3,
        width: 0.3,
        height: 0.4,
        confidence: 0.9,
    };
    let b = FaceBox {
        x: 0.6,
        y: 0.3,
        width: 0.3,
        height: 0.4,
        confidence: 0.9,
    };
    let hint = guide(vec![a, b], None, None);
    assert_eq!(hint, Guidance::MultipleFaces);
}

#[test]
fn process_with_preset_works() {
    let png = make_test_png(200, 300);
    let result = process_with_preset(png, Preset::Thumbnail).unwrap();
    assert!(!result.data.is_empty());
    assert!(result.width <= 96);
    assert!(result.height <= 96);
}

#[test]
fn process_with_all_parameters() {
    let png = make_test_png(200, 300);
    let result = process(
        png,
        120,
        0.8,
        false,
        CropMode::Framed,
        OutputFormat::Jpeg,
        2.0,
    )
    .unwrap();
    assert!(!result.data.is_empty());
    assert_eq!(result.data[0], 0xFF);
    assert_eq!(result.data[1], 0xD8);
}

#[test]
fn process_to_size_fits_target() {
    let png = make_test_png(200, 300);
    let result = process_to_size(png, 10_000, 0, 48, false, CropMode::Framed, 2.0).unwrap();
    assert!(result.photo.data.len() <= 10_000);
    assert!(result.quality_used > 0.0);
}

#[test]
fn process_to_size_impossible_target_errors() {
    let png = make_test_png(200, 300);
    let result = process_to_size(png, 1, 0, 48, false, CropMode::Framed, 2.0);
    assert!(matches!(
        result,
        Err(FaceCapError::SizeTargetUnreachable { .. })
    ));
}

#[test]
fn cutout_without_mask_produces_png() {
    let png = make_test_png(64, 64);
    let result = cutout(png, None, 64, CropMode::None, None).unwrap();
    assert!(!result.data.is_empty());
    assert!(matches!(result.format, OutputFormat::Png));
    // PNG signature
    assert_eq!(&result.data[1..4], b"PNG");
}

#[test]
fn cutout_rejects_short_mask() {
    let png = make_test_png(32, 32);
    let mask = CoverageMask {
        data: vec![255u8; 10],
        width: 32,
        height: 32,
    };
    let result = cutout(png, Some(mask), 32, CropMode::None, None);
    assert!(matches!(result, Err(FaceCapError::InvalidMask)));
}

#[test]
fn cutout_with_full_mask_keeps_everything_opaque() {
    let png = make_test_png(32, 32);
    let mask = CoverageMask {
        data: vec![255u8; 32 * 32],
        width: 32,
        height: 32,
    };
    let result = cutout(png, Some(mask), 32, CropMode::None, None).unwrap();
    assert!(!result.data.is_empty());
}

#[test]
fn invalid_input_returns_error() {
    let result = process_with_preset(b"not an image".to_vec(), Preset::Portrait);
    assert!(result.is_err());
}

#[test]
fn all_presets_work() {
    let png = make_test_png(200, 300);
    for preset in [Preset::Avatar, Preset::Portrait, Preset::Thumbnail] {
        let result = process_with_preset(png.clone(), preset);
        assert!(result.is_ok());
    }
}
