//! Run the full capture flow on a synthetic portrait.
//!
//! Usage:
//!   cargo run --example capture_flow
//!
//! Output goes to `target/capture_flow/`.

use facecap::{
    guide, CropMode, FaceBounds, FaceBox, OvalTarget, PhotoProcessor, Preset, SizeTarget,
};
use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage};
use std::path::Path;

fn synthetic_portrait(width: u32, height: u32) -> Vec<u8> {
    let (cx, cy) = (width as f32 / 2.0, height as f32 * 0.4);
    let (rx, ry) = (width as f32 * 0.22, height as f32 * 0.26);

    let mut img = RgbImage::new(width, height);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let nx = (x as f32 - cx) / rx;
        let ny = (y as f32 - cy) / ry;
        *pixel = if nx * nx + ny * ny <= 1.0 {
            Rgb([224, 172, 140])
        } else {
            Rgb([40, 60, 90])
        };
    }

    let mut buffer = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buffer)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    buffer
}

fn main() {
    let input = synthetic_portrait(480, 640);
    let output_dir = Path::new("target/capture_flow");
    std::fs::create_dir_all(output_dir).unwrap();

    // Preview-frame guidance, as the shells would call it per frame.
    let oval = OvalTarget::default();
    let detection = FaceBounds {
        x: 160.0,
        y: 190.0,
        width: 160.0,
        height: 280.0,
        confidence: 0.92,
    };
    let faces = vec![detection.to_face_box(480, 640)];
    println!("guidance: {}", guide(&faces, &oval, None));

    // Capture processing with each preset.
    let presets: &[(&str, Preset)] = &[
        ("avatar", Preset::Avatar),
        ("portrait", Preset::Portrait),
        ("thumbnail", Preset::Thumbnail),
    ];
    for (name, preset) in presets {
        let result = PhotoProcessor::new(input.clone())
            .unwrap()
            .preset(preset.clone())
            .process()
            .unwrap();
        let path = output_dir.join(format!("{name}.jpg"));
        std::fs::write(&path, &result.data).unwrap();
        println!(
            "{name}: {width}x{height}, {size} bytes",
            width = result.width,
            height = result.height,
            size = result.data.len()
        );
    }

    // Size-targeted fit, e.g. for an upload limit.
    let fit = PhotoProcessor::new(input.clone())
        .unwrap()
        .max_dimension(240)
        .process_to_size(SizeTarget {
            bytes: 8_000,
            tolerance: 1_000,
        })
        .unwrap();
    std::fs::write(output_dir.join("fit.jpg"), &fit.photo.data).unwrap();
    println!(
        "fit: {} bytes at quality {:.2} ({} probes, within tolerance: {})",
        fit.photo.data.len(),
        fit.quality_used,
        fit.iterations,
        fit.within_tolerance
    );

    // Background cutout with the elliptical fallback mask.
    let cut = PhotoProcessor::new(input)
        .unwrap()
        .crop_mode(CropMode::Oval)
        .max_dimension(240)
        .cutout()
        .unwrap();
    std::fs::write(output_dir.join("cutout.png"), &cut.data).unwrap();
    println!("cutout: {}x{}, {} bytes", cut.width, cut.height, cut.data.len());

    // Show what the guidance says when nothing is detected.
    let empty: Vec<FaceBox> = Vec::new();
    println!("no detections: {}", guide(&empty, &oval, None));
}
