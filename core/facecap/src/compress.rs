use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, RgbImage, RgbaImage};

use crate::crop::{framed_crop, oval_crop, CropRegion};
use crate::error::FaceCapError;
use crate::face_detector::{FaceBounds, FaceDetector};
use crate::geometry::OvalTarget;
use crate::segmenter::{apply_mask, oval_mask, BackgroundSegmenter};
use crate::{CropMode, OutputFormat, ProcessedPhoto};

/// Everything the pipeline needs besides the input bytes. Mirrors the
/// builder fields so the fit search can re-run the pipeline at varying
/// quality without rebuilding the processor.
pub(crate) struct PipelineSettings<'a> {
    pub max_dimension: u32,
    pub quality: f32,
    pub grayscale: bool,
    pub crop_mode: &'a CropMode,
    pub format: &'a OutputFormat,
    pub face_margin: f32,
    pub crop_aspect: f64,
    pub oval: &'a OvalTarget,
    pub detector: Option<&'a dyn FaceDetector>,
}

/// Decode input bytes into a `DynamicImage`.
pub(crate) fn decode_image(input: &[u8]) -> Result<DynamicImage, FaceCapError> {
    image::load_from_memory(input).map_err(|e| FaceCapError::Decode(e.to_string()))
}

/// Detect the input image format from the raw bytes.
pub(crate) fn detect_format(input: &[u8]) -> Result<ImageFormat, FaceCapError> {
    image::guess_format(input).map_err(|e| FaceCapError::Decode(e.to_string()))
}

/// Pick the crop region for the configured mode, along with the detected
/// face (if detection ran and succeeded).
fn plan_crop(
    image: &DynamicImage,
    settings: &PipelineSettings,
) -> (CropRegion, Option<FaceBounds>) {
    let (w, h) = (image.width(), image.height());
    match settings.crop_mode {
        CropMode::None => (
            CropRegion {
                x: 0,
                y: 0,
                width: w,
                height: h,
            },
            None,
        ),
        CropMode::Framed => (framed_crop(w, h, settings.crop_aspect), None),
        CropMode::Oval => (oval_crop(w, h, settings.oval), None),
        CropMode::FaceDetection => {
            match detect_face_crop(
                image,
                settings.face_margin,
                settings.crop_aspect,
                settings.detector,
            ) {
                Some((region, face)) => (region, Some(face)),
                // No detector or no face — fall back to the framed heuristic.
                None => (framed_crop(w, h, settings.crop_aspect), None),
            }
        }
    }
}

/// Crop framed on the strongest detected face.
fn detect_face_crop(
    image: &DynamicImage,
    face_margin: f32,
    aspect: f64,
    detector: Option<&dyn FaceDetector>,
) -> Option<(CropRegion, FaceBounds)> {
    let detector = detector?;
    let gray = image::imageops::grayscale(image);
    let (img_w, img_h) = (gray.width(), gray.height());

    let faces = detector.detect(gray.as_raw(), img_w, img_h);
    let face = faces.into_iter().max_by(|a, b| {
        a.confidence
            .partial_cmp(&b.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    })?;

    let face_cx = face.x + face.width / 2.0;
    let face_cy = face.y + face.height / 2.0;

    // Size the crop relative to the face. face_margin controls framing:
    // 2.0 = portrait (face + hair + shoulders), 1.4 = tight avatar crop.
    let desired_crop_h = (face.height * face_margin as f64).round();
    let desired_crop_w = (desired_crop_h * aspect).round();

    // The crop can't exceed the source dimensions
    let crop_h = (desired_crop_h as u32).min(img_h).max(1);
    let crop_w = (desired_crop_w as u32).min(img_w).max(1);

    // Restore the aspect ratio if clamping broke it
    let (crop_w, crop_h) = if (crop_w as f64 / crop_h as f64) > aspect {
        let w = ((crop_h as f64 * aspect).round() as u32).max(1);
        (w, crop_h)
    } else {
        let h = ((crop_w as f64 / aspect).round() as u32).max(1);
        (crop_w, h)
    };

    // Position the face within the crop. For wider margins the face sits at
    // ~40% from the top (room for hair above, shoulders below); tight crops
    // center it vertically.
    let vertical_position = if face_margin < 1.5 { 0.5 } else { 0.4 };
    let y = (face_cy - crop_h as f64 * vertical_position)
        .round()
        .max(0.0)
        .min((img_h.saturating_sub(crop_h)) as f64) as u32;
    let x = (face_cx - crop_w as f64 / 2.0)
        .round()
        .max(0.0)
        .min((img_w.saturating_sub(crop_w)) as f64) as u32;

    Some((
        CropRegion {
            x,
            y,
            width: crop_w,
            height: crop_h,
        },
        face,
    ))
}

/// Resize so the larger dimension matches `max_dimension`, maintaining the
/// aspect ratio from the crop. Never upscales: a source smaller than the
/// limit is left at its own size.
pub(crate) fn resize_image(image: &DynamicImage, max_dimension: u32) -> DynamicImage {
    let (src_w, src_h) = (image.width(), image.height());
    let limit = max_dimension.min(src_w.max(src_h));

    let (new_w, new_h) = if src_w >= src_h {
        let w = limit;
        let h = ((src_h as f64 / src_w as f64) * limit as f64).round() as u32;
        (w, h.max(1))
    } else {
        let h = limit;
        let w = ((src_w as f64 / src_h as f64) * limit as f64).round() as u32;
        (w.max(1), h)
    };

    image.resize_exact(new_w, new_h, FilterType::Lanczos3)
}

/// Map a face box from source coordinates into the resized output.
fn remap_bounds(face: &FaceBounds, region: &CropRegion, out_w: u32, out_h: u32) -> FaceBounds {
    let sx = out_w as f64 / region.width.max(1) as f64;
    let sy = out_h as f64 / region.height.max(1) as f64;
    FaceBounds {
        x: (face.x - region.x as f64) * sx,
        y: (face.y - region.y as f64) * sy,
        width: face.width * sx,
        height: face.height * sy,
        confidence: face.confidence,
    }
}

/// Flatten the alpha channel by compositing onto a white background.
pub(crate) fn flatten_alpha(image: &DynamicImage) -> RgbImage {
    let rgba: RgbaImage = image.to_rgba8();
    let (width, height) = (rgba.width(), rgba.height());
    let mut rgb = RgbImage::new(width, height);

    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as f32 / 255.0;
        let inv_alpha = 1.0 - alpha;
        let out_r = (r as f32 * alpha + 255.0 * inv_alpha).round() as u8;
        let out_g = (g as f32 * alpha + 255.0 * inv_alpha).round() as u8;
        let out_b = (b as f32 * alpha + 255.0 * inv_alpha).round() as u8;
        rgb.put_pixel(x, y, image::Rgb([out_r, out_g, out_b]));
    }

    rgb
}

/// BT.601 luma, the same weighting `image::imageops::grayscale` uses.
fn luma(r: u8, g: u8, b: u8) -> u8 {
    (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32).round() as u8
}

/// Apply grayscale conversion to an opaque image if requested.
pub(crate) fn apply_grayscale(image: RgbImage, grayscale: bool) -> RgbImage {
    if !grayscale {
        return image;
    }
    let (width, height) = (image.width(), image.height());
    let mut out = RgbImage::new(width, height);
    for (x, y, pixel) in image.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        let v = luma(r, g, b);
        out.put_pixel(x, y, image::Rgb([v, v, v]));
    }
    out
}

/// Grayscale the color channels of an RGBA image, preserving alpha.
fn apply_grayscale_rgba(image: RgbaImage, grayscale: bool) -> RgbaImage {
    if !grayscale {
        return image;
    }
    let (width, height) = (image.width(), image.height());
    let mut out = RgbaImage::new(width, height);
    for (x, y, pixel) in image.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let v = luma(r, g, b);
        out.put_pixel(x, y, image::Rgba([v, v, v, a]));
    }
    out
}

/// Encode an opaque image as JPEG at the given quality.
///
/// When `grayscale` is true, encodes single-channel Luma8 to avoid wasting
/// bytes on identical R=G=B triplets.
pub(crate) fn encode_jpeg(
    image: &RgbImage,
    quality: f32,
    grayscale: bool,
) -> Result<Vec<u8>, FaceCapError> {
    let (raw_data, color_type) = if grayscale {
        let luma: Vec<u8> = image.as_raw().chunks(3).map(|rgb| rgb[0]).collect();
        (luma, ExtendedColorType::L8)
    } else {
        (image.as_raw().to_vec(), ExtendedColorType::Rgb8)
    };

    let quality_percent = (quality * 100.0).round().clamp(1.0, 100.0) as u8;
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality_percent);
    encoder
        .write_image(&raw_data, image.width(), image.height(), color_type)
        .map_err(|e| FaceCapError::Encode(e.to_string()))?;

    Ok(buffer)
}

/// Encode an RGBA image as PNG, preserving the alpha channel.
///
/// When `grayscale` is true, encodes two-channel LumaA8; the color channels
/// are already equal by then.
pub(crate) fn encode_png(image: &RgbaImage, grayscale: bool) -> Result<Vec<u8>, FaceCapError> {
    let (raw_data, color_type) = if grayscale {
        let la: Vec<u8> = image
            .as_raw()
            .chunks(4)
            .flat_map(|rgba| [rgba[0], rgba[3]])
            .collect();
        (la, ExtendedColorType::La8)
    } else {
        (image.as_raw().to_vec(), ExtendedColorType::Rgba8)
    };

    let mut buffer = Vec::new();
    let encoder = PngEncoder::new(&mut buffer);
    encoder
        .write_image(&raw_data, image.width(), image.height(), color_type)
        .map_err(|e| FaceCapError::Encode(e.to_string()))?;

    Ok(buffer)
}

/// Full capture pipeline: decode → crop → resize → encode.
pub(crate) fn process_pipeline(
    input: &[u8],
    settings: &PipelineSettings,
) -> Result<ProcessedPhoto, FaceCapError> {
    let decoded = decode_image(input)?;

    if decoded.width() == 0 || decoded.height() == 0 {
        return Err(FaceCapError::ZeroDimensions);
    }

    let (region, face) = plan_crop(&decoded, settings);
    let cropped = decoded.crop_imm(region.x, region.y, region.width, region.height);
    let resized = resize_image(&cropped, settings.max_dimension);
    let (out_w, out_h) = (resized.width(), resized.height());
    let face_bounds = face.map(|f| remap_bounds(&f, &region, out_w, out_h));

    let data = match settings.format {
        OutputFormat::Jpeg => {
            let flattened = flatten_alpha(&resized);
            let rgb = apply_grayscale(flattened, settings.grayscale);
            encode_jpeg(&rgb, settings.quality, settings.grayscale)?
        }
        OutputFormat::Png => {
            let rgba = apply_grayscale_rgba(resized.to_rgba8(), settings.grayscale);
            encode_png(&rgba, settings.grayscale)?
        }
    };

    tracing::debug!(
        width = out_w,
        height = out_h,
        bytes = data.len(),
        "processed capture"
    );

    Ok(ProcessedPhoto {
        data,
        format: settings.format.clone(),
        width: out_w,
        height: out_h,
        original_size: input.len(),
        face_bounds,
    })
}

/// Background cutout pipeline: decode → mask → crop → resize → encode PNG.
///
/// The mask is applied at source resolution — the shells segment the same
/// frame they hand us — and survives crop and resize through the alpha
/// channel. Output is always PNG; JPEG cannot carry the transparency.
pub(crate) fn cutout_pipeline(
    input: &[u8],
    settings: &PipelineSettings,
    segmenter: Option<&dyn BackgroundSegmenter>,
) -> Result<ProcessedPhoto, FaceCapError> {
    let decoded = decode_image(input)?;

    if decoded.width() == 0 || decoded.height() == 0 {
        return Err(FaceCapError::ZeroDimensions);
    }
    let (src_w, src_h) = (decoded.width(), decoded.height());

    // Plan the crop before masking: detection sees the intact frame.
    let (region, face) = plan_crop(&decoded, settings);

    let mut rgba = decoded.to_rgba8();
    let mask = match segmenter.and_then(|s| s.segment(rgba.as_raw(), src_w, src_h)) {
        Some(mask) if mask.matches(src_w, src_h) => mask,
        Some(mask) => {
            tracing::warn!(
                mask_width = mask.width(),
                mask_height = mask.height(),
                frame_width = src_w,
                frame_height = src_h,
                "segmenter returned a mask of the wrong size, using oval fallback"
            );
            oval_mask(src_w, src_h, settings.oval)
        }
        None => oval_mask(src_w, src_h, settings.oval),
    };
    apply_mask(&mut rgba, &mask);

    let masked = DynamicImage::ImageRgba8(rgba);
    let cropped = masked.crop_imm(region.x, region.y, region.width, region.height);
    let resized = resize_image(&cropped, settings.max_dimension);
    let (out_w, out_h) = (resized.width(), resized.height());
    let face_bounds = face.map(|f| remap_bounds(&f, &region, out_w, out_h));

    let rgba = apply_grayscale_rgba(resized.to_rgba8(), settings.grayscale);
    let data = encode_png(&rgba, settings.grayscale)?;

    tracing::debug!(
        width = out_w,
        height = out_h,
        bytes = data.len(),
        "cut out background"
    );

    Ok(ProcessedPhoto {
        data,
        format: OutputFormat::Png,
        width: out_w,
        height: out_h,
        original_size: input.len(),
        face_bounds,
    })
}
