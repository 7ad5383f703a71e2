use facecap::{BackgroundSegmenter, FaceBox, OvalTarget, SegmentationMask};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

/// Options for capture processing, passed as a JavaScript object.
///
/// All fields are optional. When a `preset` is specified, its defaults apply
/// and individual fields override them.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessOptions {
    pub preset: Option<String>,
    pub max_dimension: Option<u32>,
    pub quality: Option<f32>,
    pub grayscale: Option<bool>,
    pub crop_mode: Option<String>,
    pub format: Option<String>,
    pub face_margin: Option<f32>,
    pub oval: Option<OvalTarget>,
}

fn format_to_str(format: &facecap::OutputFormat) -> &'static str {
    match format {
        facecap::OutputFormat::Jpeg => "jpeg",
        facecap::OutputFormat::Png => "png",
    }
}

fn string_to_preset(preset: &str) -> Result<facecap::Preset, JsValue> {
    match preset {
        "avatar" => Ok(facecap::Preset::Avatar),
        "portrait" => Ok(facecap::Preset::Portrait),
        "thumbnail" => Ok(facecap::Preset::Thumbnail),
        _ => Err(make_error(
            "INVALID_OPTIONS",
            &format!("unknown preset: {preset}"),
        )),
    }
}

fn string_to_crop_mode(mode: &str) -> Result<facecap::CropMode, JsValue> {
    match mode {
        "face-detection" => Ok(facecap::CropMode::FaceDetection),
        "framed" => Ok(facecap::CropMode::Framed),
        "oval" => Ok(facecap::CropMode::Oval),
        "none" => Ok(facecap::CropMode::None),
        _ => Err(make_error(
            "INVALID_OPTIONS",
            &format!("unknown crop mode: {mode}"),
        )),
    }
}

fn string_to_format(format: &str) -> Result<facecap::OutputFormat, JsValue> {
    match format {
        "jpeg" => Ok(facecap::OutputFormat::Jpeg),
        "png" => Ok(facecap::OutputFormat::Png),
        _ => Err(make_error(
            "INVALID_OPTIONS",
            &format!("unknown format: {format}"),
        )),
    }
}

/// Create a JS `Error` with a `code` property.
fn make_error(code: &str, message: &str) -> JsValue {
    let err = js_sys::Error::new(message);
    let _ = js_sys::Reflect::set(&err, &"code".into(), &JsValue::from_str(code));
    JsValue::from(err)
}

/// Convert a `FaceCapError` into a JS `Error` with a machine-readable `code` property.
fn to_js_error(e: facecap::FaceCapError) -> JsValue {
    let code = match &e {
        facecap::FaceCapError::Decode(_) => "DECODE_ERROR",
        facecap::FaceCapError::ZeroDimensions => "ZERO_DIMENSIONS",
        facecap::FaceCapError::Encode(_) => "ENCODE_ERROR",
        facecap::FaceCapError::InvalidQuality(_) => "INVALID_QUALITY",
        facecap::FaceCapError::InvalidMaxDimension => "INVALID_MAX_DIMENSION",
        facecap::FaceCapError::InvalidMask { .. } => "INVALID_MASK",
        facecap::FaceCapError::SizeTargetUnreachable { .. } => "SIZE_TARGET_UNREACHABLE",
        facecap::FaceCapError::Model(_) => "MODEL_ERROR",
    };
    make_error(code, &e.to_string())
}

fn parse_options(options: JsValue) -> Result<ProcessOptions, JsValue> {
    if options.is_undefined() || options.is_null() {
        Ok(ProcessOptions::default())
    } else {
        serde_wasm_bindgen::from_value(options)
            .map_err(|e| make_error("INVALID_OPTIONS", &format!("invalid options: {e}")))
    }
}

/// Apply parsed `ProcessOptions` to a `PhotoProcessor`, returning the
/// configured processor ready to run.
fn apply_options(
    mut processor: facecap::PhotoProcessor,
    opts: &ProcessOptions,
) -> Result<facecap::PhotoProcessor, JsValue> {
    if let Some(ref p) = opts.preset {
        processor = processor.preset(string_to_preset(p)?);
    }
    if let Some(dim) = opts.max_dimension {
        processor = processor.max_dimension(dim);
    }
    if let Some(q) = opts.quality {
        processor = processor.quality(q);
    }
    if let Some(g) = opts.grayscale {
        processor = processor.grayscale(g);
    }
    if let Some(ref mode) = opts.crop_mode {
        processor = processor.crop_mode(string_to_crop_mode(mode)?);
    }
    if let Some(ref fmt) = opts.format {
        processor = processor.format(string_to_format(fmt)?);
    }
    if let Some(margin) = opts.face_margin {
        processor = processor.face_margin(margin);
    }
    if let Some(oval) = opts.oval {
        processor = processor.oval(oval);
    }
    Ok(processor)
}

/// Build a plain JS object from a `ProcessedPhoto`.
fn build_photo_object(photo: &facecap::ProcessedPhoto) -> Result<JsValue, JsValue> {
    let obj = js_sys::Object::new();
    let data = js_sys::Uint8Array::from(&photo.data[..]);
    js_sys::Reflect::set(&obj, &"data".into(), &data)?;
    js_sys::Reflect::set(
        &obj,
        &"format".into(),
        &JsValue::from_str(format_to_str(&photo.format)),
    )?;
    js_sys::Reflect::set(&obj, &"width".into(), &JsValue::from(photo.width))?;
    js_sys::Reflect::set(&obj, &"height".into(), &JsValue::from(photo.height))?;
    js_sys::Reflect::set(
        &obj,
        &"originalSize".into(),
        &JsValue::from(photo.original_size as u32),
    )?;

    let fb = match photo.face_bounds.as_ref() {
        Some(bounds) => {
            let fb_obj = js_sys::Object::new();
            js_sys::Reflect::set(&fb_obj, &"x".into(), &JsValue::from(bounds.x))?;
            js_sys::Reflect::set(&fb_obj, &"y".into(), &JsValue::from(bounds.y))?;
            js_sys::Reflect::set(&fb_obj, &"width".into(), &JsValue::from(bounds.width))?;
            js_sys::Reflect::set(&fb_obj, &"height".into(), &JsValue::from(bounds.height))?;
            js_sys::Reflect::set(
                &fb_obj,
                &"confidence".into(),
                &JsValue::from(bounds.confidence),
            )?;
            JsValue::from(fb_obj)
        }
        None => JsValue::NULL,
    };
    js_sys::Reflect::set(&obj, &"faceBounds".into(), &fb)?;

    Ok(JsValue::from(obj))
}

/// Compute the framing guidance for one preview frame.
///
/// @param faces - Array of detected face boxes, normalized to the frame:
///   `{x, y, width, height, confidence?}`
/// @param oval - Optional oval target `{centerX, centerY, radiusX, radiusY}`;
///   omit for the stock capture oval
/// @param sensitivity - Optional tolerance multiplier (default 1.0)
///
/// Returns the guidance identifier, e.g. `"hold-still"` or `"move-left"`.
#[wasm_bindgen]
pub fn guide(faces: JsValue, oval: JsValue, sensitivity: Option<f32>) -> Result<String, JsValue> {
    let faces: Vec<FaceBox> = serde_wasm_bindgen::from_value(faces)
        .map_err(|e| make_error("INVALID_FACES", &format!("invalid face list: {e}")))?;

    let oval: OvalTarget = if oval.is_undefined() || oval.is_null() {
        OvalTarget::default()
    } else {
        serde_wasm_bindgen::from_value(oval)
            .map_err(|e| make_error("INVALID_OVAL", &format!("invalid oval: {e}")))?
    };

    Ok(facecap::guide(&faces, &oval, sensitivity).as_str().to_string())
}

/// Process a captured photo with the given options.
///
/// @param input - Raw image bytes (JPEG, PNG, or WebP)
/// @param options - Optional object with fields: preset, maxDimension,
///   quality, grayscale, cropMode, format, faceMargin, oval
#[wasm_bindgen]
pub fn process(input: Vec<u8>, options: JsValue) -> Result<JsValue, JsValue> {
    let opts = parse_options(options)?;

    let processor = facecap::PhotoProcessor::new(input).map_err(to_js_error)?;
    let processor = apply_options(processor, &opts)?;

    let result = processor.process().map_err(to_js_error)?;

    build_photo_object(&result)
}

/// Process a captured photo to land at a byte target.
///
/// Binary-searches the JPEG quality (up to 8 probes) for the largest output
/// that fits `target_bytes`, stopping early once within `tolerance`.
///
/// @param input - Raw image bytes (JPEG, PNG, or WebP)
/// @param target_bytes - Maximum output size in bytes
/// @param tolerance - Optional slack below the target that counts as a hit
///   (default 0)
/// @param options - Optional object with fields: preset, maxDimension,
///   grayscale, cropMode, faceMargin, oval
#[wasm_bindgen(js_name = "processToSize")]
pub fn process_to_size(
    input: Vec<u8>,
    target_bytes: usize,
    tolerance: Option<usize>,
    options: JsValue,
) -> Result<JsValue, JsValue> {
    let opts = parse_options(options)?;

    let processor = facecap::PhotoProcessor::new(input).map_err(to_js_error)?;
    let processor = apply_options(processor, &opts)?;

    let result = processor
        .process_to_size(facecap::SizeTarget {
            bytes: target_bytes,
            tolerance: tolerance.unwrap_or(0),
        })
        .map_err(to_js_error)?;

    let photo_obj = build_photo_object(&result.photo)?;
    let obj = js_sys::Object::new();
    js_sys::Reflect::set(&obj, &"photo".into(), &photo_obj)?;
    js_sys::Reflect::set(
        &obj,
        &"qualityUsed".into(),
        &JsValue::from(result.quality_used),
    )?;
    js_sys::Reflect::set(&obj, &"iterations".into(), &JsValue::from(result.iterations))?;
    js_sys::Reflect::set(
        &obj,
        &"withinTolerance".into(),
        &JsValue::from(result.within_tolerance),
    )?;

    Ok(JsValue::from(obj))
}

/// Segmenter that hands back the mask the JS side computed with its own
/// vision toolkit. The core falls back to the oval matte if the dimensions
/// don't match the frame.
struct ProvidedMask {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl BackgroundSegmenter for ProvidedMask {
    fn segment(&self, _rgba: &[u8], _width: u32, _height: u32) -> Option<SegmentationMask> {
        SegmentationMask::new(self.data.clone(), self.width, self.height).ok()
    }
}

/// Remove the background from a captured photo; output is PNG with alpha.
///
/// @param input - Raw image bytes (JPEG, PNG, or WebP)
/// @param mask - Optional coverage mask from the platform segmenter, one
///   byte per pixel (255 = subject), at the input frame's resolution.
///   Omit to use the elliptical fallback matte.
/// @param mask_width - Mask width in pixels (required with `mask`)
/// @param mask_height - Mask height in pixels (required with `mask`)
/// @param options - Optional object with fields: preset, maxDimension,
///   grayscale, cropMode, faceMargin, oval
#[wasm_bindgen]
pub fn cutout(
    input: Vec<u8>,
    mask: Option<Vec<u8>>,
    mask_width: Option<u32>,
    mask_height: Option<u32>,
    options: JsValue,
) -> Result<JsValue, JsValue> {
    let opts = parse_options(options)?;

    let processor = facecap::PhotoProcessor::new(input).map_err(to_js_error)?;
    let mut processor = apply_options(processor, &opts)?;

    if let Some(data) = mask {
        let (width, height) = match (mask_width, mask_height) {
            (Some(w), Some(h)) => (w, h),
            _ => {
                return Err(make_error(
                    "INVALID_OPTIONS",
                    "mask requires maskWidth and maskHeight",
                ))
            }
        };
        // Reject byte counts that can't possibly be a mask for the claimed
        // dimensions; the core checks the frame match.
        SegmentationMask::new(data.clone(), width, height).map_err(to_js_error)?;
        processor = processor.segmenter(Box::new(ProvidedMask {
            data,
            width,
            height,
        }));
    }

    let result = processor.cutout().map_err(to_js_error)?;

    build_photo_object(&result)
}
