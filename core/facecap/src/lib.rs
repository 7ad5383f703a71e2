//! Guided face capture: framing guidance, crop/resize/compress, and
//! background cutout for camera capture shells.
//!
//! # Example
//!
//! ```no_run
//! use facecap::{guide, FaceBox, OvalTarget, PhotoProcessor};
//!
//! // Per preview frame: tell the user how to move.
//! let detections = vec![FaceBox { x: 0.3, y: 0.25, width: 0.4, height: 0.4, confidence: 0.9 }];
//! let hint = guide(&detections, &OvalTarget::default(), None);
//! println!("guidance: {hint}");
//!
//! // On capture: crop, resize, and compress the photo.
//! let raw_bytes = std::fs::read("capture.jpg").unwrap();
//! let result = PhotoProcessor::new(raw_bytes)
//!     .unwrap()
//!     .max_dimension(480)
//!     .quality(0.85)
//!     .process()
//!     .unwrap();
//! println!("processed: {} bytes", result.data.len());
//! ```
#![warn(missing_docs)]

mod compress;
mod crop;
mod error;
/// Face detection bridge trait and data types.
pub mod face_detector;
/// Normalized frame geometry: face boxes, the oval target, guidance values.
pub mod geometry;
/// The framing guidance calculator.
pub mod guidance;
#[cfg(feature = "rustface")]
/// Built-in SeetaFace-based face detector backend.
pub mod rustface_backend;
/// Background segmentation bridge and the elliptical fallback mask.
pub mod segmenter;

/// Error type returned by facecap operations.
pub use error::FaceCapError;
/// Face detection trait and pixel-space bounding box.
pub use face_detector::{FaceBounds, FaceDetector};
/// Normalized geometry types used across the API.
pub use geometry::{FaceBox, Guidance, OvalTarget};
/// Per-frame framing guidance.
pub use guidance::{guide, DEFAULT_SENSITIVITY};
#[cfg(feature = "rustface")]
/// Built-in detector that loads a SeetaFace model from disk.
pub use rustface_backend::RustfaceDetector;
/// Background segmentation trait, mask type, and the oval fallback.
pub use segmenter::{oval_mask, BackgroundSegmenter, SegmentationMask};

use crop::PORTRAIT_ASPECT;

/// How to crop the captured frame before resizing.
#[derive(Debug, Clone, Default)]
pub enum CropMode {
    /// Use face detection to frame the subject, with fallback to `Framed`.
    #[default]
    FaceDetection,

    /// Largest aspect-true crop, upper-center bias — reasonable framing when
    /// nothing is known about the frame.
    Framed,

    /// The bounding rectangle of the session's capture oval — the region the
    /// user centered their face in.
    Oval,

    /// No crop — resize maintaining the original aspect ratio.
    None,
}

/// Output image format.
#[derive(Debug, Clone, Default)]
pub enum OutputFormat {
    /// JPEG encoding; alpha is flattened over white.
    #[default]
    Jpeg,

    /// PNG encoding; preserves the alpha channel (background cutouts).
    Png,
}

/// Result of a single capture-processing operation.
#[derive(Debug, Clone)]
pub struct ProcessedPhoto {
    /// The encoded image bytes.
    pub data: Vec<u8>,

    /// The output format used.
    pub format: OutputFormat,

    /// Width of the output image in pixels.
    pub width: u32,

    /// Height of the output image in pixels.
    pub height: u32,

    /// Size of the original input in bytes.
    pub original_size: usize,

    /// Bounding box of the detected face in output image coordinates, if
    /// face detection ran and found one.
    pub face_bounds: Option<FaceBounds>,
}

/// Byte-size goal for [`PhotoProcessor::process_to_size`].
#[derive(Debug, Clone, Copy)]
pub struct SizeTarget {
    /// The output must not exceed this many bytes.
    pub bytes: usize,

    /// How far below `bytes` still counts as hitting the target; the search
    /// stops early once inside this band.
    pub tolerance: usize,
}

/// Result of a `process_to_size` operation.
#[derive(Debug, Clone)]
pub struct FitResult {
    /// The processed photo, no larger than the requested byte target.
    pub photo: ProcessedPhoto,

    /// The quality level used (0.0–1.0).
    pub quality_used: f32,

    /// How many encoder probes the search ran.
    pub iterations: u32,

    /// Whether the output landed inside the tolerance band, rather than just
    /// somewhere below the target.
    pub within_tolerance: bool,
}

/// Pre-configured settings for the app's stock outputs.
///
/// Apply a preset with [`PhotoProcessor::preset`], then override individual
/// settings as needed. Presets set all parameters — any `.preset()` call
/// replaces the full configuration.
#[derive(Debug, Clone)]
pub enum Preset {
    /// Square avatar for profile pictures.
    ///
    /// - 256px max dimension, 1:1 crop
    /// - JPEG at quality 0.85
    /// - Face detection crop, tight framing
    Avatar,

    /// 3:4 portrait for documents and verification flows.
    ///
    /// - 480px max dimension (3:4 portrait → 360×480)
    /// - JPEG at quality 0.85
    /// - Face detection crop, full framing (face + hair + shoulders)
    Portrait,

    /// Small 3:4 thumbnail for lists and history views.
    ///
    /// - 96px max dimension
    /// - JPEG at quality 0.7
    /// - Face detection crop, full framing
    Thumbnail,
}

/// Full face margin (face + hair + shoulders).
const FACE_MARGIN_PORTRAIT: f32 = 2.0;

/// Tight face margin for avatar crops.
const FACE_MARGIN_TIGHT: f32 = 1.4;

/// Quality bounds and iteration cap for the size-targeting search.
const FIT_QUALITY_FLOOR: f32 = 0.1;
const FIT_QUALITY_CEILING: f32 = 1.0;
const FIT_MAX_ITERATIONS: u32 = 8;

/// Builder for processing captured photos.
///
/// Validates the input image on construction, then applies crop, resize,
/// and compression with configurable parameters.
pub struct PhotoProcessor {
    input: Vec<u8>,
    max_dimension: u32,
    quality: f32,
    grayscale: bool,
    crop_mode: CropMode,
    format: OutputFormat,
    /// Multiplier for face-detection crop: crop_height = face_height × face_margin.
    face_margin: f32,
    /// Width/height ratio for the `Framed` and `FaceDetection` crops.
    crop_aspect: f64,
    /// The session's capture oval, used by `CropMode::Oval` and as the
    /// fallback cutout shape.
    oval: OvalTarget,
    detector: Option<Box<dyn FaceDetector>>,
    segmenter: Option<Box<dyn BackgroundSegmenter>>,
}

impl PhotoProcessor {
    /// Create a new processor from raw image bytes (JPEG, PNG, or WebP).
    pub fn new(input: Vec<u8>) -> Result<Self, FaceCapError> {
        // Validate that the input can be decoded
        compress::detect_format(&input)?;

        Ok(Self {
            input,
            max_dimension: 480,
            quality: 0.85,
            grayscale: false,
            crop_mode: CropMode::default(),
            format: OutputFormat::default(),
            face_margin: FACE_MARGIN_PORTRAIT,
            crop_aspect: PORTRAIT_ASPECT,
            oval: OvalTarget::default(),
            detector: None,
            segmenter: None,
        })
    }

    /// Apply a preset configuration. Individual settings can be overridden
    /// after this call.
    pub fn preset(mut self, preset: Preset) -> Self {
        match preset {
            Preset::Avatar => {
                self.max_dimension = 256;
                self.quality = 0.85;
                self.grayscale = false;
                self.crop_mode = CropMode::FaceDetection;
                self.face_margin = FACE_MARGIN_TIGHT;
                self.crop_aspect = 1.0;
                self.format = OutputFormat::Jpeg;
            }
            Preset::Portrait => {
                self.max_dimension = 480;
                self.quality = 0.85;
                self.grayscale = false;
                self.crop_mode = CropMode::FaceDetection;
                self.face_margin = FACE_MARGIN_PORTRAIT;
                self.crop_aspect = PORTRAIT_ASPECT;
                self.format = OutputFormat::Jpeg;
            }
            Preset::Thumbnail => {
                self.max_dimension = 96;
                self.quality = 0.7;
                self.grayscale = false;
                self.crop_mode = CropMode::FaceDetection;
                self.face_margin = FACE_MARGIN_PORTRAIT;
                self.crop_aspect = PORTRAIT_ASPECT;
                self.format = OutputFormat::Jpeg;
            }
        }
        self
    }

    /// Set the maximum output dimension in pixels (default: 480).
    ///
    /// The larger output dimension is constrained to this value; the source
    /// is never upscaled.
    pub fn max_dimension(mut self, dimension: u32) -> Self {
        self.max_dimension = dimension;
        self
    }

    /// Set the compression quality from 0.0 (lowest) to 1.0 (highest).
    /// Default: 0.85. Applies to JPEG output only.
    pub fn quality(mut self, quality: f32) -> Self {
        self.quality = quality;
        self
    }

    /// Enable or disable grayscale conversion (default: false).
    pub fn grayscale(mut self, enable: bool) -> Self {
        self.grayscale = enable;
        self
    }

    /// Set the crop mode (default: `CropMode::FaceDetection`).
    pub fn crop_mode(mut self, mode: CropMode) -> Self {
        self.crop_mode = mode;
        self
    }

    /// Set the output format (default: `OutputFormat::Jpeg`).
    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the face detection crop margin (default: 2.0).
    ///
    /// Controls how tightly the face-detection crop frames the face.
    /// The crop height is `face_height × margin`.
    ///
    /// - `2.0` — full framing: face + hair + shoulders
    /// - `1.4` — tight avatar crop
    pub fn face_margin(mut self, margin: f32) -> Self {
        self.face_margin = margin;
        self
    }

    /// Set the session's capture oval (default: [`OvalTarget::default`]).
    ///
    /// Used by `CropMode::Oval` and as the fallback cutout shape.
    pub fn oval(mut self, oval: OvalTarget) -> Self {
        self.oval = oval;
        self
    }

    /// Provide the platform face detector.
    ///
    /// When set, `CropMode::FaceDetection` uses this detector; without one
    /// it falls back to the `Framed` heuristic.
    pub fn face_detector(mut self, detector: Box<dyn FaceDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    /// Provide the platform background segmenter.
    ///
    /// Used by [`cutout`](Self::cutout). Without one, or when segmentation
    /// fails, the cutout uses the elliptical fallback mask.
    pub fn segmenter(mut self, segmenter: Box<dyn BackgroundSegmenter>) -> Self {
        self.segmenter = Some(segmenter);
        self
    }

    fn validate(&self) -> Result<(), FaceCapError> {
        if self.max_dimension == 0 {
            return Err(FaceCapError::InvalidMaxDimension);
        }
        if !(0.0..=1.0).contains(&self.quality) {
            return Err(FaceCapError::InvalidQuality(self.quality));
        }
        Ok(())
    }

    fn settings(&self) -> compress::PipelineSettings<'_> {
        compress::PipelineSettings {
            max_dimension: self.max_dimension,
            quality: self.quality,
            grayscale: self.grayscale,
            crop_mode: &self.crop_mode,
            format: &self.format,
            face_margin: self.face_margin,
            crop_aspect: self.crop_aspect,
            oval: &self.oval,
            detector: self.detector.as_deref(),
        }
    }

    /// Process the capture with the configured settings.
    pub fn process(self) -> Result<ProcessedPhoto, FaceCapError> {
        self.validate()?;
        compress::process_pipeline(&self.input, &self.settings())
    }

    /// Binary-search the JPEG quality to land the output at a byte target.
    ///
    /// Runs at most 8 probes over quality 0.1–1.0, keeps the best result
    /// that fits under `target.bytes`, and stops early once the output is
    /// within `target.tolerance` of the target. Always encodes JPEG — PNG
    /// has no quality parameter to search.
    ///
    /// Errors with [`FaceCapError::SizeTargetUnreachable`] when even the
    /// quality floor produces more than `target.bytes` bytes.
    pub fn process_to_size(self, target: SizeTarget) -> Result<FitResult, FaceCapError> {
        if self.max_dimension == 0 {
            return Err(FaceCapError::InvalidMaxDimension);
        }

        let mut settings = self.settings();
        settings.format = &OutputFormat::Jpeg;

        let mut low = FIT_QUALITY_FLOOR;
        let mut high = FIT_QUALITY_CEILING;
        let mut best: Option<(ProcessedPhoto, f32)> = None;
        let mut iterations = 0;

        for _ in 0..FIT_MAX_ITERATIONS {
            let mid = (low + high) / 2.0;
            settings.quality = mid;
            let photo = compress::process_pipeline(&self.input, &settings)?;
            iterations += 1;

            let size = photo.data.len();
            tracing::debug!(quality = mid, bytes = size, target = target.bytes, "fit probe");

            if size <= target.bytes {
                let gap = target.bytes - size;
                if best
                    .as_ref()
                    .map_or(true, |(b, _)| size > b.data.len())
                {
                    best = Some((photo, mid));
                }
                if gap <= target.tolerance {
                    break;
                }
                low = mid;
            } else {
                high = mid;
            }
        }

        // Binary search converges toward the floor without ever probing it;
        // give the floor itself the last word before declaring failure.
        let (photo, quality_used) = match best {
            Some(found) => found,
            None => {
                settings.quality = FIT_QUALITY_FLOOR;
                let photo = compress::process_pipeline(&self.input, &settings)?;
                iterations += 1;
                if photo.data.len() > target.bytes {
                    return Err(FaceCapError::SizeTargetUnreachable {
                        achieved: photo.data.len(),
                        target: target.bytes,
                    });
                }
                (photo, FIT_QUALITY_FLOOR)
            }
        };
        let within_tolerance = target.bytes - photo.data.len() <= target.tolerance;

        Ok(FitResult {
            photo,
            quality_used,
            iterations,
            within_tolerance,
        })
    }

    /// Remove the background and encode the result as PNG with transparency.
    ///
    /// Uses the configured segmenter when one is set; otherwise, or when
    /// segmentation fails, applies the elliptical fallback mask shaped by
    /// the session oval.
    pub fn cutout(self) -> Result<ProcessedPhoto, FaceCapError> {
        self.validate()?;
        compress::cutout_pipeline(&self.input, &self.settings(), self.segmenter.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_png(width: u32, height: u32) -> Vec<u8> {
        use image::codecs::png::PngEncoder;
        use image::ImageEncoder;
        use image::RgbImage;

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
    fn builder_defaults() {
        let png = make_test_png(200, 300);
        let result = PhotoProcessor::new(png).unwrap().process().unwrap();
        assert!(!result.data.is_empty());
        // Default crop falls back to framed 3:4 (no detector): 200x267,
        // which is under the 480 limit, so no resize happens.
        assert_eq!(result.width, 200);
        assert_eq!(result.height, 267);
    }

    #[test]
    fn builder_with_png_format() {
        let png = make_test_png(200, 300);
        let result = PhotoProcessor::new(png)
            .unwrap()
            .format(OutputFormat::Png)
            .process()
            .unwrap();
        assert_eq!(&result.data[1..4], b"PNG");
    }

    #[test]
    fn builder_with_grayscale() {
        let png = make_test_png(200, 300);
        let result = PhotoProcessor::new(png)
            .unwrap()
            .grayscale(true)
            .process()
            .unwrap();
        assert!(!result.data.is_empty());
    }

    #[test]
    fn builder_with_no_crop() {
        let png = make_test_png(200, 300);
        let result = PhotoProcessor::new(png)
            .unwrap()
            .crop_mode(CropMode::None)
            .max_dimension(64)
            .process()
            .unwrap();
        // 200x300 → constrain to 64: height=64, width=43
        assert_eq!(result.height, 64);
        assert_eq!(result.width, 43);
    }

    #[test]
    fn builder_invalid_quality_high() {
        let png = make_test_png(100, 100);
        let result = PhotoProcessor::new(png).unwrap().quality(1.5).process();
        assert!(matches!(result, Err(FaceCapError::InvalidQuality(_))));
    }

    #[test]
    fn builder_invalid_quality_low() {
        let png = make_test_png(100, 100);
        let result = PhotoProcessor::new(png).unwrap().quality(-0.1).process();
        assert!(result.is_err());
    }

    #[test]
    fn builder_zero_max_dimension() {
        let png = make_test_png(100, 100);
        let result = PhotoProcessor::new(png)
            .unwrap()
            .max_dimension(0)
            .process();
        assert!(matches!(result, Err(FaceCapError::InvalidMaxDimension)));
    }

    #[test]
    fn builder_invalid_input() {
        let result = PhotoProcessor::new(b"not an image".to_vec());
        assert!(result.is_err());
    }

    #[test]
    fn original_size_is_preserved() {
        let png = make_test_png(200, 300);
        let original_len = png.len();
        let result = PhotoProcessor::new(png).unwrap().process().unwrap();
        assert_eq!(result.original_size, original_len);
    }

    #[test]
    fn process_to_size_fits_budget() {
        let png = make_test_png(200, 300);
        let result = PhotoProcessor::new(png)
            .unwrap()
            .max_dimension(48)
            .process_to_size(SizeTarget {
                bytes: 10_000,
                tolerance: 0,
            })
            .unwrap();
        assert!(result.photo.data.len() <= 10_000);
        assert!(result.quality_used > 0.0);
        assert!(result.iterations <= FIT_MAX_ITERATIONS + 1);
    }

    #[test]
    fn process_to_size_stops_early_inside_tolerance() {
        let png = make_test_png(200, 300);
        let result = PhotoProcessor::new(png)
            .unwrap()
            .max_dimension(48)
            .process_to_size(SizeTarget {
                bytes: 50_000,
                tolerance: 50_000,
            })
            .unwrap();
        // The first probe is inside the tolerance band; the search must not
        // keep going.
        assert!(result.within_tolerance);
        assert_eq!(result.iterations, 1);
    }

    #[test]
    fn process_to_size_impossible_target_errors() {
        let png = make_test_png(200, 300);
        let result = PhotoProcessor::new(png)
            .unwrap()
            .max_dimension(48)
            .process_to_size(SizeTarget {
                bytes: 1,
                tolerance: 0,
            });
        match result {
            Err(FaceCapError::SizeTargetUnreachable { achieved, target }) => {
                assert!(achieved > 1);
                assert_eq!(target, 1);
            }
            other => panic!("expected SizeTargetUnreachable, got {other:?}"),
        }
    }

    #[test]
    fn process_to_size_always_encodes_jpeg() {
        let png = make_test_png(200, 300);
        let result = PhotoProcessor::new(png)
            .unwrap()
            .max_dimension(48)
            .format(OutputFormat::Png)
            .process_to_size(SizeTarget {
                bytes: 10_000,
                tolerance: 0,
            })
            .unwrap();
        assert_eq!(result.photo.data[0], 0xFF);
        assert_eq!(result.photo.data[1], 0xD8);
    }

    #[test]
    fn preset_avatar_is_square() {
        let png = make_test_png(200, 300);
        let result = PhotoProcessor::new(png)
            .unwrap()
            .preset(Preset::Avatar)
            .process()
            .unwrap();
        // No detector → framed 1:1 crop of a 200x300 source → 200x200
        assert_eq!(result.width, result.height);
        assert_eq!(result.data[0], 0xFF);
        assert_eq!(result.data[1], 0xD8);
    }

    #[test]
    fn preset_thumbnail_is_small() {
        let png = make_test_png(400, 600);
        let result = PhotoProcessor::new(png)
            .unwrap()
            .preset(Preset::Thumbnail)
            .process()
            .unwrap();
        assert!(result.width <= 96);
        assert!(result.height <= 96);
    }

    #[test]
    fn preset_can_be_overridden() {
        let png = make_test_png(200, 300);
        let result = PhotoProcessor::new(png)
            .unwrap()
            .preset(Preset::Portrait)
            .format(OutputFormat::Png)
            .process()
            .unwrap();
        // PNG despite the Portrait preset's JPEG default
        assert_eq!(&result.data[1..4], b"PNG");
    }

    #[test]
    fn preset_thumbnail_smaller_than_portrait() {
        let png = make_test_png(400, 600);

        let thumb = PhotoProcessor::new(png.clone())
            .unwrap()
            .preset(Preset::Thumbnail)
            .process()
            .unwrap();

        let portrait = PhotoProcessor::new(png)
            .unwrap()
            .preset(Preset::Portrait)
            .process()
            .unwrap();

        assert!(
            thumb.data.len() < portrait.data.len(),
            "thumbnail ({} bytes) should be smaller than portrait ({} bytes)",
            thumb.data.len(),
            portrait.data.len()
        );
    }

    #[test]
    fn cutout_produces_transparent_png() {
        let png = make_test_png(64, 64);
        let result = PhotoProcessor::new(png)
            .unwrap()
            .crop_mode(CropMode::None)
            .max_dimension(64)
            .cutout()
            .unwrap();
        assert!(matches!(result.format, OutputFormat::Png));
        let decoded = image::load_from_memory(&result.data).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(0, 0).0[3], 0);
    }
}
