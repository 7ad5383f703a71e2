//! Background segmentation bridge and the elliptical fallback mask.
//!
//! Real person segmentation lives in the platform vision toolkits; the core
//! only consumes their output as a coverage mask and degrades to an oval
//! matte when none is available.

use image::RgbaImage;

use crate::error::FaceCapError;
use crate::geometry::OvalTarget;

/// Width of the feathered rim of the fallback oval, as a fraction of the
/// oval radius.
const FEATHER: f32 = 0.06;

/// Per-pixel subject coverage: 255 = subject, 0 = background.
#[derive(Debug, Clone)]
pub struct SegmentationMask {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl SegmentationMask {
    /// Wrap a row-major coverage buffer. The buffer must hold exactly
    /// `width * height` bytes.
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Result<Self, FaceCapError> {
        if data.len() != (width as usize) * (height as usize) {
            return Err(FaceCapError::InvalidMask {
                len: data.len(),
                width,
                height,
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Mask width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Mask height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Coverage value at (x, y).
    pub fn coverage(&self, x: u32, y: u32) -> u8 {
        self.data[(y * self.width + x) as usize]
    }

    /// Whether the mask covers a frame of the given dimensions.
    pub fn matches(&self, width: u32, height: u32) -> bool {
        self.width == width && self.height == height
    }
}

/// Pluggable person segmentation backend.
///
/// Platform shells implement this over their vision toolkits. Returning
/// `None` (failure, no subject found) makes the cutout fall back to the
/// elliptical matte instead of failing the operation.
pub trait BackgroundSegmenter: Send + Sync {
    /// Segment a row-major RGBA buffer of `width` × `height` pixels into a
    /// subject coverage mask of the same dimensions.
    fn segment(&self, rgba: &[u8], width: u32, height: u32) -> Option<SegmentationMask>;
}

/// Elliptical fallback matte: opaque inside the oval, transparent outside,
/// with a short linear feather at the rim.
pub fn oval_mask(width: u32, height: u32, oval: &OvalTarget) -> SegmentationMask {
    let w = width.max(1) as f32;
    let h = height.max(1) as f32;
    let mut data = Vec::with_capacity((width as usize) * (height as usize));

    for y in 0..height {
        for x in 0..width {
            // Normalized radial distance: 1.0 on the oval rim.
            let nx = ((x as f32 + 0.5) / w - oval.center_x) / oval.radius_x;
            let ny = ((y as f32 + 0.5) / h - oval.center_y) / oval.radius_y;
            let r = (nx * nx + ny * ny).sqrt();

            let coverage = if r <= 1.0 - FEATHER {
                255.0
            } else if r >= 1.0 {
                0.0
            } else {
                (1.0 - r) / FEATHER * 255.0
            };
            data.push(coverage.round() as u8);
        }
    }

    SegmentationMask {
        data,
        width,
        height,
    }
}

/// Multiply the image's alpha channel by the mask coverage.
///
/// The mask must match the image dimensions; callers validate or fall back
/// before getting here.
pub(crate) fn apply_mask(image: &mut RgbaImage, mask: &SegmentationMask) {
    debug_assert!(mask.matches(image.width(), image.height()));
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let coverage = mask.coverage(x, y) as u16;
        pixel.0[3] = ((pixel.0[3] as u16 * coverage) / 255) as u8;
    }
}
