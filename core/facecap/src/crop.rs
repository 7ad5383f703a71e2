use crate::geometry::OvalTarget;

/// Portrait aspect ratio (width / height) used by the stock presets.
pub(crate) const PORTRAIT_ASPECT: f64 = 3.0 / 4.0;

/// Vertical bias toward the top of the image (faces in upper portion).
/// 0.0 = top, 0.5 = center, 1.0 = bottom.
const VERTICAL_BIAS: f64 = 0.2;

/// Crop region within the source image, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Calculate the largest crop of the given aspect ratio that fits the source.
///
/// Centers horizontally and biases toward the top vertically (20% from top)
/// to capture faces in typical hand-held portrait frames.
pub fn framed_crop(source_width: u32, source_height: u32, aspect: f64) -> CropRegion {
    let (crop_width, crop_height) = if (source_width as f64 / source_height as f64) > aspect {
        // Source is wider than the target aspect — constrain by height
        let h = source_height;
        let w = (h as f64 * aspect).round() as u32;
        (w, h)
    } else {
        // Source is taller than (or equal to) the target aspect — constrain by width
        let w = source_width;
        let h = (w as f64 / aspect).round() as u32;
        (w, h)
    };

    // Center horizontally
    let x = (source_width.saturating_sub(crop_width)) / 2;

    // Bias toward top vertically
    let vertical_slack = source_height.saturating_sub(crop_height);
    let y = (vertical_slack as f64 * VERTICAL_BIAS).round() as u32;

    CropRegion {
        x,
        y,
        width: crop_width,
        height: crop_height,
    }
}

/// Crop region covering the capture oval's bounding rectangle.
///
/// The oval is normalized to the frame; the region is clamped to the image
/// and never degenerates below one pixel.
pub fn oval_crop(source_width: u32, source_height: u32, oval: &OvalTarget) -> CropRegion {
    let w = source_width as f64;
    let h = source_height as f64;

    let left = (oval.left() as f64 * w).floor().max(0.0) as u32;
    let top = (oval.top() as f64 * h).floor().max(0.0) as u32;
    let right = ((oval.right() as f64 * w).ceil() as u32).min(source_width);
    let bottom = ((oval.bottom() as f64 * h).ceil() as u32).min(source_height);

    CropRegion {
        x: left.min(source_width.saturating_sub(1)),
        y: top.min(source_height.saturating_sub(1)),
        width: right.saturating_sub(left).max(1),
        height: bottom.saturating_sub(top).max(1),
    }
}
