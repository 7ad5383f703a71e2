//! Face-framing guidance.
//!
//! Maps the per-frame detection result against the session's oval target and
//! produces the directional instruction the shells display. Pure arithmetic
//! on normalized coordinates; recomputed on every preview frame.

use crate::geometry::{FaceBox, Guidance, OvalTarget};

/// Neutral sensitivity. Higher values tolerate more deviation before the
/// calculator asks for a correction.
pub const DEFAULT_SENSITIVITY: f32 = 1.0;

/// Detections scoring below this are treated as noise.
const CONFIDENCE_FLOOR: f32 = 0.3;

/// Head-extent padding as fractions of the raw face box. Detectors return a
/// tight box around the facial features; the visible head extends well above
/// it (hair) and slightly past the sides and chin.
const PAD_TOP: f32 = 0.35;
const PAD_SIDE: f32 = 0.08;
const PAD_BOTTOM: f32 = 0.08;

/// Acceptable band for head height relative to oval height, at sensitivity 1.
const SIZE_RATIO_LOW: f32 = 0.72;
const SIZE_RATIO_HIGH: f32 = 1.12;

/// Maximum head-center offset from the oval center, at sensitivity 1.
const CENTER_TOLERANCE: f32 = 0.05;

/// Compute the framing instruction for one preview frame.
///
/// `detections` is whatever the detection bridge produced for the frame,
/// already normalized to frame coordinates. Zero usable detections yield
/// [`Guidance::NoFace`], more than one yields [`Guidance::MultipleFaces`].
/// `sensitivity` widens (`> 1.0`) or narrows (`< 1.0`) the acceptance bands;
/// `None` means [`DEFAULT_SENSITIVITY`].
pub fn guide(detections: &[FaceBox], oval: &OvalTarget, sensitivity: Option<f32>) -> Guidance {
    let sensitivity = sensitivity
        .unwrap_or(DEFAULT_SENSITIVITY)
        .clamp(0.25, 4.0);

    let mut usable = detections
        .iter()
        .filter(|f| f.confidence >= CONFIDENCE_FLOOR);

    let face = match usable.next() {
        None => return Guidance::NoFace,
        Some(face) => {
            if usable.next().is_some() {
                return Guidance::MultipleFaces;
            }
            face
        }
    };

    let decision = judge_face(face, oval, sensitivity);
    tracing::trace!(guidance = decision.as_str(), "framing decision");
    decision
}

fn judge_face(face: &FaceBox, oval: &OvalTarget, sensitivity: f32) -> Guidance {
    let head = head_extent(face);

    // Distance first: a face at the wrong scale makes positional hints
    // meaningless.
    let ratio = (head.bottom - head.top) / (2.0 * oval.radius_y);
    let ratio_low = 1.0 - (1.0 - SIZE_RATIO_LOW) * sensitivity;
    let ratio_high = 1.0 + (SIZE_RATIO_HIGH - 1.0) * sensitivity;
    if ratio < ratio_low {
        return Guidance::MoveCloser;
    }
    if ratio > ratio_high {
        return Guidance::MoveBack;
    }

    // Per-edge overflow outside the oval's bounding rectangle. Order is the
    // tie-break: earlier edges win equal overflows.
    let overflows = [
        (oval.left() - head.left, Guidance::MoveRight),
        (head.right - oval.right(), Guidance::MoveLeft),
        (oval.top() - head.top, Guidance::MoveDown),
        (head.bottom - oval.bottom(), Guidance::MoveUp),
    ];
    let mut worst: Option<(f32, Guidance)> = None;
    for (amount, correction) in overflows {
        if amount > 0.0 && worst.map_or(true, |(w, _)| amount > w) {
            worst = Some((amount, correction));
        }
    }
    if let Some((_, correction)) = worst {
        return correction;
    }

    // Inside the oval: nudge toward the center, on the axis that is
    // further off.
    let center_tolerance = CENTER_TOLERANCE * sensitivity;
    let (head_cx, head_cy) = (
        (head.left + head.right) / 2.0,
        (head.top + head.bottom) / 2.0,
    );
    let dx = head_cx - oval.center_x;
    let dy = head_cy - oval.center_y;
    if dx.abs().max(dy.abs()) > center_tolerance {
        return if dx.abs() >= dy.abs() {
            if dx > 0.0 {
                Guidance::MoveLeft
            } else {
                Guidance::MoveRight
            }
        } else if dy > 0.0 {
            Guidance::MoveUp
        } else {
            Guidance::MoveDown
        };
    }

    Guidance::HoldStill
}

/// Approximate head extent, clamped to the frame.
struct HeadExtent {
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
}

fn head_extent(face: &FaceBox) -> HeadExtent {
    HeadExtent {
        left: (face.x - face.width * PAD_SIDE).max(0.0),
        top: (face.y - face.height * PAD_TOP).max(0.0),
        right: (face.x + face.width * (1.0 + PAD_SIDE)).min(1.0),
        bottom: (face.y + face.height * (1.0 + PAD_BOTTOM)).min(1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a face whose padded head box has the given height ratio to the
    /// oval and whose head center sits at (cx, cy). The inverse of
    /// `head_extent`, so tests can state intent in head coordinates.
    fn face_at(oval: &OvalTarget, ratio: f32, cx: f32, cy: f32) -> FaceBox {
        let head_h = ratio * 2.0 * oval.radius_y;
        let height = head_h / (1.0 + PAD_TOP + PAD_BOTTOM);
        // Head width roughly three quarters of its height.
        let head_w = head_h * 0.75;
        let width = head_w / (1.0 + 2.0 * PAD_SIDE);
        let head_top = cy - head_h / 2.0;
        let head_left = cx - head_w / 2.0;
        FaceBox {
            x: head_left + width * PAD_SIDE,
            y: head_top + height * PAD_TOP,
            width,
            height,
            confidence: 0.95,
        }
    }

    fn oval() -> OvalTarget {
        OvalTarget::default()
    }

    #[test]
    fn empty_detections_is_no_face() {
        assert_eq!(guide(&[], &oval(), None), Guidance::NoFace);
    }

    #[test]
    fn low_confidence_detections_are_ignored() {
        let mut face = face_at(&oval(), 0.9, 0.5, 0.45);
        face.confidence = 0.1;
        assert_eq!(guide(&[face], &oval(), None), Guidance::NoFace);
    }

    #[test]
    fn two_faces_is_multiple_faces() {
        let o = oval();
        let a = face_at(&o, 0.9, 0.35, 0.45);
        let b = face_at(&o, 0.9, 0.65, 0.45);
        assert_eq!(guide(&[a, b], &o, None), Guidance::MultipleFaces);
    }

    #[test]
    fn one_confident_among_noise_is_judged_alone() {
        let o = oval();
        let face = face_at(&o, 0.9, 0.5, 0.45);
        let mut noise = face_at(&o, 0.3, 0.2, 0.2);
        noise.confidence = 0.05;
        assert_eq!(guide(&[noise, face], &o, None), Guidance::HoldStill);
    }

    #[test]
    fn centered_and_sized_face_holds_still() {
        let o = oval();
        let face = face_at(&o, 0.92, o.center_x, o.center_y);
        assert_eq!(guide(&[face], &o, None), Guidance::HoldStill);
    }

    #[test]
    fn small_face_moves_closer() {
        let o = oval();
        let face = face_at(&o, 0.4, o.center_x, o.center_y);
        assert_eq!(guide(&[face], &o, None), Guidance::MoveCloser);
    }

    #[test]
    fn oversized_face_moves_back() {
        let o = oval();
        let face = face_at(&o, 1.3, o.center_x, o.center_y);
        assert_eq!(guide(&[face], &o, None), Guidance::MoveBack);
    }

    #[test]
    fn overflow_left_edge_moves_right() {
        let o = oval();
        // Head pushed past the left edge of the oval but still well sized.
        let face = face_at(&o, 0.9, o.left() + 0.13, o.center_y);
        assert_eq!(guide(&[face], &o, None), Guidance::MoveRight);
    }

    #[test]
    fn overflow_right_edge_moves_left() {
        let o = oval();
        let face = face_at(&o, 0.9, o.right() - 0.13, o.center_y);
        assert_eq!(guide(&[face], &o, None), Guidance::MoveLeft);
    }

    #[test]
    fn overflow_top_edge_moves_down() {
        let o = oval();
        let face = face_at(&o, 0.9, o.center_x, o.top() + 0.25);
        assert_eq!(guide(&[face], &o, None), Guidance::MoveDown);
    }

    #[test]
    fn overflow_bottom_edge_moves_up() {
        let o = oval();
        let face = face_at(&o, 0.9, o.center_x, o.bottom() - 0.25);
        assert_eq!(guide(&[face], &o, None), Guidance::MoveUp);
    }

    #[test]
    fn equal_left_right_overflow_breaks_toward_left_edge() {
        let o = oval();
        // A head wider than the oval, centered: both side overflows are
        // equal, so the left edge wins and the correction is MoveRight.
        let head_h = 0.9 * 2.0 * o.radius_y;
        let height = head_h / (1.0 + PAD_TOP + PAD_BOTTOM);
        let head_w = 2.0 * o.radius_x + 0.1;
        let width = head_w / (1.0 + 2.0 * PAD_SIDE);
        let face = FaceBox {
            x: o.center_x - head_w / 2.0 + width * PAD_SIDE,
            y: o.center_y - head_h / 2.0 + height * PAD_TOP,
            width,
            height,
            confidence: 0.9,
        };
        assert_eq!(guide(&[face], &o, None), Guidance::MoveRight);
    }

    #[test]
    fn off_center_right_inside_oval_moves_left() {
        let o = oval();
        // Small enough to clear every oval edge, but right of center by more
        // than the tolerance.
        let face = face_at(&o, 0.73, o.center_x + 0.07, o.center_y);
        assert_eq!(guide(&[face], &o, None), Guidance::MoveLeft);
    }

    #[test]
    fn off_center_corrects_larger_axis_first() {
        let o = oval();
        // Offset on both axes; the vertical one is larger.
        let face = face_at(&o, 0.73, o.center_x + 0.06, o.center_y - 0.10);
        assert_eq!(guide(&[face], &o, None), Guidance::MoveDown);
    }

    #[test]
    fn higher_sensitivity_tolerates_offset() {
        let o = oval();
        let face = face_at(&o, 0.73, o.center_x + 0.07, o.center_y);
        assert_eq!(guide(&[face], &o, None), Guidance::MoveLeft);
        assert_eq!(guide(&[face], &o, Some(2.0)), Guidance::HoldStill);
    }

    #[test]
    fn higher_sensitivity_widens_size_band() {
        let o = oval();
        let face = face_at(&o, 0.6, o.center_x, o.center_y);
        assert_eq!(guide(&[face], &o, None), Guidance::MoveCloser);
        assert_eq!(guide(&[face], &o, Some(2.0)), Guidance::HoldStill);
    }

    #[test]
    fn head_extent_pads_more_on_top() {
        let face = FaceBox {
            x: 0.4,
            y: 0.4,
            width: 0.2,
            height: 0.2,
            confidence: 1.0,
        };
        let head = head_extent(&face);
        let above = face.y - head.top;
        let below = head.bottom - (face.y + face.height);
        assert!(above > below, "hair padding should exceed chin padding");
    }

    #[test]
    fn head_extent_clamps_to_frame() {
        let face = FaceBox {
            x: 0.0,
            y: 0.0,
            width: 0.5,
            height: 0.5,
            confidence: 1.0,
        };
        let head = head_extent(&face);
        assert_eq!(head.left, 0.0);
        assert_eq!(head.top, 0.0);
    }
}
