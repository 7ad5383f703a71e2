//! Normalized frame geometry shared by the guidance calculator and the shells.
//!
//! All coordinates are in [0,1] relative to the frame dimensions, so a face
//! detected on a preview frame can be judged against an oval drawn on a
//! differently-sized screen without conversion.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A detected face rectangle, normalized to the frame dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceBox {
    /// X coordinate of the top-left corner, in [0,1].
    pub x: f32,
    /// Y coordinate of the top-left corner, in [0,1].
    pub y: f32,
    /// Width in [0,1].
    pub width: f32,
    /// Height in [0,1].
    pub height: f32,
    /// Detection confidence in [0,1]. Defaults to 1.0 when the detector
    /// does not report one.
    #[serde(default = "full_confidence")]
    pub confidence: f32,
}

fn full_confidence() -> f32 {
    1.0
}

impl FaceBox {
    /// Center point of the box.
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// The on-screen oval the user's face should fill, normalized to the frame.
///
/// Fixed for the duration of a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OvalTarget {
    /// Horizontal center, in [0,1].
    pub center_x: f32,
    /// Vertical center, in [0,1].
    pub center_y: f32,
    /// Horizontal radius, in [0,1].
    pub radius_x: f32,
    /// Vertical radius, in [0,1].
    pub radius_y: f32,
}

impl OvalTarget {
    /// Left edge of the oval's bounding rectangle.
    pub fn left(&self) -> f32 {
        self.center_x - self.radius_x
    }

    /// Right edge of the oval's bounding rectangle.
    pub fn right(&self) -> f32 {
        self.center_x + self.radius_x
    }

    /// Top edge of the oval's bounding rectangle.
    pub fn top(&self) -> f32 {
        self.center_y - self.radius_y
    }

    /// Bottom edge of the oval's bounding rectangle.
    pub fn bottom(&self) -> f32 {
        self.center_y + self.radius_y
    }

    /// An oval inscribed in the frame with a small margin. Used as the
    /// fallback cutout shape when no segmentation mask is available.
    pub fn inscribed() -> Self {
        Self {
            center_x: 0.5,
            center_y: 0.5,
            radius_x: 0.46,
            radius_y: 0.46,
        }
    }
}

impl Default for OvalTarget {
    /// The stock capture oval: centered horizontally, slightly above the
    /// vertical center, portrait proportions.
    fn default() -> Self {
        Self {
            center_x: 0.5,
            center_y: 0.45,
            radius_x: 0.3,
            radius_y: 0.4,
        }
    }
}

/// Directional instruction shown to the user while framing their face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Guidance {
    NoFace,
    MoveCloser,
    MoveBack,
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    HoldStill,
    MultipleFaces,
}

impl Guidance {
    /// Kebab-case identifier the shells use for display lookup.
    pub fn as_str(&self) -> &'static str {
        match self {
            Guidance::NoFace => "no-face",
            Guidance::MoveCloser => "move-closer",
            Guidance::MoveBack => "move-back",
            Guidance::MoveLeft => "move-left",
            Guidance::MoveRight => "move-right",
            Guidance::MoveUp => "move-up",
            Guidance::MoveDown => "move-down",
            Guidance::HoldStill => "hold-still",
            Guidance::MultipleFaces => "multiple-faces",
        }
    }
}

impl fmt::Display for Guidance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
