use std::path::Path;

use crate::error::FaceCapError;
use crate::face_detector::{FaceBounds, FaceDetector};

/// SeetaFace detection scores roughly span 0–30; anything at or above this
/// is treated as fully confident when mapping to [0,1].
const SCORE_CEILING: f64 = 10.0;

/// Face detector backed by the `rustface` crate (SeetaFace engine).
///
/// For shells that have no platform detector of their own. The model file is
/// loaded at construction; pass the path where the deployment ships
/// `seeta_fd_frontal_v1.0.bin`.
pub struct RustfaceDetector {
    model: rustface::Model,
}

impl RustfaceDetector {
    /// Load the SeetaFace model from the given path.
    pub fn load(model_path: impl AsRef<Path>) -> Result<Self, FaceCapError> {
        let path = model_path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| FaceCapError::Model(format!("{}: {e}", path.display())))?;
        let model = rustface::read_model(std::io::Cursor::new(bytes))
            .map_err(|e| FaceCapError::Model(format!("{}: {e}", path.display())))?;
        Ok(Self { model })
    }
}

impl FaceDetector for RustfaceDetector {
    fn detect(&self, gray: &[u8], width: u32, height: u32) -> Vec<FaceBounds> {
        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(20);
        detector.set_score_thresh(2.0);
        detector.set_pyramid_scale_factor(0.8);
        detector.set_slide_window_step(4, 4);

        let faces = detector.detect(&rustface::ImageData::new(gray, width, height));

        faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                FaceBounds {
                    x: bbox.x() as f64,
                    y: bbox.y() as f64,
                    width: bbox.width() as f64,
                    height: bbox.height() as f64,
                    confidence: (face.score() / SCORE_CEILING).clamp(0.0, 1.0),
                }
            })
            .collect()
    }
}
