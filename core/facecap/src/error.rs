use thiserror::Error;

#[derive(Debug, Error)]
pub enum FaceCapError {
    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("image dimensions are zero")]
    ZeroDimensions,

    #[error("failed to encode image: {0}")]
    Encode(String),

    #[error("quality must be between 0.0 and 1.0, got {0}")]
    InvalidQuality(f32),

    #[error("max dimension must be > 0")]
    InvalidMaxDimension,

    #[error("mask of {len} bytes does not cover a {width}x{height} frame")]
    InvalidMask { len: usize, width: u32, height: u32 },

    #[error("cannot reach {target} bytes: smallest achievable output is {achieved} bytes")]
    SizeTargetUnreachable { achieved: usize, target: usize },

    #[error("failed to load face detection model: {0}")]
    Model(String),
}
