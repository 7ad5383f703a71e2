uniffi::setup_scaffolding!();

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum FaceCapError {
    #[error("failed to decode image: {message}")]
    DecodeError { message: String },
    #[error("image dimensions are zero")]
    ZeroDimensions,
    #[error("failed to encode image: {message}")]
    EncodeError { message: String },
    #[error("invalid quality value")]
    InvalidQuality,
    #[error("max dimension must be > 0")]
    InvalidMaxDimension,
    #[error("mask does not cover the frame")]
    InvalidMask,
    #[error("cannot reach {target} bytes: smallest achievable output is {achieved} bytes")]
    SizeTargetUnreachable { achieved: u64, target: u64 },
    #[error("failed to load face detection model: {message}")]
    ModelError { message: String },
}

impl From<facecap::FaceCapError> for FaceCapError {
    fn from(e: facecap::FaceCapError) -> Self {
        match e {
            facecap::FaceCapError::Decode(msg) => FaceCapError::DecodeError { message: msg },
            facecap::FaceCapError::ZeroDimensions => FaceCapError::ZeroDimensions,
            facecap::FaceCapError::Encode(msg) => FaceCapError::EncodeError { message: msg },
            facecap::FaceCapError::InvalidQuality(_) => FaceCapError::InvalidQuality,
            facecap::FaceCapError::InvalidMaxDimension => FaceCapError::InvalidMaxDimension,
            facecap::FaceCapError::InvalidMask { .. } => FaceCapError::InvalidMask,
            facecap::FaceCapError::SizeTargetUnreachable { achieved, target } => {
                FaceCapError::SizeTargetUnreachable {
                    achieved: achieved as u64,
                    target: target as u64,
                }
            }
            facecap::FaceCapError::Model(msg) => FaceCapError::ModelError { message: msg },
        }
    }
}

#[derive(uniffi::Record)]
pub struct FaceBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
}

impl From<FaceBox> for facecap::FaceBox {
    fn from(face: FaceBox) -> Self {
        facecap::FaceBox {
            x: face.x,
            y: face.y,
            width: face.width,
            height: face.height,
            confidence: face.confidence,
        }
    }
}

#[derive(uniffi::Record)]
pub struct OvalTarget {
    pub center_x: f32,
    pub center_y: f32,
    pub radius_x: f32,
    pub radius_y: f32,
}

impl From<OvalTarget> for facecap::OvalTarget {
    fn from(oval: OvalTarget) -> Self {
        facecap::OvalTarget {
            center_x: oval.center_x,
            center_y: oval.center_y,
            radius_x: oval.radius_x,
            radius_y: oval.radius_y,
        }
    }
}

#[derive(Debug, PartialEq, Eq, uniffi::Enum)]
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

impl From<facecap::Guidance> for Guidance {
    fn from(guidance: facecap::Guidance) -> Self {
        match guidance {
            facecap::Guidance::NoFace => Guidance::NoFace,
            facecap::Guidance::MoveCloser => Guidance::MoveCloser,
            facecap::Guidance::MoveBack => Guidance::MoveBack,
            facecap::Guidance::MoveLeft => Guidance::MoveLeft,
            facecap::Guidance::MoveRight => Guidance::MoveRight,
            facecap::Guidance::MoveUp => Guidance::MoveUp,
            facecap::Guidance::MoveDown => Guidance::MoveDown,
            facecap::Guidance::HoldStill => Guidance::HoldStill,
            facecap::Guidance::MultipleFaces => Guidance::MultipleFaces,
        }
    }
}

#[derive(uniffi::Enum)]
pub enum CropMode {
    FaceDetection,
    Framed,
    Oval,
    None,
}

impl From<CropMode> for facecap::CropMode {
    fn from(mode: CropMode) -> Self {
        match mode {
            CropMode::FaceDetection => facecap::CropMode::FaceDetection,
            CropMode::Framed => facecap::CropMode::Framed,
            CropMode::Oval => facecap::CropMode::Oval,
            CropMode::None => facecap::CropMode::None,
        }
    }
}

#[derive(uniffi::Enum)]
pub enum OutputFormat {
    Jpeg,
    Png,
}

impl From<OutputFormat> for facecap::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Jpeg => facecap::OutputFormat::Jpeg,
            OutputFormat::Png => facecap::OutputFormat::Png,
        }
    }
}

impl From<facecap::OutputFormat> for OutputFormat {
    fn from(format: facecap::OutputFormat) -> Self {
        match format {
            facecap::OutputFormat::Jpeg => OutputFormat::Jpeg,
            facecap::OutputFormat::Png => OutputFormat::Png,
        }
    }
}

#[derive(uniffi::Enum)]
pub enum Preset {
    Avatar,
    Portrait,
    Thumbnail,
}

impl From<Preset> for facecap::Preset {
    fn from(preset: Preset) -> Self {
        match preset {
            Preset::Avatar => facecap::Preset::Avatar,
            Preset::Portrait => facecap::Preset::Portrait,
            Preset::Thumbnail => facecap::Preset::Thumbnail,
        }
    }
}

#[derive(uniffi::Record)]
pub struct FaceBounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub confidence: f64,
}

#[derive(uniffi::Record)]
pub struct ProcessedPhoto {
    pub data: Vec<u8>,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
    pub original_size: u64,
    pub face_bounds: Option<FaceBounds>,
}

#[derive(uniffi::Record)]
pub struct FitResult {
    pub photo: ProcessedPhoto,
    pub quality_used: f32,
    pub iterations: u32,
    pub within_tolerance: bool,
}

/// Coverage mask from the platform segmenter: one byte per pixel,
/// 255 = subject, at the input frame's resolution.
#[derive(uniffi::Record)]
pub struct CoverageMask {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

fn convert_face_bounds(bounds: &facecap::FaceBounds) -> FaceBounds {
    FaceBounds {
        x: bounds.x,
        y: bounds.y,
        width: bounds.width,
        height: bounds.height,
        confidence: bounds.confidence,
    }
}

fn convert_photo(photo: facecap::ProcessedPhoto) -> ProcessedPhoto {
    ProcessedPhoto {
        face_bounds: photo.face_bounds.as_ref().map(convert_face_bounds),
        data: photo.data,
        format: photo.format.into(),
        width: photo.width,
        height: photo.height,
        original_size: photo.original_size as u64,
    }
}

/// Compute the framing guidance for one preview frame.
#[uniffi::export]
pub fn guide(
    faces: Vec<FaceBox>,
    oval: Option<OvalTarget>,
    sensitivity: Option<f32>,
) -> Guidance {
    let faces: Vec<facecap::FaceBox> = faces.into_iter().map(Into::into).collect();
    let oval = oval.map(Into::into).unwrap_or_default();
    facecap::guide(&faces, &oval, sensitivity).into()
}

/// Process a captured photo with a preset configuration.
#[uniffi::export]
pub fn process_with_preset(
    input: Vec<u8>,
    preset: Preset,
) -> Result<ProcessedPhoto, FaceCapError> {
    let result = facecap::PhotoProcessor::new(input)?
        .preset(preset.into())
        .process()?;

    Ok(convert_photo(result))
}

/// Process a captured photo with full control over all parameters.
#[uniffi::export]
pub fn process(
    input: Vec<u8>,
    max_dimension: u32,
    quality: f32,
    grayscale: bool,
    crop_mode: CropMode,
    format: OutputFormat,
    face_margin: f32,
) -> Result<ProcessedPhoto, FaceCapError> {
    let result = facecap::PhotoProcessor::new(input)?
        .max_dimension(max_dimension)
        .quality(quality)
        .grayscale(grayscale)
        .crop_mode(crop_mode.into())
        .format(format.into())
        .face_margin(face_margin)
        .process()?;

    Ok(convert_photo(result))
}

/// Process a captured photo to land at a byte target.
#[uniffi::export]
pub fn process_to_size(
    input: Vec<u8>,
    target_bytes: u64,
    tolerance: u64,
    max_dimension: u32,
    grayscale: bool,
    crop_mode: CropMode,
    face_margin: f32,
) -> Result<FitResult, FaceCapError> {
    let result = facecap::PhotoProcessor::new(input)?
        .max_dimension(max_dimension)
        .grayscale(grayscale)
        .crop_mode(crop_mode.into())
        .face_margin(face_margin)
        .process_to_size(facecap::SizeTarget {
            bytes: target_bytes as usize,
            tolerance: tolerance as usize,
        })?;

    Ok(FitResult {
        photo: convert_photo(result.photo),
        quality_used: result.quality_used,
        iterations: result.iterations,
        within_tolerance: result.within_tolerance,
    })
}

/// Segmenter wrapping a mask the platform toolkit already computed.
struct ProvidedMask {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl facecap::BackgroundSegmenter for ProvidedMask {
    fn segment(
        &self,
        _rgba: &[u8],
        _width: u32,
        _height: u32,
    ) -> Option<facecap::SegmentationMask> {
        facecap::SegmentationMask::new(self.data.clone(), self.width, self.height).ok()
    }
}

/// Remove the background from a captured photo; output is PNG with alpha.
///
/// Pass the platform segmenter's mask when one is available; otherwise the
/// elliptical fallback matte shaped by `oval` is used.
#[uniffi::export]
pub fn cutout(
    input: Vec<u8>,
    mask: Option<CoverageMask>,
    max_dimension: u32,
    crop_mode: CropMode,
    oval: Option<OvalTarget>,
) -> Result<ProcessedPhoto, FaceCapError> {
    let mut processor = facecap::PhotoProcessor::new(input)?
        .max_dimension(max_dimension)
        .crop_mode(crop_mode.into());

    if let Some(oval) = oval {
        processor = processor.oval(oval.into());
    }

    if let Some(mask) = mask {
        // Reject byte counts that can't possibly be a mask for the claimed
        // dimensions; the core checks the frame match.
        facecap::SegmentationMask::new(mask.data.clone(), mask.width, mask.height)?;
        processor = processor.segmenter(Box::new(ProvidedMask {
            data: mask.data,
            width: mask.width,
            height: mask.height,
        }));
    }

    let result = processor.cutout()?;

    Ok(convert_photo(result))
}
