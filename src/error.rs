use std::fmt;

/// Errors raised while acquiring the camera
#[derive(Debug)]
pub enum CameraError {
    /// Permission denied or no usable video device
    Unavailable(String),
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::Unavailable(reason) => write!(f, "Camera unavailable: {}", reason),
        }
    }
}

impl std::error::Error for CameraError {}

/// Errors surfaced by the gesture pipeline
#[derive(Debug)]
pub enum PipelineError {
    /// Fatal to session start
    Camera(CameraError),
    /// The landmark provider could not initialize; fatal to session start
    ModelLoad(anyhow::Error),
    /// A single frame's estimation failed; logged, never fatal
    FrameInference(anyhow::Error),
    /// A session is already running on this pipeline
    SessionActive,
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Camera(err) => write!(f, "{}", err),
            PipelineError::ModelLoad(err) => write!(f, "Landmark model failed to load: {:#}", err),
            PipelineError::FrameInference(err) => write!(f, "Frame inference failed: {:#}", err),
            PipelineError::SessionActive => f.write_str("A gesture session is already active"),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Camera(err) => Some(err),
            PipelineError::ModelLoad(err) | PipelineError::FrameInference(err) => Some(&**err),
            PipelineError::SessionActive => None,
        }
    }
}

impl From<CameraError> for PipelineError {
    fn from(err: CameraError) -> Self {
        PipelineError::Camera(err)
    }
}
