pub mod capture;
pub mod config;
pub mod detection;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod provider;
pub mod render;

pub use capture::{CameraBackend, CaptureSession, Frame, MediaTrack, StreamHandle, SyntheticCamera};
pub use config::{PanelConfig, PipelineSettings};
pub use detection::{DetectionState, GestureClassifier, classify};
pub use error::{CameraError, PipelineError};
pub use models::{ActionBinding, GestureLabel, LandmarkPoint, LandmarkSet, Module, ModuleKind};
pub use pipeline::{
    GesturePipeline, PipelineEvent, PipelineOutput, PipelineStats, StopHandle,
};
pub use provider::{LandmarkProvider, ReplayProvider, TraceFrame};
pub use render::{ImageOverlay, NullRenderer, OverlayRenderer};
