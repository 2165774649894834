#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from gesturepanel for tests
pub use gesturepanel::{
    ActionBinding, CameraError, GestureLabel, GesturePipeline, LandmarkProvider, LandmarkSet,
    NullRenderer, PipelineError, PipelineEvent, PipelineOutput, ReplayProvider, SyntheticCamera,
    TraceFrame,
};
