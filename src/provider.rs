use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::rc::Rc;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::capture::Frame;
use crate::models::LandmarkSet;

/// Pending landmark estimation for one frame
pub type EstimateFuture = Pin<Box<dyn Future<Output = anyhow::Result<Vec<LandmarkSet>>>>>;

/// Hand-landmark model: given a frame, zero or more detected hands.
/// The pipeline only looks at the first hand.
pub trait LandmarkProvider {
    /// Initialize the model. Called on session start while not ready.
    fn load(&mut self) -> impl Future<Output = anyhow::Result<()>>;

    fn is_ready(&self) -> bool;

    /// Start estimating one frame. The returned future must not borrow the provider.
    fn estimate(&self, frame: &Frame) -> EstimateFuture;
}

/// One recorded frame in a landmark trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TraceFrame {
    /// Hands detected in this frame (empty means no hand)
    Hands(Vec<LandmarkSet>),
    /// The model failed on this frame
    Error { error: String },
}

/// Replays a recorded landmark trace, one entry per processed frame.
/// Frames past the end of the trace report no hand.
#[derive(Debug, Clone)]
pub struct ReplayProvider {
    source: Option<PathBuf>,
    frames: Rc<Vec<TraceFrame>>,
    latency: Duration,
    ready: bool,
}

impl ReplayProvider {
    /// Provider that reads its trace from a JSON file on `load`
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self {
            source: Some(path.as_ref().to_path_buf()),
            frames: Rc::new(Vec::new()),
            latency: Duration::ZERO,
            ready: false,
        }
    }

    /// Provider over an in-memory trace
    pub fn from_frames(frames: Vec<TraceFrame>) -> Self {
        Self {
            source: None,
            frames: Rc::new(frames),
            latency: Duration::ZERO,
            ready: false,
        }
    }

    /// Simulated inference time per frame
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl LandmarkProvider for ReplayProvider {
    async fn load(&mut self) -> anyhow::Result<()> {
        if let Some(path) = &self.source {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read landmark trace {:?}", path))?;
            let frames: Vec<TraceFrame> = serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse landmark trace {:?}", path))?;
            self.frames = Rc::new(frames);
        }
        self.ready = true;
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn estimate(&self, frame: &Frame) -> EstimateFuture {
        let frames = self.frames.clone();
        let latency = self.latency;
        let index = frame.sequence as usize;

        Box::pin(async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            match frames.get(index) {
                Some(TraceFrame::Hands(hands)) => Ok(hands.clone()),
                Some(TraceFrame::Error { error }) => Err(anyhow::anyhow!("{}", error)),
                None => Ok(Vec::new()),
            }
        })
    }
}
