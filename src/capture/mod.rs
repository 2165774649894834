pub mod synthetic;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use image::DynamicImage;
use tracing::debug;

use crate::config::PipelineSettings;
use crate::error::CameraError;

pub use synthetic::SyntheticCamera;

/// Resolution requested from the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoConstraints {
    pub width: u32,
    pub height: u32,
}

impl Default for VideoConstraints {
    fn default() -> Self {
        Self {
            width: 300,
            height: 200,
        }
    }
}

impl From<&PipelineSettings> for VideoConstraints {
    fn from(settings: &PipelineSettings) -> Self {
        Self {
            width: settings.capture_width,
            height: settings.capture_height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Video,
    Audio,
}

/// A captured video frame
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: Arc<DynamicImage>,
    /// Position of this frame within its stream, starting at 0
    pub sequence: u64,
}

/// One underlying media track of an open camera stream
pub trait MediaTrack {
    fn kind(&self) -> TrackKind;
    fn is_live(&self) -> bool;
    /// Current frame, or None for non-video or stopped tracks
    fn read_frame(&mut self) -> Option<DynamicImage>;
    /// Release the device. Must be safe to call more than once.
    fn stop(&mut self);
}

/// Platform camera capability
pub trait CameraBackend {
    fn open(
        &self,
        constraints: VideoConstraints,
    ) -> impl Future<Output = Result<Vec<Box<dyn MediaTrack>>, CameraError>>;

    fn name(&self) -> &str;
}

/// An open camera stream. Every track is released on `stop` or when the handle is dropped.
pub struct StreamHandle {
    tracks: Vec<Box<dyn MediaTrack>>,
    constraints: VideoConstraints,
    next_sequence: u64,
}

impl StreamHandle {
    pub fn constraints(&self) -> VideoConstraints {
        self.constraints
    }

    pub fn live_tracks(&self) -> usize {
        self.tracks.iter().filter(|t| t.is_live()).count()
    }

    pub fn is_active(&self) -> bool {
        self.live_tracks() > 0
    }

    /// Grab the current frame from the first live video track
    pub fn grab_frame(&mut self) -> Option<Frame> {
        let image = self
            .tracks
            .iter_mut()
            .filter(|t| t.kind() == TrackKind::Video && t.is_live())
            .find_map(|t| t.read_frame())?;

        let frame = Frame {
            image: Arc::new(image),
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;
        Some(frame)
    }

    /// Stop and drop every track, returning how many were released
    fn release(&mut self) -> usize {
        let released = self.tracks.len();
        for track in self.tracks.iter_mut() {
            track.stop();
        }
        self.tracks.clear();
        released
    }
}

impl fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamHandle")
            .field("constraints", &self.constraints)
            .field("tracks", &self.tracks.len())
            .field("live_tracks", &self.live_tracks())
            .finish()
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        let released = self.release();
        if released > 0 {
            debug!("Released {} camera track(s) on drop", released);
        }
    }
}

/// Owns the camera stream lifecycle
pub struct CaptureSession<C> {
    backend: C,
    constraints: VideoConstraints,
}

impl<C: CameraBackend> CaptureSession<C> {
    pub fn new(backend: C) -> Self {
        Self {
            backend,
            constraints: VideoConstraints::default(),
        }
    }

    pub fn with_constraints(mut self, constraints: VideoConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn constraints(&self) -> VideoConstraints {
        self.constraints
    }

    pub fn backend(&self) -> &C {
        &self.backend
    }

    /// Open the camera at the configured resolution.
    /// If no live video track comes back, whatever was opened is released before failing.
    pub async fn start(&self) -> Result<StreamHandle, CameraError> {
        let mut tracks = self.backend.open(self.constraints).await?;

        let has_video = tracks
            .iter()
            .any(|t| t.kind() == TrackKind::Video && t.is_live());
        if !has_video {
            for track in tracks.iter_mut() {
                track.stop();
            }
            return Err(CameraError::Unavailable(format!(
                "{} returned no live video track",
                self.backend.name()
            )));
        }

        debug!(
            "Opened {} track(s) from {} at {}x{}",
            tracks.len(),
            self.backend.name(),
            self.constraints.width,
            self.constraints.height
        );

        Ok(StreamHandle {
            tracks,
            constraints: self.constraints,
            next_sequence: 0,
        })
    }

    /// Release every track of the stream. Calling this on an already stopped handle does nothing.
    pub fn stop(&self, handle: &mut StreamHandle) {
        let released = handle.release();
        if released > 0 {
            debug!("Stopped {} camera track(s)", released);
        }
    }
}
