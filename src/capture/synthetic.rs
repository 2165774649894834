use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::{DynamicImage, Rgb, RgbImage};

use super::{CameraBackend, MediaTrack, TrackKind, VideoConstraints};
use crate::error::CameraError;

/// Track counters shared between a camera and the tracks it hands out
#[derive(Debug, Default)]
struct TrackCounters {
    opened: AtomicUsize,
    live: AtomicUsize,
}

/// Camera backend that produces solid frames at the requested resolution.
/// Used for replaying recorded landmark traces without real hardware.
#[derive(Debug, Clone)]
pub struct SyntheticCamera {
    fill: Rgb<u8>,
    available: bool,
    with_audio: bool,
    counters: Arc<TrackCounters>,
}

impl Default for SyntheticCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticCamera {
    pub fn new() -> Self {
        Self {
            fill: Rgb([32, 32, 32]),
            available: true,
            with_audio: false,
            counters: Arc::new(TrackCounters::default()),
        }
    }

    /// Behave like a device whose permission was denied
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Also open an audio track alongside the video track
    pub fn with_audio(mut self, with_audio: bool) -> Self {
        self.with_audio = with_audio;
        self
    }

    pub fn with_fill(mut self, fill: Rgb<u8>) -> Self {
        self.fill = fill;
        self
    }

    /// Total tracks ever opened by this camera (and its clones)
    pub fn opened_tracks(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    /// Tracks opened and not yet stopped
    pub fn live_tracks(&self) -> usize {
        self.counters.live.load(Ordering::SeqCst)
    }

    fn open_track(&self, kind: TrackKind, constraints: VideoConstraints) -> Box<dyn MediaTrack> {
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        self.counters.live.fetch_add(1, Ordering::SeqCst);
        Box::new(SyntheticTrack {
            kind,
            frame: RgbImage::from_pixel(constraints.width, constraints.height, self.fill),
            live: true,
            counters: self.counters.clone(),
        })
    }
}

impl CameraBackend for SyntheticCamera {
    async fn open(
        &self,
        constraints: VideoConstraints,
    ) -> Result<Vec<Box<dyn MediaTrack>>, CameraError> {
        if !self.available {
            return Err(CameraError::Unavailable("permission denied".to_string()));
        }
        if constraints.width == 0 || constraints.height == 0 {
            return Err(CameraError::Unavailable(format!(
                "unsupported resolution {}x{}",
                constraints.width, constraints.height
            )));
        }

        let mut tracks = vec![self.open_track(TrackKind::Video, constraints)];
        if self.with_audio {
            tracks.push(self.open_track(TrackKind::Audio, constraints));
        }
        Ok(tracks)
    }

    fn name(&self) -> &str {
        "synthetic camera"
    }
}

struct SyntheticTrack {
    kind: TrackKind,
    frame: RgbImage,
    live: bool,
    counters: Arc<TrackCounters>,
}

impl MediaTrack for SyntheticTrack {
    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn is_live(&self) -> bool {
        self.live
    }

    fn read_frame(&mut self) -> Option<DynamicImage> {
        if !self.live || self.kind != TrackKind::Video {
            return None;
        }
        Some(DynamicImage::ImageRgb8(self.frame.clone()))
    }

    fn stop(&mut self) {
        if self.live {
            self.live = false;
            self.counters.live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for SyntheticTrack {
    fn drop(&mut self) {
        self.stop();
    }
}
