use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use gesturepanel::capture::TrackKind;
use gesturepanel::models::{INDEX_TIP, LANDMARK_COUNT, PALM_BASE};
use gesturepanel::provider::EstimateFuture;
use gesturepanel::{
    ActionBinding, CameraBackend, CameraError, Frame, GestureLabel, GesturePipeline,
    LandmarkPoint, LandmarkProvider, LandmarkSet, MediaTrack, NullRenderer, SyntheticCamera,
    TraceFrame,
};
use image::DynamicImage;

/// Builds a hand whose index tip sits (dx, dy) pixels from the palm base.
pub fn hand(dx: f32, dy: f32) -> LandmarkSet {
    let mut points = [LandmarkPoint::new(150.0, 100.0); LANDMARK_COUNT];
    points[PALM_BASE] = LandmarkPoint::new(150.0, 100.0);
    points[INDEX_TIP] = LandmarkPoint::new(150.0 + dx, 100.0 + dy);
    LandmarkSet::new(points)
}

/// A hand pose the classifier maps to `label`. `None` gets a relaxed hand, not an empty frame.
pub fn hand_for(label: GestureLabel) -> LandmarkSet {
    match label {
        GestureLabel::SwipeLeft => hand(-60.0, 0.0),
        GestureLabel::SwipeRight => hand(60.0, 0.0),
        GestureLabel::SwipeUp => hand(0.0, -70.0),
        GestureLabel::SwipeDown => hand(0.0, 70.0),
        GestureLabel::None => hand(10.0, 5.0),
    }
}

/// One trace frame per label, each with a single detected hand
pub fn trace_for(labels: &[GestureLabel]) -> Vec<TraceFrame> {
    labels
        .iter()
        .map(|label| TraceFrame::Hands(vec![hand_for(*label)]))
        .collect()
}

/// The single-binding table used by the lights scenario
pub fn lights_bindings() -> Vec<ActionBinding> {
    vec![ActionBinding::new(
        GestureLabel::SwipeLeft,
        "Turn Off All Lights",
    )]
}

/// Creates a pipeline on a synthetic camera. The returned camera shares track counters
/// with the one inside the pipeline.
pub fn make_pipeline<P: LandmarkProvider>(
    provider: P,
    bindings: Vec<ActionBinding>,
) -> (GesturePipeline<SyntheticCamera, P, NullRenderer>, SyntheticCamera) {
    let camera = SyntheticCamera::new();
    let pipeline =
        GesturePipeline::new(camera.clone(), provider, NullRenderer).with_bindings(bindings);
    (pipeline, camera)
}

/// Shared view into what a `ProbeProvider` has been asked to do
#[derive(Debug, Clone, Default)]
pub struct Probe {
    pub in_flight: Rc<Cell<usize>>,
    pub max_in_flight: Rc<Cell<usize>>,
    pub completed: Rc<Cell<usize>>,
    pub ready: Rc<Cell<bool>>,
}

/// Landmark provider that records how many estimations overlap
pub struct ProbeProvider {
    frames: Rc<Vec<Option<LandmarkSet>>>,
    latency: Duration,
    fail_load: bool,
    probe: Probe,
}

impl ProbeProvider {
    pub fn new(frames: Vec<Option<LandmarkSet>>, latency: Duration) -> (Self, Probe) {
        let probe = Probe::default();
        let provider = Self {
            frames: Rc::new(frames),
            latency,
            fail_load: false,
            probe: probe.clone(),
        };
        (provider, probe)
    }

    /// Provider whose model never loads
    pub fn broken() -> Self {
        let (mut provider, _) = Self::new(Vec::new(), Duration::ZERO);
        provider.fail_load = true;
        provider
    }
}

impl LandmarkProvider for ProbeProvider {
    async fn load(&mut self) -> anyhow::Result<()> {
        if self.fail_load {
            anyhow::bail!("model weights missing");
        }
        self.probe.ready.set(true);
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.probe.ready.get()
    }

    fn estimate(&self, frame: &Frame) -> EstimateFuture {
        let probe = self.probe.clone();
        let latency = self.latency;
        let hand = self.frames.get(frame.sequence as usize).cloned().flatten();

        Box::pin(async move {
            let running = probe.in_flight.get() + 1;
            probe.in_flight.set(running);
            probe.max_in_flight.set(probe.max_in_flight.get().max(running));

            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }

            probe.in_flight.set(probe.in_flight.get() - 1);
            probe.completed.set(probe.completed.get() + 1);
            Ok(hand.into_iter().collect())
        })
    }
}

/// Camera that grants a microphone but no video track
#[derive(Debug, Clone, Default)]
pub struct AudioOnlyCamera {
    pub opened: Rc<Cell<usize>>,
    pub live: Rc<Cell<usize>>,
}

struct CountedTrack {
    kind: TrackKind,
    live: bool,
    counter: Rc<Cell<usize>>,
}

impl MediaTrack for CountedTrack {
    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn is_live(&self) -> bool {
        self.live
    }

    fn read_frame(&mut self) -> Option<DynamicImage> {
        None
    }

    fn stop(&mut self) {
        if self.live {
            self.live = false;
            self.counter.set(self.counter.get() - 1);
        }
    }
}

impl CameraBackend for AudioOnlyCamera {
    async fn open(
        &self,
        _constraints: gesturepanel::capture::VideoConstraints,
    ) -> Result<Vec<Box<dyn MediaTrack>>, CameraError> {
        self.opened.set(self.opened.get() + 1);
        self.live.set(self.live.get() + 1);
        let track: Box<dyn MediaTrack> = Box::new(CountedTrack {
            kind: TrackKind::Audio,
            live: true,
            counter: self.live.clone(),
        });
        Ok(vec![track])
    }

    fn name(&self) -> &str {
        "audio-only camera"
    }
}
