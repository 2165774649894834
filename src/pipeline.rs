use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use crate::capture::{CameraBackend, CaptureSession, StreamHandle, VideoConstraints};
use crate::config::PipelineSettings;
use crate::detection::{
    ActionDispatcher, ActionSignal, DetectionState, DetectionStateMachine, GestureChange,
    GestureClassifier,
};
use crate::error::PipelineError;
use crate::models::{ActionBinding, GestureLabel, LandmarkSet, Module};
use crate::provider::{EstimateFuture, LandmarkProvider};
use crate::render::OverlayRenderer;

const EVENT_CAPACITY: usize = 256;

/// What the rest of the application sees
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PipelineOutput {
    /// Last stable gesture, `None` while no directional gesture is held
    pub detected_gesture: Option<GestureLabel>,
    /// Action text to show, until its clear window elapses
    pub active_action: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    SessionStarted { generation: u64 },
    SessionStopped { generation: u64 },
    GestureChanged(GestureChange),
    ActionTriggered(ActionSignal),
    ActionCleared { action: String },
    FrameFailed { sequence: u64, error: String },
}

/// Per-pipeline frame counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineStats {
    /// Estimation results that went through render/classify/dispatch
    pub frames_processed: u64,
    /// Refresh ticks dropped because an estimation was still running
    pub frames_skipped: u64,
    /// Frames whose estimation failed
    pub frames_failed: u64,
    /// Results that arrived after their session had stopped
    pub results_discarded: u64,
}

/// Display-refresh signal: one tick per frame, late ticks are dropped rather than burst
pub struct RefreshClock {
    interval: Interval,
}

impl RefreshClock {
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval }
    }

    pub async fn tick(&mut self) -> Instant {
        self.interval.tick().await
    }
}

/// Requests the running loop to stop. Cheap to clone and hand to other code.
///
/// A handle is bound to one session generation; stopping through a handle
/// from an earlier session has no effect on a later one.
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<u64>>,
    generation: u64,
}

impl StopHandle {
    pub fn stop(&self) {
        self.tx.send_if_modified(|requested| {
            if *requested < self.generation {
                *requested = self.generation;
                true
            } else {
                false
            }
        });
    }

    /// Session generation this handle stops
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

struct ActiveSession {
    generation: u64,
    stream: StreamHandle,
}

/// An estimation that has been issued and not yet resolved
struct InFlight {
    generation: u64,
    sequence: u64,
    estimate: EstimateFuture,
}

enum Launch {
    Started(InFlight),
    NoFrame,
    Halt,
}

/// Continuous capture → landmarks → gesture → action loop.
///
/// One pipeline runs at most one session at a time. All work happens on the
/// caller's task: `run` multiplexes the refresh clock, the single in-flight
/// estimation, the action clear deadline and stop requests without spawning.
pub struct GesturePipeline<C, P, R> {
    settings: PipelineSettings,
    capture: CaptureSession<C>,
    provider: P,
    renderer: R,
    bindings: Vec<ActionBinding>,
    classifier: GestureClassifier,
    machine: DetectionStateMachine,
    dispatcher: ActionDispatcher,
    session: Option<ActiveSession>,
    generation: u64,
    stats: PipelineStats,
    output: watch::Sender<PipelineOutput>,
    events: broadcast::Sender<PipelineEvent>,
    /// Highest session generation a stop has been requested for
    stop_tx: Arc<watch::Sender<u64>>,
}

impl<C, P, R> GesturePipeline<C, P, R>
where
    C: CameraBackend,
    P: LandmarkProvider,
    R: OverlayRenderer,
{
    pub fn new(camera: C, provider: P, renderer: R) -> Self {
        let settings = PipelineSettings::default();
        let (output, _) = watch::channel(PipelineOutput::default());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (stop_tx, _) = watch::channel(0);

        Self {
            capture: CaptureSession::new(camera).with_constraints(VideoConstraints::from(&settings)),
            classifier: GestureClassifier::new().with_threshold(settings.swipe_threshold_px),
            dispatcher: ActionDispatcher::new(settings.action_clear_window()),
            settings,
            provider,
            renderer,
            bindings: Vec::new(),
            machine: DetectionStateMachine::new(),
            session: None,
            generation: 0,
            stats: PipelineStats::default(),
            output,
            events,
            stop_tx: Arc::new(stop_tx),
        }
    }

    /// Apply capture resolution, classifier threshold and clear window
    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.capture = self
            .capture
            .with_constraints(VideoConstraints::from(&settings));
        self.classifier = GestureClassifier::new().with_threshold(settings.swipe_threshold_px);
        self.dispatcher = ActionDispatcher::new(settings.action_clear_window());
        self.settings = settings;
        self
    }

    pub fn with_bindings(mut self, bindings: Vec<ActionBinding>) -> Self {
        self.bindings = bindings;
        self
    }

    /// Take the action bindings from a gesture module
    pub fn for_module(self, module: &Module) -> anyhow::Result<Self> {
        let bindings = module.gesture_bindings().ok_or_else(|| {
            anyhow::anyhow!(
                "Module '{}' is a {} module, not a gesture module",
                module.name,
                module.kind.name()
            )
        })?;
        Ok(self.with_bindings(bindings.to_vec()))
    }

    /// Replace the bindings used for subsequent gesture changes
    pub fn set_bindings(&mut self, bindings: Vec<ActionBinding>) {
        self.bindings = bindings;
    }

    pub fn bindings(&self) -> &[ActionBinding] {
        &self.bindings
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn capture(&self) -> &CaptureSession<C> {
        &self.capture
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Generation of the current (or most recent) session; bumps on every start
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// Live camera tracks held by the current session
    pub fn live_tracks(&self) -> usize {
        self.session
            .as_ref()
            .map(|s| s.stream.live_tracks())
            .unwrap_or(0)
    }

    pub fn detection_state(&self) -> DetectionState {
        DetectionState::capture(&self.machine, &self.dispatcher)
    }

    pub fn output(&self) -> PipelineOutput {
        self.output.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PipelineOutput> {
        self.output.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<PipelineEvent> {
        self.events.subscribe()
    }

    /// Handle that stops the current session, or the next one to start while idle
    pub fn stop_handle(&self) -> StopHandle {
        let generation = match &self.session {
            Some(session) => session.generation,
            None => self.generation + 1,
        };
        StopHandle {
            tx: self.stop_tx.clone(),
            generation,
        }
    }

    /// Load the landmark model if needed, open the camera and begin a fresh session.
    /// Detection state always starts from idle.
    pub async fn start(&mut self) -> Result<u64, PipelineError> {
        if self.session.is_some() {
            return Err(PipelineError::SessionActive);
        }

        if !self.provider.is_ready() {
            self.provider.load().await.map_err(PipelineError::ModelLoad)?;
        }

        let stream = self.capture.start().await?;

        self.generation += 1;
        self.machine.reset();
        self.dispatcher.reset();
        self.session = Some(ActiveSession {
            generation: self.generation,
            stream,
        });

        info!(
            "Gesture session {} started ({}x{} @ {} Hz, {} binding(s))",
            self.generation,
            self.settings.capture_width,
            self.settings.capture_height,
            self.settings.refresh_hz,
            self.bindings.len()
        );
        let _ = self.events.send(PipelineEvent::SessionStarted {
            generation: self.generation,
        });
        self.publish();
        Ok(self.generation)
    }

    /// End the session: release the camera and reset detection state.
    /// Does nothing when no session is active.
    pub fn stop(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };

        self.capture.stop(&mut session.stream);
        self.machine.reset();
        self.dispatcher.reset();

        info!("Gesture session {} stopped", session.generation);
        let _ = self.events.send(PipelineEvent::SessionStopped {
            generation: session.generation,
        });
        self.publish();
    }

    /// Drive the session until it is stopped, then return the frame counters.
    /// Call after `start`; returns immediately when no session is active.
    pub async fn run(&mut self) -> PipelineStats {
        let mut clock = RefreshClock::new(self.settings.frame_interval());
        let mut stop_rx = self.stop_tx.subscribe();
        let mut in_flight: Option<InFlight> = None;

        while self.is_active() {
            let requested = *stop_rx.borrow_and_update();
            if requested >= self.generation {
                self.stop();
                break;
            }
            let expiry = self.dispatcher.expiry();

            tokio::select! {
                biased;

                _ = stop_rx.changed() => {}

                (generation, sequence, result) = next_estimate(&mut in_flight) => {
                    in_flight = None;
                    self.on_estimate(generation, sequence, result, Instant::now());
                }

                _ = sleep_until(expiry) => {
                    self.expire_action(Instant::now());
                }

                _ = clock.tick() => {
                    if in_flight.is_some() {
                        self.stats.frames_skipped += 1;
                        trace!("Estimation still in flight, skipping frame");
                    } else {
                        match self.launch_estimate() {
                            Launch::Started(next) => in_flight = Some(next),
                            Launch::NoFrame => {}
                            Launch::Halt => {
                                warn!("Landmark provider is not ready, halting gesture loop");
                                self.stop();
                            }
                        }
                    }
                }
            }
        }

        // A late result is allowed to finish but never applied
        if let Some(pending) = in_flight.take() {
            let result = pending.estimate.await;
            self.on_estimate(pending.generation, pending.sequence, result, Instant::now());
        }

        self.stats
    }

    /// Feed one estimation result through render, classify, state machine and dispatcher.
    /// Ignored when no session is active.
    pub fn observe(
        &mut self,
        landmarks: Option<&LandmarkSet>,
        now: Instant,
    ) -> Option<GestureChange> {
        if self.session.is_none() {
            return None;
        }

        if let Err(err) = self.renderer.render(landmarks) {
            warn!("{} failed to draw landmarks: {:#}", self.renderer.name(), err);
        }

        let gesture = self.classifier.classify(landmarks);
        let change = self.machine.update(gesture);

        if let Some(change) = change {
            debug!("Gesture changed: {} -> {}", change.previous, change.gesture);
            let _ = self.events.send(PipelineEvent::GestureChanged(change));

            if let Some(signal) =
                self.dispatcher
                    .on_gesture_change(change.gesture, &self.bindings, now)
            {
                info!("Gesture {} triggered action: {}", signal.gesture, signal.action);
                let _ = self.events.send(PipelineEvent::ActionTriggered(signal));
            }
        }

        self.stats.frames_processed += 1;
        self.publish();
        change
    }

    /// Clear the active action if its window has elapsed
    pub fn expire_action(&mut self, now: Instant) {
        if let Some(action) = self.dispatcher.clear_expired(now) {
            debug!("Action cleared: {}", action);
            let _ = self.events.send(PipelineEvent::ActionCleared { action });
            self.publish();
        }
    }

    fn launch_estimate(&mut self) -> Launch {
        if !self.provider.is_ready() {
            return Launch::Halt;
        }
        let Some(session) = self.session.as_mut() else {
            return Launch::Halt;
        };
        let Some(frame) = session.stream.grab_frame() else {
            trace!("No frame available from camera");
            return Launch::NoFrame;
        };

        Launch::Started(InFlight {
            generation: session.generation,
            sequence: frame.sequence,
            estimate: self.provider.estimate(&frame),
        })
    }

    fn on_estimate(
        &mut self,
        generation: u64,
        sequence: u64,
        result: anyhow::Result<Vec<LandmarkSet>>,
        now: Instant,
    ) {
        let current = self.session.as_ref().map(|s| s.generation);
        if current != Some(generation) {
            self.stats.results_discarded += 1;
            debug!(
                "Discarding landmarks for frame {} of stopped session {}",
                sequence, generation
            );
            return;
        }

        match result {
            Ok(hands) => {
                self.observe(hands.first(), now);
            }
            Err(err) => {
                let err = PipelineError::FrameInference(err);
                warn!("Frame {}: {}", sequence, err);
                self.stats.frames_failed += 1;
                let _ = self.events.send(PipelineEvent::FrameFailed {
                    sequence,
                    error: err.to_string(),
                });
            }
        }
    }

    fn current_output(&self) -> PipelineOutput {
        if self.session.is_none() {
            return PipelineOutput::default();
        }
        let gesture = self.machine.last_stable();
        PipelineOutput {
            detected_gesture: (!gesture.is_none()).then_some(gesture),
            active_action: self.dispatcher.active_action().map(str::to_string),
        }
    }

    fn publish(&self) {
        let next = self.current_output();
        self.output.send_if_modified(|current| {
            if *current != next {
                *current = next;
                true
            } else {
                false
            }
        });
    }
}

async fn next_estimate(
    in_flight: &mut Option<InFlight>,
) -> (u64, u64, anyhow::Result<Vec<LandmarkSet>>) {
    match in_flight {
        Some(pending) => (
            pending.generation,
            pending.sequence,
            pending.estimate.as_mut().await,
        ),
        None => std::future::pending().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
