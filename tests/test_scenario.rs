//! End-to-end gesture scenarios.
//!
//! Tests cover:
//! - A recorded swipe sequence driving the full loop on a paused clock
//! - Action text clearing after its window, held gestures firing once
//! - The default gesture module bindings

mod common;

use std::time::Duration;

use gesturepanel::Module;
use tokio::time::{Instant, sleep, sleep_until};

use common::*;

#[tokio::test(start_paused = true)]
async fn test_swipe_left_turns_off_lights() -> anyhow::Result<()> {
    use GestureLabel::*;

    let trace = trace_for(&[None, SwipeLeft, SwipeLeft, None, SwipeRight]);
    let (mut pipeline, camera) = make_pipeline(ReplayProvider::from_frames(trace), lights_bindings());
    let mut events = pipeline.events();

    let started = Instant::now();
    pipeline.start().await?;

    let stop = pipeline.stop_handle();
    let output = pipeline.subscribe();
    let (stats, _) = tokio::join!(pipeline.run(), async move {
        sleep_until(started + Duration::from_millis(1000)).await;
        {
            let current = output.borrow();
            assert_eq!(current.active_action.as_deref(), Some("Turn Off All Lights"));
            assert_eq!(current.detected_gesture, Option::None, "trace has run out of hands");
        }

        sleep_until(started + Duration::from_millis(2500)).await;
        assert_eq!(output.borrow().active_action, Option::None);
        stop.stop();
    });

    assert!(stats.frames_processed >= 5);
    assert_eq!(stats.frames_failed, 0);
    assert_eq!(camera.live_tracks(), 0);

    let mut changes = Vec::new();
    let mut triggered = Vec::new();
    let mut cleared = Vec::new();
    while let Ok(event) = events.try_recv() {
        match event {
            PipelineEvent::GestureChanged(change) => changes.push(change.gesture),
            PipelineEvent::ActionTriggered(signal) => triggered.push(signal.action),
            PipelineEvent::ActionCleared { action } => cleared.push(action),
            _ => {}
        }
    }

    assert_eq!(changes, vec![SwipeLeft, SwipeRight]);
    assert_eq!(triggered, vec!["Turn Off All Lights".to_string()]);
    assert_eq!(cleared, vec!["Turn Off All Lights".to_string()]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_observed_sequence_with_manual_clock() -> anyhow::Result<()> {
    let (provider, _probe) = ProbeProvider::new(Vec::new(), Duration::ZERO);
    let (mut pipeline, _camera) = make_pipeline(provider, lights_bindings());
    pipeline.start().await?;

    let t0 = Instant::now();
    let frame = Duration::from_millis(16);
    let left = hand_for(GestureLabel::SwipeLeft);
    let right = hand_for(GestureLabel::SwipeRight);

    assert!(pipeline.observe(None, t0).is_none());
    let change = pipeline.observe(Some(&left), t0 + frame);
    assert_eq!(change.map(|c| c.gesture), Some(GestureLabel::SwipeLeft));
    assert!(pipeline.observe(Some(&left), t0 + frame * 2).is_none());
    assert_eq!(
        pipeline.output().detected_gesture,
        Some(GestureLabel::SwipeLeft)
    );

    assert!(pipeline.observe(None, t0 + frame * 3).is_none());
    let change = pipeline.observe(Some(&right), t0 + frame * 4);
    assert_eq!(change.map(|c| c.gesture), Some(GestureLabel::SwipeRight));

    // Unbound gesture leaves the earlier action in place
    let state = pipeline.detection_state();
    assert_eq!(state.last_stable_gesture, GestureLabel::SwipeRight);
    assert_eq!(state.active_action_label.as_deref(), Some("Turn Off All Lights"));

    pipeline.expire_action(t0 + frame + Duration::from_millis(1999));
    assert!(pipeline.output().active_action.is_some());

    pipeline.expire_action(t0 + frame + Duration::from_millis(2000));
    assert_eq!(pipeline.output().active_action, None);
    assert_eq!(pipeline.detection_state().active_action_expiry, None);

    pipeline.stop();
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_held_swipe_fires_once() -> anyhow::Result<()> {
    let trace = trace_for(&[GestureLabel::SwipeDown; 40]);
    let module = Module::default_gesture_control();
    let (mut pipeline, _camera) = make_pipeline(ReplayProvider::from_frames(trace), Vec::new());
    pipeline.set_bindings(module.gesture_bindings().unwrap_or_default().to_vec());
    let mut events = pipeline.events();
    pipeline.start().await?;

    let stop = pipeline.stop_handle();
    let (stats, _) = tokio::join!(pipeline.run(), async move {
        sleep(Duration::from_millis(500)).await;
        stop.stop();
    });
    assert!(stats.frames_processed >= 25);

    let mut triggered = 0;
    while let Ok(event) = events.try_recv() {
        if let PipelineEvent::ActionTriggered(signal) = event {
            assert_eq!(signal.gesture, GestureLabel::SwipeDown);
            triggered += 1;
        }
    }
    assert_eq!(triggered, 1);
    Ok(())
}
