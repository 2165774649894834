use crate::models::{GestureLabel, LandmarkSet};

/// Default displacement threshold, calibrated to a 300x200 capture frame
pub const SWIPE_THRESHOLD_PX: f32 = 50.0;

/// Classifies a hand pose by where the index fingertip points relative to the palm base
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureClassifier {
    pub threshold_px: f32,
}

impl Default for GestureClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureClassifier {
    pub fn new() -> Self {
        Self {
            threshold_px: SWIPE_THRESHOLD_PX,
        }
    }

    pub fn with_threshold(mut self, threshold_px: f32) -> Self {
        self.threshold_px = threshold_px;
        self
    }

    /// Map a landmark set (or its absence) to a gesture label.
    /// An axis only wins when it strictly dominates, so equal magnitudes give `None`.
    pub fn classify(&self, landmarks: Option<&LandmarkSet>) -> GestureLabel {
        let Some(landmarks) = landmarks else {
            return GestureLabel::None;
        };

        let palm = landmarks.palm_base();
        let tip = landmarks.index_tip();
        let dx = tip.x - palm.x;
        let dy = tip.y - palm.y;

        if dx.abs() > self.threshold_px && dx.abs() > dy.abs() {
            if dx > 0.0 {
                GestureLabel::SwipeRight
            } else {
                GestureLabel::SwipeLeft
            }
        } else if dy.abs() > self.threshold_px && dy.abs() > dx.abs() {
            // Image y grows downward
            if dy > 0.0 {
                GestureLabel::SwipeDown
            } else {
                GestureLabel::SwipeUp
            }
        } else {
            GestureLabel::None
        }
    }
}

/// Classify with the default threshold
pub fn classify(landmarks: Option<&LandmarkSet>) -> GestureLabel {
    GestureClassifier::new().classify(landmarks)
}
