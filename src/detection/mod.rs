pub mod classifier;
pub mod dispatch;
pub mod state;

use tokio::time::Instant;

use crate::models::GestureLabel;

pub use classifier::{GestureClassifier, SWIPE_THRESHOLD_PX, classify};
pub use dispatch::{ACTION_CLEAR_WINDOW, ActionDispatcher, ActionSignal};
pub use state::{DetectionStateMachine, GestureChange, MachineState};

/// Snapshot of one session's detection state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DetectionState {
    pub last_stable_gesture: GestureLabel,
    pub active_action_label: Option<String>,
    pub active_action_expiry: Option<Instant>,
}

impl DetectionState {
    pub fn capture(machine: &DetectionStateMachine, dispatcher: &ActionDispatcher) -> Self {
        Self {
            last_stable_gesture: machine.last_stable(),
            active_action_label: dispatcher.active_action().map(str::to_string),
            active_action_expiry: dispatcher.expiry(),
        }
    }
}
