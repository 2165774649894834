use crate::models::GestureLabel;

/// Machine state as seen from outside
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineState {
    Idle,
    Held(GestureLabel),
}

/// Emitted when the stable gesture changes to a new non-`none` label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureChange {
    pub gesture: GestureLabel,
    pub previous: GestureLabel,
}

/// Debounces per-frame classifier output into gesture-change events.
/// A sustained gesture fires once; dropping back to `none` is silent.
#[derive(Debug, Clone, Default)]
pub struct DetectionStateMachine {
    last_stable: GestureLabel,
}

impl DetectionStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_stable(&self) -> GestureLabel {
        self.last_stable
    }

    pub fn state(&self) -> MachineState {
        match self.last_stable {
            GestureLabel::None => MachineState::Idle,
            label => MachineState::Held(label),
        }
    }

    /// Feed one classification result
    pub fn update(&mut self, gesture: GestureLabel) -> Option<GestureChange> {
        if gesture == self.last_stable {
            return None;
        }

        let previous = self.last_stable;
        self.last_stable = gesture;

        if gesture.is_none() {
            None
        } else {
            Some(GestureChange { gesture, previous })
        }
    }

    pub fn reset(&mut self) {
        self.last_stable = GestureLabel::None;
    }
}
