use std::time::Duration;

use tokio::time::Instant;

use crate::models::{ActionBinding, GestureLabel};

/// How long a triggered action stays visible
pub const ACTION_CLEAR_WINDOW: Duration = Duration::from_millis(2000);

/// A bound action that just fired
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSignal {
    pub gesture: GestureLabel,
    pub action: String,
    pub expires_at: Instant,
}

#[derive(Debug, Clone)]
struct ActiveAction {
    label: String,
    expires_at: Instant,
}

/// Maps gesture changes to configured actions and owns the single pending clear deadline
#[derive(Debug, Clone)]
pub struct ActionDispatcher {
    clear_after: Duration,
    active: Option<ActiveAction>,
}

impl Default for ActionDispatcher {
    fn default() -> Self {
        Self::new(ACTION_CLEAR_WINDOW)
    }
}

impl ActionDispatcher {
    pub fn new(clear_after: Duration) -> Self {
        Self {
            clear_after,
            active: None,
        }
    }

    pub fn clear_after(&self) -> Duration {
        self.clear_after
    }

    /// Look up the first binding for `label`. A match replaces the active action and
    /// restarts the clear deadline; no match leaves everything untouched.
    pub fn on_gesture_change(
        &mut self,
        label: GestureLabel,
        bindings: &[ActionBinding],
        now: Instant,
    ) -> Option<ActionSignal> {
        if label.is_none() {
            return None;
        }

        let binding = bindings.iter().find(|b| b.gesture == label)?;
        let expires_at = now + self.clear_after;
        self.active = Some(ActiveAction {
            label: binding.action.clone(),
            expires_at,
        });

        Some(ActionSignal {
            gesture: label,
            action: binding.action.clone(),
            expires_at,
        })
    }

    pub fn active_action(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.label.as_str())
    }

    /// Deadline of the pending clear, if an action is showing
    pub fn expiry(&self) -> Option<Instant> {
        self.active.as_ref().map(|a| a.expires_at)
    }

    /// Clear the active action once its deadline has passed. Returns the cleared label.
    pub fn clear_expired(&mut self, now: Instant) -> Option<String> {
        match &self.active {
            Some(active) if now >= active.expires_at => self.active.take().map(|a| a.label),
            _ => None,
        }
    }

    /// Drop the active action and its pending clear
    pub fn reset(&mut self) {
        self.active = None;
    }
}
