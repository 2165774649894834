use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::models::Module;

/// Tunables for the capture/detection loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Requested capture width in pixels
    pub capture_width: u32,
    /// Requested capture height in pixels
    pub capture_height: u32,
    /// Minimum index-tip displacement from the palm base, in capture pixels
    pub swipe_threshold_px: f32,
    /// How long a triggered action stays visible
    pub action_clear_ms: u64,
    /// Frame callbacks per second
    pub refresh_hz: u32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            capture_width: 300,
            capture_height: 200,
            swipe_threshold_px: 50.0,
            action_clear_ms: 2000,
            refresh_hz: 60,
        }
    }
}

impl PipelineSettings {
    pub fn action_clear_window(&self) -> Duration {
        Duration::from_millis(self.action_clear_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.refresh_hz.max(1) as f64)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.capture_width > 0 && self.capture_height > 0,
            "Capture resolution must be non-zero, got {}x{}",
            self.capture_width,
            self.capture_height
        );
        anyhow::ensure!(self.refresh_hz > 0, "refresh_hz must be greater than zero");
        anyhow::ensure!(
            self.swipe_threshold_px.is_finite() && self.swipe_threshold_px >= 0.0,
            "swipe_threshold_px must be a non-negative number, got {}",
            self.swipe_threshold_px
        );
        Ok(())
    }
}

/// Panel configuration: pipeline tunables plus the dashboard modules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelConfig {
    #[serde(default)]
    pub pipeline: PipelineSettings,
    #[serde(default = "default_modules")]
    pub modules: Vec<Module>,
}

fn default_modules() -> Vec<Module> {
    vec![Module::default_gesture_control()]
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            pipeline: PipelineSettings::default(),
            modules: default_modules(),
        }
    }
}

impl PanelConfig {
    /// Load and validate a JSON panel configuration
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read panel config {:?}", path))?;
        let config: PanelConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse panel config {:?}", path))?;
        config.pipeline.validate()?;
        Ok(config)
    }

    /// Find a gesture module by name, or the first one in position order
    pub fn gesture_module(&self, name: Option<&str>) -> Option<&Module> {
        let mut candidates: Vec<&Module> = self
            .modules
            .iter()
            .filter(|m| m.gesture_bindings().is_some())
            .collect();
        candidates.sort_by_key(|m| m.position);

        match name {
            Some(name) => candidates.into_iter().find(|m| m.name == name),
            None => candidates.into_iter().next(),
        }
    }
}
