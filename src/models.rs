use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of points in a hand landmark set
pub const LANDMARK_COUNT: usize = 21;

pub const PALM_BASE: usize = 0;
pub const THUMB_TIP: usize = 4;
pub const INDEX_TIP: usize = 8;

/// A 2-D keypoint in pixel space of the capture frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f32; 2]", into = "[f32; 2]")]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
}

impl LandmarkPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<[f32; 2]> for LandmarkPoint {
    fn from([x, y]: [f32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<LandmarkPoint> for [f32; 2] {
    fn from(point: LandmarkPoint) -> Self {
        [point.x, point.y]
    }
}

/// One detected hand: always exactly 21 points in fixed index order.
/// "No hand" is expressed as `Option<LandmarkSet>`, never as a short set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<LandmarkPoint>", into = "Vec<LandmarkPoint>")]
pub struct LandmarkSet {
    points: [LandmarkPoint; LANDMARK_COUNT],
}

impl LandmarkSet {
    pub fn new(points: [LandmarkPoint; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    /// Build a set from a slice, rejecting anything that is not exactly 21 points
    pub fn from_points(points: &[LandmarkPoint]) -> anyhow::Result<Self> {
        let points: [LandmarkPoint; LANDMARK_COUNT] = points.try_into().map_err(|_| {
            anyhow::anyhow!(
                "landmark set must have exactly {} points, got {}",
                LANDMARK_COUNT,
                points.len()
            )
        })?;
        Ok(Self { points })
    }

    pub fn points(&self) -> &[LandmarkPoint; LANDMARK_COUNT] {
        &self.points
    }

    pub fn palm_base(&self) -> LandmarkPoint {
        self.points[PALM_BASE]
    }

    pub fn thumb_tip(&self) -> LandmarkPoint {
        self.points[THUMB_TIP]
    }

    pub fn index_tip(&self) -> LandmarkPoint {
        self.points[INDEX_TIP]
    }
}

impl TryFrom<Vec<LandmarkPoint>> for LandmarkSet {
    type Error = anyhow::Error;

    fn try_from(value: Vec<LandmarkPoint>) -> Result<Self, Self::Error> {
        Self::from_points(&value)
    }
}

impl From<LandmarkSet> for Vec<LandmarkPoint> {
    fn from(set: LandmarkSet) -> Self {
        set.points.to_vec()
    }
}

/// Discrete directional gesture. `None` means no gesture is held and is never dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GestureLabel {
    SwipeLeft,
    SwipeRight,
    SwipeUp,
    SwipeDown,
    #[default]
    None,
}

impl GestureLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            GestureLabel::SwipeLeft => "swipe-left",
            GestureLabel::SwipeRight => "swipe-right",
            GestureLabel::SwipeUp => "swipe-up",
            GestureLabel::SwipeDown => "swipe-down",
            GestureLabel::None => "none",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, GestureLabel::None)
    }
}

impl fmt::Display for GestureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GestureLabel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "swipe-left" => Ok(GestureLabel::SwipeLeft),
            "swipe-right" => Ok(GestureLabel::SwipeRight),
            "swipe-up" => Ok(GestureLabel::SwipeUp),
            "swipe-down" => Ok(GestureLabel::SwipeDown),
            "none" => Ok(GestureLabel::None),
            other => Err(anyhow::anyhow!("Unknown gesture label: {}", other)),
        }
    }
}

/// User-configured mapping from a gesture to the action text shown when it fires
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionBinding {
    pub gesture: GestureLabel,
    pub action: String,
}

impl ActionBinding {
    pub fn new(gesture: GestureLabel, action: impl Into<String>) -> Self {
        Self {
            gesture,
            action: action.into(),
        }
    }
}

/// Per-kind payload of a dashboard module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ModuleKind {
    Switch {
        #[serde(default)]
        state: bool,
    },
    Temperature {
        #[serde(default)]
        value: f32,
        #[serde(default = "default_unit")]
        unit: String,
    },
    Smoke {
        #[serde(default)]
        status: String,
    },
    Gesture {
        #[serde(default)]
        actions: Vec<ActionBinding>,
    },
}

fn default_unit() -> String {
    "°C".to_string()
}

impl ModuleKind {
    pub fn name(&self) -> &'static str {
        match self {
            ModuleKind::Switch { .. } => "switch",
            ModuleKind::Temperature { .. } => "temperature",
            ModuleKind::Smoke { .. } => "smoke",
            ModuleKind::Gesture { .. } => "gesture",
        }
    }
}

/// A dashboard module. Only the gesture kind drives the recognition pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub position: u32,
    #[serde(flatten)]
    pub kind: ModuleKind,
}

impl Module {
    pub fn new(name: impl Into<String>, kind: ModuleKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            position: 0,
            kind,
        }
    }

    pub fn with_position(mut self, position: u32) -> Self {
        self.position = position;
        self
    }

    /// Action bindings, if this is a gesture module
    pub fn gesture_bindings(&self) -> Option<&[ActionBinding]> {
        match &self.kind {
            ModuleKind::Gesture { actions } => Some(actions),
            _ => None,
        }
    }

    /// The stock gesture module every new panel starts with
    pub fn default_gesture_control() -> Self {
        Self::new(
            "Gesture Control",
            ModuleKind::Gesture {
                actions: vec![
                    ActionBinding::new(GestureLabel::SwipeLeft, "Turn Off All Lights"),
                    ActionBinding::new(GestureLabel::SwipeRight, "Turn On All Lights"),
                    ActionBinding::new(GestureLabel::SwipeUp, "Increase Temperature"),
                    ActionBinding::new(GestureLabel::SwipeDown, "Decrease Temperature"),
                ],
            },
        )
    }
}
