//! `input.*` — action sources and the tick sequence format consumed by the
//! input dispatcher (spec section 4.5).

use serde::Deserialize;

use super::BrowsingContextId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct SourceId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerType {
    Mouse,
    Pen,
    Touch,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Action {
    Pause {
        #[serde(default)]
        duration: Option<u64>,
    },
    KeyDown {
        value: String,
    },
    KeyUp {
        value: String,
    },
    PointerDown {
        button: u8,
    },
    PointerUp {
        button: u8,
    },
    PointerMove {
        x: f64,
        y: f64,
        #[serde(default)]
        duration: Option<u64>,
    },
    PointerCancel,
    Scroll {
        x: f64,
        y: f64,
        #[serde(rename = "deltaX", default)]
        delta_x: f64,
        #[serde(rename = "deltaY", default)]
        delta_y: f64,
        #[serde(default)]
        duration: Option<u64>,
    },
}

impl Action {
    pub fn pause_duration(&self) -> Option<u64> {
        match self {
            Action::Pause { duration } => *duration,
            Action::PointerMove { duration, .. } | Action::Scroll { duration, .. } => *duration,
            _ => None,
        }
    }

    pub fn is_pause(&self) -> bool {
        matches!(self, Action::Pause { .. })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceActions {
    None {
        id: SourceId,
        actions: Vec<Action>,
    },
    Key {
        id: SourceId,
        actions: Vec<Action>,
    },
    Pointer {
        id: SourceId,
        #[serde(default)]
        parameters: Option<PointerParameters>,
        actions: Vec<Action>,
    },
    Wheel {
        id: SourceId,
        actions: Vec<Action>,
    },
}

impl SourceActions {
    pub fn id(&self) -> &SourceId {
        match self {
            SourceActions::None { id, .. }
            | SourceActions::Key { id, .. }
            | SourceActions::Pointer { id, .. }
            | SourceActions::Wheel { id, .. } => id,
        }
    }

    pub fn actions(&self) -> &[Action] {
        match self {
            SourceActions::None { actions, .. }
            | SourceActions::Key { actions, .. }
            | SourceActions::Pointer { actions, .. }
            | SourceActions::Wheel { actions, .. } => actions,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PointerParameters {
    #[serde(rename = "pointerType", default = "default_pointer_type")]
    pub pointer_type: PointerType,
}

fn default_pointer_type() -> PointerType {
    PointerType::Mouse
}

#[derive(Debug, Clone, Deserialize)]
pub struct PerformActionsParams {
    pub context: BrowsingContextId,
    pub actions: Vec<SourceActions>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseActionsParams {
    pub context: BrowsingContextId,
}
