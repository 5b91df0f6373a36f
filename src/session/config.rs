use crate::foundation::error::{MarionetteError, MarionetteResult};
use crate::layout::sizing::Sizing;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Whether the runtime is previewing live or being edited.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InteractionMode {
    /// Event handlers fire.
    #[default]
    Live,
    /// Authoring; event handlers are suppressed.
    Edit,
}

/// Runtime options, merged by the host before construction and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Start the default timeline at mount.
    pub autoplay: bool,
    /// Gates event handlers.
    pub interaction_mode: InteractionMode,
    /// Root auto-sizing preset.
    pub sizing: Sizing,
    /// Allow [`crate::Runtime::replace_document`].
    pub hot_editing: bool,
    /// Loop the default timeline.
    #[serde(rename = "loop")]
    pub looping: bool,
    /// Initial state overrides.
    pub states: BTreeMap<String, Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            autoplay: true,
            interaction_mode: InteractionMode::Live,
            sizing: Sizing::Normal,
            hot_editing: false,
            looping: false,
            states: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Parse from JSON; unknown keys are ignored, missing keys take defaults.
    pub fn from_json(s: &str) -> MarionetteResult<Self> {
        serde_json::from_str(s)
            .map_err(|e| MarionetteError::validation(format!("parse config JSON: {e}")))
    }

    /// Projection handed to guest instances: authoring-only options are not inherited.
    pub fn render_safe(&self) -> Self {
        Self {
            autoplay: self.autoplay,
            interaction_mode: self.interaction_mode,
            sizing: Sizing::Normal,
            hot_editing: false,
            looping: false,
            states: BTreeMap::new(),
        }
    }
}

/// Per-call render options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Override the configured sizing preset for this call.
    pub sizing: Option<Sizing>,
    /// Re-evaluate every selector group regardless of playback state.
    pub force_apply: bool,
    /// Bypass memoized values.
    pub skip_cache: bool,
}

impl RenderOptions {
    /// Options that re-apply everything.
    pub fn forced() -> Self {
        Self {
            force_apply: true,
            ..Self::default()
        }
    }
}
