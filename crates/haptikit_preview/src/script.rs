// SPDX-License-Identifier: MIT OR Apache-2.0
//! Preview scripts.
//!
//! A script is a RON file describing what the preview should play:
//! - Optional preset overrides
//! - Waveform patterns to sample into the log
//! - Looping effects held for a while, then stopped
//! - Directional effects mapped from world positions
//! - A timed sequence of effects

use crate::error::{PreviewError, Result};
use haptikit_core::{EffectConfig, PresetLibrary, Vec3, WaveformPattern};
use haptikit_runtime::SequenceStep;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Script played when no path is given
pub const BUILTIN_SCRIPT: &str = r#"#![enable(implicit_some)]
(
    tick_ms: 20,
    presets: {
        UIClick: (
            keys: [(time: 0.0, intensity: 0.0), (time: 4.0, intensity: 1.0), (time: 35.0, intensity: 0.0)],
        ),
    },
    patterns: [
        (pattern: rampUp, duration_ms: 500.0, intensity: 1.0),
        (pattern: pulse, duration_ms: 200.0, intensity: 0.6),
    ],
    looping: [
        (effect: (type: "GameplayCollision"), hold_ms: 400),
    ],
    directional: [
        (target: (4.0, 0.0, 3.0), reference: (0.0, 0.0, 0.0), max_distance: 10.0, effect: (type: "GameplayExplosion")),
        (target: (0.0, 0.0, -40.0), reference: (0.0, 0.0, 0.0), max_distance: 10.0, effect: (type: "GameplayExplosion")),
    ],
    steps: [
        (delay_ms: 0, effect: (type: "UIHover")),
        (delay_ms: 200, effect: (type: "UIClick")),
        (delay_ms: 200, effect: (type: "UINotification", radius: 0.4)),
        (delay_ms: 150, effect: (type: "Custom", keys: [(time: 0.0, intensity: 0.5)])),
        (delay_ms: 150, effect: (type: "Custom", keys: [(time: 0.0, intensity: 0.2), (time: 120.0, intensity: 0.9), (time: 240.0, intensity: 0.0)])),
        (delay_ms: 100, effect: (type: "GameplayCollision", position: (0.1, 0.5, 0.5))),
    ],
)
"#;

fn default_tick_ms() -> u64 {
    20
}

/// Pattern to sample and log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternPreview {
    /// Curve shape
    pub pattern: WaveformPattern,
    /// Curve length
    pub duration_ms: f32,
    /// Peak intensity
    pub intensity: f32,
}

/// Looping effect to hold, then stop and destroy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopingPreview {
    /// Effect to loop
    pub effect: EffectConfig,
    /// How long to let it loop
    pub hold_ms: u64,
}

/// Effect placed from world coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionalPreview {
    /// Source position
    pub target: Vec3,
    /// Listener position
    pub reference: Vec3,
    /// Distance at which feedback fades out
    pub max_distance: f32,
    /// Effect to place
    pub effect: EffectConfig,
}

/// Sequence entry as written in a script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    /// Delay after the previous step's dispatch
    #[serde(default)]
    pub delay_ms: u64,
    /// Effect to dispatch
    pub effect: EffectConfig,
}

/// A whole preview script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewScript {
    /// Interval between logged intensity samples
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Preset overrides applied over the built-in library
    #[serde(default)]
    pub presets: Option<PresetLibrary>,
    /// Patterns to sample
    #[serde(default)]
    pub patterns: Vec<PatternPreview>,
    /// Looping effects to hold
    #[serde(default)]
    pub looping: Vec<LoopingPreview>,
    /// Directional effects to play
    #[serde(default)]
    pub directional: Vec<DirectionalPreview>,
    /// Timed sequence
    #[serde(default)]
    pub steps: Vec<ScriptStep>,
}

impl PreviewScript {
    /// Parse a script from RON text
    pub fn parse(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    /// Load a script file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| PreviewError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!("Loaded preview script from {:?}", path);
        Self::parse(&text)
    }

    /// The built-in demo script
    pub fn builtin() -> Result<Self> {
        Self::parse(BUILTIN_SCRIPT)
    }

    /// Sequence steps, validated only when dispatched
    pub fn sequence(&self) -> Vec<SequenceStep> {
        self.steps
            .iter()
            .map(|step| SequenceStep::new(step.delay_ms, step.effect.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haptikit_core::EffectKind;

    #[test]
    fn test_builtin_parses() {
        let script = PreviewScript::builtin().unwrap();
        assert_eq!(script.tick_ms, 20);
        assert_eq!(script.steps.len(), 6);
        assert_eq!(script.patterns[0].pattern, WaveformPattern::RampUp);
        assert_eq!(script.directional.len(), 2);
        let presets = script.presets.as_ref().unwrap();
        assert!(presets.get(EffectKind::UIClick).is_some());
    }

    #[test]
    fn test_minimal_script() {
        let script = PreviewScript::parse("(steps: [(effect: (type: \"UIClick\"))])").unwrap();
        assert_eq!(script.tick_ms, 20);
        assert!(script.presets.is_none());
        assert_eq!(script.steps[0].delay_ms, 0);
        assert_eq!(script.sequence().len(), 1);
    }

    #[test]
    fn test_invalid_preset_override_fails_to_parse() {
        let text = "(presets: Some({ UIClick: (keys: [(time: 0.0, intensity: 1.0)]) }))";
        assert!(matches!(PreviewScript::parse(text), Err(PreviewError::Parse(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = PreviewScript::load(Path::new("/nonexistent/haptikit.ron")).unwrap_err();
        assert!(matches!(err, PreviewError::Read { .. }));
    }
}
