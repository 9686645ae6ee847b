// SPDX-License-Identifier: MIT OR Apache-2.0
//! Caller-facing effect configuration.

use crate::descriptor::EffectKind;
use crate::spatial::Vec3;
use crate::waveform::WaveformKey;
use serde::{Deserialize, Serialize};

/// Request for one effect, before validation.
///
/// Omitted fields fall back to the preset defaults of the requested type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectConfig {
    /// Effect type name, e.g. `"UIClick"` or `"Custom"`
    #[serde(rename = "type")]
    pub kind: String,
    /// Repeat until stopped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub looped: Option<bool>,
    /// Normalized device position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec3>,
    /// Normalized radius
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f32>,
    /// Host object to attach the effect to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Waveform keys, required for `Custom`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keys: Option<Vec<WaveformKey>>,
}

impl EffectConfig {
    /// Create a config for a type name
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            looped: None,
            position: None,
            radius: None,
            parent: None,
            keys: None,
        }
    }

    /// Create a config for a known kind
    pub fn of(kind: EffectKind) -> Self {
        Self::new(kind.name())
    }

    /// Create a custom config from keys
    pub fn custom(keys: impl IntoIterator<Item = WaveformKey>) -> Self {
        Self::of(EffectKind::Custom).with_keys(keys)
    }

    /// Set the loop flag
    pub fn with_looped(mut self, looped: bool) -> Self {
        self.looped = Some(looped);
        self
    }

    /// Set the position
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = Some(position);
        self
    }

    /// Set the radius
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = Some(radius);
        self
    }

    /// Set the parent
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Set the waveform keys
    pub fn with_keys(mut self, keys: impl IntoIterator<Item = WaveformKey>) -> Self {
        self.keys = Some(keys.into_iter().collect());
        self
    }
}

impl From<EffectKind> for EffectConfig {
    fn from(kind: EffectKind) -> Self {
        Self::of(kind)
    }
}
