// SPDX-License-Identifier: MIT OR Apache-2.0
//! Effect kinds and validated effect descriptors.

use crate::error::{HapticError, Result};
use crate::spatial::Vec3;
use crate::waveform::Waveform;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Type tag of a haptic effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(clippy::upper_case_acronyms)]
pub enum EffectKind {
    /// Caller supplied waveform
    Custom,
    /// Brief, subtle tick when hovering a control
    UIHover,
    /// Crisp, short click
    UIClick,
    /// Double pulse asking for attention
    UINotification,
    /// Large rumble that decays
    GameplayExplosion,
    /// Sharp, immediate rumble
    GameplayCollision,
}

impl EffectKind {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Custom => "Custom",
            Self::UIHover => "UIHover",
            Self::UIClick => "UIClick",
            Self::UINotification => "UINotification",
            Self::GameplayExplosion => "GameplayExplosion",
            Self::GameplayCollision => "GameplayCollision",
        }
    }

    /// Get all kinds
    pub fn all() -> &'static [EffectKind] {
        &[
            Self::Custom,
            Self::UIHover,
            Self::UIClick,
            Self::UINotification,
            Self::GameplayExplosion,
            Self::GameplayCollision,
        ]
    }

    /// Preset kinds, i.e. everything except [`EffectKind::Custom`]
    pub fn presets() -> &'static [EffectKind] {
        &Self::all()[1..]
    }

    /// Whether the kind carries its own default waveform
    pub fn is_preset(&self) -> bool {
        *self != Self::Custom
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EffectKind {
    type Err = HapticError;

    fn from_str(s: &str) -> Result<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|k| k.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| HapticError::invalid(format!("unknown effect type '{s}'")))
    }
}

/// Validated, immutable description of one haptic effect.
///
/// Only [`crate::EffectFactory`] builds descriptors, so every instance already
/// passed validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectDescriptor {
    kind: EffectKind,
    looped: bool,
    position: Vec3,
    radius: f32,
    keys: Waveform,
    parent: Option<String>,
}

impl EffectDescriptor {
    pub(crate) fn new(
        kind: EffectKind,
        looped: bool,
        position: Vec3,
        radius: f32,
        keys: Waveform,
        parent: Option<String>,
    ) -> Self {
        Self {
            kind,
            looped,
            position,
            radius,
            keys,
            parent,
        }
    }

    /// Effect type
    pub fn kind(&self) -> EffectKind {
        self.kind
    }

    /// Whether playback repeats until stopped
    pub fn looped(&self) -> bool {
        self.looped
    }

    /// Normalized device position
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Normalized effect radius
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Intensity curve
    pub fn waveform(&self) -> &Waveform {
        &self.keys
    }

    /// Host object the effect is attached to, if any
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Length of one pass through the waveform
    pub fn duration_ms(&self) -> f32 {
        self.keys.duration_ms()
    }
}
