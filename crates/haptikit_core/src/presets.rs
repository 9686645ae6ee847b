// SPDX-License-Identifier: MIT OR Apache-2.0
//! Default waveforms and placement for the named presets.
//!
//! The built-in curves, in `(ms, intensity)` keys:
//!
//! | preset | keys | position | radius |
//! |---|---|---|---|
//! | `UIHover` | `(0, 0) (10, 0.3) (30, 0)` | origin | 0 |
//! | `UIClick` | `(0, 0) (5, 1) (40, 0)` | origin | 0 |
//! | `UINotification` | `(0, 0) (40, 0.8) (80, 0) (160, 0) (200, 0.8) (240, 0)` | origin | 0 |
//! | `GameplayExplosion` | `(0, 1) (100, 0.8) (400, 0.35) (900, 0)` | centre | 1 |
//! | `GameplayCollision` | `(0, 1) (60, 0.4) (150, 0)` | centre | 0.5 |
//!
//! `Custom` has no default curve; its keys always come from the caller.

use crate::descriptor::EffectKind;
use crate::error::{ensure_unit, HapticError, Result};
use crate::spatial::{Vec3, DEVICE_CENTER};
use crate::waveform::{Waveform, WaveformKey};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Default descriptor fields for one preset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetDefaults {
    /// Default intensity curve
    pub keys: Waveform,
    /// Default normalized position
    #[serde(default)]
    pub position: Vec3,
    /// Default normalized radius
    #[serde(default)]
    pub radius: f32,
    /// Whether the preset loops by default
    #[serde(default)]
    pub looped: bool,
}

impl PresetDefaults {
    /// Create defaults from a curve, at the origin with zero radius
    pub fn new(keys: Waveform) -> Self {
        Self {
            keys,
            position: [0.0; 3],
            radius: 0.0,
            looped: false,
        }
    }

    /// Set the default position
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Set the default radius
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    /// Check position and radius ranges
    pub fn validate(&self) -> Result<()> {
        for component in self.position {
            ensure_unit("position component", component)?;
        }
        ensure_unit("radius", self.radius)?;
        Ok(())
    }
}

fn curve(points: &[(f32, f32)]) -> Result<Waveform> {
    Waveform::new(points.iter().copied().map(WaveformKey::from))
}

/// Built-in defaults for a preset kind. `None` for [`EffectKind::Custom`].
pub fn builtin(kind: EffectKind) -> Option<PresetDefaults> {
    let defaults = match kind {
        EffectKind::Custom => return None,
        EffectKind::UIHover => curve(&[(0.0, 0.0), (10.0, 0.3), (30.0, 0.0)]).map(PresetDefaults::new),
        EffectKind::UIClick => curve(&[(0.0, 0.0), (5.0, 1.0), (40.0, 0.0)]).map(PresetDefaults::new),
        EffectKind::UINotification => curve(&[
            (0.0, 0.0),
            (40.0, 0.8),
            (80.0, 0.0),
            (160.0, 0.0),
            (200.0, 0.8),
            (240.0, 0.0),
        ])
        .map(PresetDefaults::new),
        EffectKind::GameplayExplosion => curve(&[(0.0, 1.0), (100.0, 0.8), (400.0, 0.35), (900.0, 0.0)])
            .map(|keys| PresetDefaults::new(keys).with_position(DEVICE_CENTER).with_radius(1.0)),
        EffectKind::GameplayCollision => curve(&[(0.0, 1.0), (60.0, 0.4), (150.0, 0.0)])
            .map(|keys| PresetDefaults::new(keys).with_position(DEVICE_CENTER).with_radius(0.5)),
    };
    // The tables above are constant and valid
    defaults.ok()
}

/// Defaults for every preset kind, in declaration order.
///
/// Every entry has passed [`PresetLibrary::set`]'s checks, including entries read
/// from a file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PresetLibrary {
    presets: IndexMap<EffectKind, PresetDefaults>,
}

impl PresetLibrary {
    /// Library holding the built-in curves
    pub fn builtin() -> Self {
        let presets = EffectKind::presets()
            .iter()
            .filter_map(|&kind| builtin(kind).map(|defaults| (kind, defaults)))
            .collect();
        Self { presets }
    }

    /// Defaults for a kind
    pub fn get(&self, kind: EffectKind) -> Option<&PresetDefaults> {
        self.presets.get(&kind)
    }

    /// Replace the defaults of a preset kind
    pub fn set(&mut self, kind: EffectKind, defaults: PresetDefaults) -> Result<()> {
        check_entry(kind, &defaults)?;
        self.insert(kind, defaults);
        Ok(())
    }

    /// Apply every entry of `overrides` on top of this library.
    ///
    /// Nothing is applied unless every entry is valid.
    pub fn merge(&mut self, overrides: PresetLibrary) -> Result<()> {
        for (kind, defaults) in &overrides.presets {
            check_entry(*kind, defaults)?;
        }
        for (kind, defaults) in overrides.presets {
            self.insert(kind, defaults);
        }
        Ok(())
    }

    fn insert(&mut self, kind: EffectKind, defaults: PresetDefaults) {
        tracing::debug!(preset = %kind, duration_ms = defaults.keys.duration_ms(), "Overriding preset");
        self.presets.insert(kind, defaults);
    }

    /// Iterate over all presets
    pub fn iter(&self) -> impl Iterator<Item = (EffectKind, &PresetDefaults)> {
        self.presets.iter().map(|(kind, defaults)| (*kind, defaults))
    }

    /// Number of presets
    pub fn len(&self) -> usize {
        self.presets.len()
    }

    /// Whether the library is empty
    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

fn check_entry(kind: EffectKind, defaults: &PresetDefaults) -> Result<()> {
    if !kind.is_preset() {
        return Err(HapticError::invalid("Custom effects have no preset defaults"));
    }
    defaults.validate()
}

impl<'de> Deserialize<'de> for PresetLibrary {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let entries = IndexMap::<EffectKind, PresetDefaults>::deserialize(deserializer)?;
        let mut library = Self {
            presets: IndexMap::with_capacity(entries.len()),
        };
        for (kind, defaults) in entries {
            library.set(kind, defaults).map_err(serde::de::Error::custom)?;
        }
        Ok(library)
    }
}

impl Default for PresetLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}
