// SPDX-License-Identifier: MIT OR Apache-2.0
//! Assembly of validated effect descriptors from configuration.

use crate::config::EffectConfig;
use crate::descriptor::{EffectDescriptor, EffectKind};
use crate::error::{ensure_unit, HapticError, Result};
use crate::presets::PresetLibrary;
use crate::spatial::{map_directional_on, DirectionalMapping, FeedbackPlane, Vec3};
use crate::waveform::{Waveform, WaveformKey};

/// Builds descriptors, applying preset defaults to whatever the config leaves out.
///
/// Construct one per application and pass it to whoever needs it.
#[derive(Debug, Clone, Default)]
pub struct EffectFactory {
    presets: PresetLibrary,
}

impl EffectFactory {
    /// Factory using the built-in presets
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory using a custom preset library.
    ///
    /// Libraries only hold entries that passed validation, so every preset the
    /// factory hands out is in range.
    pub fn with_presets(presets: PresetLibrary) -> Self {
        Self { presets }
    }

    /// The preset library in use
    pub fn presets(&self) -> &PresetLibrary {
        &self.presets
    }

    /// Validate a config and build its descriptor.
    ///
    /// `Custom` requires at least two valid keys. Presets take their curve, position,
    /// radius and loop flag from the library unless the config overrides them;
    /// overrides are range checked the same way custom input is.
    pub fn create(&self, config: &EffectConfig) -> Result<EffectDescriptor> {
        let kind: EffectKind = config.kind.parse()?;

        let (keys, position, radius, looped) = match kind {
            EffectKind::Custom => {
                let keys = config
                    .keys
                    .clone()
                    .filter(|keys| !keys.is_empty())
                    .ok_or_else(|| HapticError::invalid("Custom effects require waveform keys"))?;
                (Waveform::new(keys)?, [0.0; 3], 0.0, false)
            }
            EffectKind::UIHover
            | EffectKind::UIClick
            | EffectKind::UINotification
            | EffectKind::GameplayExplosion
            | EffectKind::GameplayCollision => {
                let defaults = self
                    .presets
                    .get(kind)
                    .ok_or_else(|| HapticError::invalid(format!("no defaults registered for {kind}")))?;
                let keys = match &config.keys {
                    Some(keys) => Waveform::new(keys.iter().copied())?,
                    None => defaults.keys.clone(),
                };
                (keys, defaults.position, defaults.radius, defaults.looped)
            }
        };

        let position = match config.position {
            Some(position) => validate_position(position)?,
            None => position,
        };
        let radius = match config.radius {
            Some(radius) => ensure_unit("radius", radius)?,
            None => radius,
        };
        let looped = config.looped.unwrap_or(looped);

        tracing::debug!(
            kind = %kind,
            looped,
            keys = keys.keys().len(),
            duration_ms = keys.duration_ms(),
            "Created effect descriptor"
        );
        Ok(EffectDescriptor::new(
            kind,
            looped,
            position,
            radius,
            keys,
            config.parent.clone(),
        ))
    }

    /// Build a `Custom` descriptor from keys, with optional extra settings
    pub fn create_custom(
        &self,
        keys: impl IntoIterator<Item = WaveformKey>,
        config: Option<EffectConfig>,
    ) -> Result<EffectDescriptor> {
        let mut config = config.unwrap_or_else(|| EffectConfig::of(EffectKind::Custom));
        config.kind = EffectKind::Custom.name().to_string();
        self.create(&config.with_keys(keys))
    }

    /// Build a descriptor for a preset kind, with optional overrides
    pub fn create_preset(&self, kind: EffectKind, config: Option<EffectConfig>) -> Result<EffectDescriptor> {
        let mut config = config.unwrap_or_else(|| EffectConfig::of(kind));
        config.kind = kind.name().to_string();
        self.create(&config)
    }

    /// Build a descriptor that loops until stopped
    pub fn create_looping(&self, config: &EffectConfig) -> Result<EffectDescriptor> {
        self.create(&config.clone().with_looped(true))
    }

    /// Build a descriptor positioned from world coordinates on the horizontal plane.
    ///
    /// See [`EffectFactory::create_directional_on`].
    pub fn create_directional(
        &self,
        target: Vec3,
        reference: Vec3,
        max_distance: f32,
        config: &EffectConfig,
    ) -> Result<EffectDescriptor> {
        self.create_directional_on(FeedbackPlane::default(), target, reference, max_distance, config)
    }

    /// Build a descriptor positioned from world coordinates.
    ///
    /// The mapped device position replaces the configured one, the radius becomes the
    /// distance falloff scale, and every waveform intensity is multiplied by it.
    pub fn create_directional_on(
        &self,
        plane: FeedbackPlane,
        target: Vec3,
        reference: Vec3,
        max_distance: f32,
        config: &EffectConfig,
    ) -> Result<EffectDescriptor> {
        let DirectionalMapping { position, radius_scale } =
            map_directional_on(plane, target, reference, max_distance)?;
        let base = self.create(config)?;
        let keys = base.waveform().scaled(radius_scale)?;

        tracing::debug!(kind = %base.kind(), ?position, radius_scale, "Mapped directional effect");
        Ok(EffectDescriptor::new(
            base.kind(),
            base.looped(),
            position,
            radius_scale,
            keys,
            base.parent().map(str::to_string),
        ))
    }
}

fn validate_position(position: Vec3) -> Result<Vec3> {
    for component in position {
        ensure_unit("position component", component)?;
    }
    Ok(position)
}
