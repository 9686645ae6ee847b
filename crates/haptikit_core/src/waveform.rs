// SPDX-License-Identifier: MIT OR Apache-2.0
//! Waveform keyframes and the pattern builder.

use crate::error::{ensure_unit, HapticError, Result};
use crate::interpolation;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A single control point of a vibration curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveformKey {
    /// Time in milliseconds from the start of the effect
    pub time: f32,
    /// Intensity at this time, `0.0..=1.0`
    pub intensity: f32,
}

impl WaveformKey {
    /// Create a new keyframe
    pub fn new(time: f32, intensity: f32) -> Self {
        Self { time, intensity }
    }
}

impl From<(f32, f32)> for WaveformKey {
    fn from((time, intensity): (f32, f32)) -> Self {
        Self::new(time, intensity)
    }
}

/// Named curve shapes understood by [`build_pattern`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WaveformPattern {
    /// Silence rising to the peak
    RampUp,
    /// Peak falling to silence
    RampDown,
    /// Attack, release to silence at the midpoint, attack again
    Pulse,
    /// Flat at the peak
    Constant,
}

impl WaveformPattern {
    /// Name used in configuration files
    pub fn name(&self) -> &'static str {
        match self {
            Self::RampUp => "rampUp",
            Self::RampDown => "rampDown",
            Self::Pulse => "pulse",
            Self::Constant => "constant",
        }
    }

    /// Every pattern
    pub fn all() -> &'static [WaveformPattern] {
        &[Self::RampUp, Self::RampDown, Self::Pulse, Self::Constant]
    }
}

impl fmt::Display for WaveformPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WaveformPattern {
    type Err = HapticError;

    fn from_str(s: &str) -> Result<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| HapticError::invalid(format!("unknown waveform pattern '{s}'")))
    }
}

/// Build the keys for a named pattern.
///
/// `duration_ms` must be positive and `peak` within `[0, 1]`. The result is sorted,
/// starts at `0` and ends at `duration_ms`.
pub fn build_pattern(pattern: WaveformPattern, duration_ms: f32, peak: f32) -> Result<Vec<WaveformKey>> {
    if !(duration_ms.is_finite() && duration_ms > 0.0) {
        return Err(HapticError::invalid(format!(
            "pattern duration must be positive, got {duration_ms}"
        )));
    }
    let peak = ensure_unit("peak intensity", peak)?;

    let keys = match pattern {
        WaveformPattern::RampUp => vec![
            WaveformKey::new(0.0, 0.0),
            WaveformKey::new(duration_ms, peak),
        ],
        WaveformPattern::RampDown => vec![
            WaveformKey::new(0.0, peak),
            WaveformKey::new(duration_ms, 0.0),
        ],
        WaveformPattern::Pulse => vec![
            WaveformKey::new(0.0, peak),
            WaveformKey::new(duration_ms / 2.0, 0.0),
            WaveformKey::new(duration_ms, peak),
        ],
        WaveformPattern::Constant => vec![
            WaveformKey::new(0.0, peak),
            WaveformKey::new(duration_ms, peak),
        ],
    };
    Ok(keys)
}

/// Normalize a caller supplied key list.
///
/// Sorts by time and collapses keys sharing a timestamp, keeping the last one given.
/// Fails when fewer than two keys remain, or when any time is negative or any
/// intensity falls outside `[0, 1]`.
pub fn validate(mut keys: Vec<WaveformKey>) -> Result<Vec<WaveformKey>> {
    for key in &keys {
        if !(key.time.is_finite() && key.time >= 0.0) {
            return Err(HapticError::invalid(format!(
                "keyframe time must be non-negative, got {}",
                key.time
            )));
        }
        ensure_unit("keyframe intensity", key.intensity)?;
    }

    // Stable sort keeps caller order among equal times, so the last one wins below
    keys.sort_by(|a, b| a.time.total_cmp(&b.time));
    let mut normalized: Vec<WaveformKey> = Vec::with_capacity(keys.len());
    for key in keys {
        match normalized.last_mut() {
            Some(prev) if prev.time == key.time => *prev = key,
            _ => normalized.push(key),
        }
    }

    if normalized.len() < 2 {
        return Err(HapticError::invalid(format!(
            "a waveform needs at least 2 distinct keyframes, got {}",
            normalized.len()
        )));
    }
    Ok(normalized)
}

/// Most samples [`Waveform::sample`] will produce
pub const MAX_SAMPLES: usize = 100_000;

/// A validated, immutable keyframe list
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    keys: Arc<[WaveformKey]>,
}

impl Waveform {
    /// Validate and wrap a key list
    pub fn new(keys: impl IntoIterator<Item = WaveformKey>) -> Result<Self> {
        let keys = validate(keys.into_iter().collect())?;
        Ok(Self { keys: keys.into() })
    }

    /// Build a waveform from a named pattern
    pub fn from_pattern(pattern: WaveformPattern, duration_ms: f32, peak: f32) -> Result<Self> {
        Self::new(build_pattern(pattern, duration_ms, peak)?)
    }

    /// The keys, sorted by time
    pub fn keys(&self) -> &[WaveformKey] {
        &self.keys
    }

    /// Time of the last key
    pub fn duration_ms(&self) -> f32 {
        self.keys.last().map(|k| k.time).unwrap_or(0.0)
    }

    /// Highest intensity on the curve
    pub fn peak(&self) -> f32 {
        self.keys.iter().map(|k| k.intensity).fold(0.0, f32::max)
    }

    /// Intensity at a time in milliseconds
    pub fn evaluate(&self, time_ms: f32) -> f32 {
        interpolation::evaluate(&self.keys, time_ms)
    }

    /// Copy of this waveform with every intensity multiplied by `factor`
    pub fn scaled(&self, factor: f32) -> Result<Self> {
        let factor = ensure_unit("intensity scale", factor)?;
        let keys: Arc<[WaveformKey]> = self
            .keys
            .iter()
            .map(|k| WaveformKey::new(k.time, k.intensity * factor))
            .collect();
        Ok(Self { keys })
    }

    /// Evaluate the curve every `step_ms` from `0` to the duration, inclusive.
    ///
    /// Fails if that would take more than [`MAX_SAMPLES`] samples.
    pub fn sample(&self, step_ms: f32) -> Result<Vec<(f32, f32)>> {
        if !(step_ms.is_finite() && step_ms > 0.0) {
            return Err(HapticError::invalid(format!("sample step must be positive, got {step_ms}")));
        }
        let duration = self.duration_ms();
        let steps = (duration / step_ms).ceil();
        if steps >= MAX_SAMPLES as f32 {
            return Err(HapticError::invalid(format!(
                "sampling {duration}ms every {step_ms}ms exceeds {MAX_SAMPLES} samples"
            )));
        }
        let steps = steps as usize;
        Ok((0..=steps)
            .map(|i| (i as f32 * step_ms).min(duration))
            .map(|t| (t, self.evaluate(t)))
            .collect())
    }
}

impl Serialize for Waveform {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.keys.as_ref().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Waveform {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let keys = Vec::<WaveformKey>::deserialize(deserializer)?;
        Self::new(keys).map_err(serde::de::Error::custom)
    }
}
