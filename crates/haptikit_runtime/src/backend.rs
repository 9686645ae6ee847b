// SPDX-License-Identifier: MIT OR Apache-2.0
//! Seam to the host platform's haptic engine.
//!
//! A backend constructs primitives; a primitive accepts waveform keys, plays,
//! stops, and raises an `Ended` notification when a non-looped playback finishes.
//! Backends may return [`HapticError::UnsupportedDevice`](haptikit_core::HapticError)
//! from any call; the runtime treats that as degraded fidelity, never as failure.

use crate::notify::EndedListener;
use haptikit_core::{EffectDescriptor, EffectKind, Result, Vec3, WaveformKey};

/// Construction parameters of a host primitive
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveSpec {
    /// Effect type tag
    pub kind: EffectKind,
    /// Loop flag
    pub looped: bool,
    /// Normalized device position
    pub position: Vec3,
    /// Normalized radius
    pub radius: f32,
    /// Host object the primitive attaches to
    pub parent: Option<String>,
}

impl From<&EffectDescriptor> for PrimitiveSpec {
    fn from(descriptor: &EffectDescriptor) -> Self {
        Self {
            kind: descriptor.kind(),
            looped: descriptor.looped(),
            position: descriptor.position(),
            radius: descriptor.radius(),
            parent: descriptor.parent().map(str::to_string),
        }
    }
}

/// One host haptic effect object
pub trait HapticPrimitive: Send + 'static {
    /// Replace the intensity curve
    fn set_waveform_keys(&mut self, keys: &[WaveformKey]) -> Result<()>;

    /// Start playback from the beginning of the curve
    fn play(&mut self) -> Result<()>;

    /// Halt playback. Does not raise `Ended`.
    fn stop(&mut self) -> Result<()>;

    /// Subscribe to the `Ended` notification
    fn ended(&self) -> EndedListener;
}

/// Factory for host primitives
pub trait HapticBackend: Send + Sync + 'static {
    /// Primitive type produced by this backend
    type Primitive: HapticPrimitive;

    /// Construct a primitive for a validated descriptor
    fn construct(&self, spec: &PrimitiveSpec) -> Result<Self::Primitive>;
}
