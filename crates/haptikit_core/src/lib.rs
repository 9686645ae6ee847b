// SPDX-License-Identifier: MIT OR Apache-2.0
//! Haptic effect descriptors and the math behind them.
//!
//! This crate turns high-level intents into the primitives a host haptic engine
//! accepts:
//! - Named waveform patterns and validated custom keyframes
//! - Linear evaluation of keyframe curves
//! - Directional mapping from world positions into device space
//! - Preset defaults and the descriptor factory
//!
//! ## Architecture
//!
//! Everything here is pure and synchronous. Playback, one-shots and timed
//! sequences live in `haptikit_runtime`.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod factory;
pub mod interpolation;
pub mod presets;
pub mod spatial;
pub mod waveform;

pub use config::EffectConfig;
pub use descriptor::{EffectDescriptor, EffectKind};
pub use error::{HapticError, Result};
pub use factory::EffectFactory;
pub use interpolation::evaluate;
pub use presets::{PresetDefaults, PresetLibrary};
pub use spatial::{map_directional, map_directional_on, DirectionalMapping, FeedbackPlane, Vec3};
pub use waveform::{build_pattern, validate, Waveform, WaveformKey, WaveformPattern, MAX_SAMPLES};
