// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error taxonomy shared by every haptikit crate.

use thiserror::Error;

/// Errors raised while building or driving haptic effects
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HapticError {
    /// Malformed configuration, keyframes or numeric range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// `play` was called on a handle that is already playing
    #[error("Effect is already playing")]
    AlreadyPlaying,

    /// The handle was destroyed and its primitive released
    #[error("Effect handle has been destroyed")]
    HandleDestroyed,

    /// The host device cannot honor the request
    #[error("Unsupported device: {0}")]
    UnsupportedDevice(String),
}

impl HapticError {
    /// Shorthand for an [`HapticError::InvalidArgument`]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Whether the error only means degraded fidelity on the device
    pub fn is_unsupported_device(&self) -> bool {
        matches!(self, Self::UnsupportedDevice(_))
    }
}

/// Result type for haptic operations
pub type Result<T> = std::result::Result<T, HapticError>;

/// Fail with `InvalidArgument` unless `value` is a finite number in `[0, 1]`.
pub(crate) fn ensure_unit(name: &str, value: f32) -> Result<f32> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(HapticError::invalid(format!("{name} must be within [0, 1], got {value}")))
    }
}
