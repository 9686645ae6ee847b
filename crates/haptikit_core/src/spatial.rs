// SPDX-License-Identifier: MIT OR Apache-2.0
//! Mapping world positions into device feedback space.

use crate::error::{HapticError, Result};
use serde::{Deserialize, Serialize};

/// A position in world space
pub type Vec3 = [f32; 3];

/// Centre of the device feedback volume
pub const DEVICE_CENTER: Vec3 = [0.5, 0.5, 0.5];

/// Pair of world axes forming the device's 2D feedback plane.
///
/// The first axis becomes device `x`, the second device `y`, and the remaining
/// world axis device `z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FeedbackPlane {
    /// Horizontal plane of a Y-up world
    #[default]
    XZ,
    /// Vertical plane facing the viewer
    XY,
    /// Side-on vertical plane
    YZ,
}

impl FeedbackPlane {
    /// World axis indices in device order
    fn axes(self) -> [usize; 3] {
        match self {
            Self::XZ => [0, 2, 1],
            Self::XY => [0, 1, 2],
            Self::YZ => [1, 2, 0],
        }
    }
}

/// Result of mapping a world-space source into device space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalMapping {
    /// Normalized device position, each component in `[0, 1]`
    pub position: Vec3,
    /// Intensity scale from distance falloff, `1` at the reference and `0` at `max_distance`
    pub radius_scale: f32,
}

/// Map a target relative to a reference into device space using the horizontal plane.
///
/// See [`map_directional_on`].
pub fn map_directional(target: Vec3, reference: Vec3, max_distance: f32) -> Result<DirectionalMapping> {
    map_directional_on(FeedbackPlane::default(), target, reference, max_distance)
}

/// Map a target relative to a reference into device space.
///
/// The direction from `reference` to `target` is normalized and each component is
/// rescaled from `[-1, 1]` to `[0, 1]`. Targets at or beyond `max_distance` map to a
/// zero radius scale instead of failing. Coincident positions map to the device
/// centre at full scale.
pub fn map_directional_on(
    plane: FeedbackPlane,
    target: Vec3,
    reference: Vec3,
    max_distance: f32,
) -> Result<DirectionalMapping> {
    if !(max_distance.is_finite() && max_distance > 0.0) {
        return Err(HapticError::invalid(format!(
            "max distance must be positive, got {max_distance}"
        )));
    }
    if target.iter().chain(reference.iter()).any(|c| !c.is_finite()) {
        return Err(HapticError::invalid("positions must be finite"));
    }

    let delta = [
        target[0] - reference[0],
        target[1] - reference[1],
        target[2] - reference[2],
    ];
    let distance = delta[0].hypot(delta[1]).hypot(delta[2]);
    if !distance.is_finite() {
        return Err(HapticError::invalid("positions are too far apart to map"));
    }
    let radius_scale = (1.0 - distance / max_distance).clamp(0.0, 1.0);

    if distance == 0.0 {
        return Ok(DirectionalMapping {
            position: DEVICE_CENTER,
            radius_scale,
        });
    }

    let to_device = |axis: usize| ((delta[axis] / distance + 1.0) / 2.0).clamp(0.0, 1.0);
    let [x, y, z] = plane.axes();
    Ok(DirectionalMapping {
        position: [to_device(x), to_device(y), to_device(z)],
        radius_scale,
    })
}
