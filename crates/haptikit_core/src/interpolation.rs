// SPDX-License-Identifier: MIT OR Apache-2.0
//! Linear evaluation of waveform keyframes.
//!
//! This is the reference curve for every waveform built by this crate: hosts may
//! interpolate internally, but the keys handed to them must reproduce the intended
//! curve under the rules below.

use crate::waveform::WaveformKey;

/// Linear interpolation between two floats
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Find the keyframes surrounding a time.
///
/// Keys must be sorted by time. Returns `(None, first)` before the first key,
/// `(last, None)` after the last key, and the bracketing pair otherwise.
fn bracket(keys: &[WaveformKey], time: f32) -> (Option<&WaveformKey>, Option<&WaveformKey>) {
    let next_idx = keys.partition_point(|k| k.time < time);

    match next_idx {
        0 => (None, keys.first()),
        idx if idx == keys.len() => (keys.last(), None),
        idx => (Some(&keys[idx - 1]), Some(&keys[idx])),
    }
}

/// Evaluate the intensity of a sorted key list at `time` (milliseconds).
///
/// Times at or before the first key return its intensity, times at or after the
/// last key return the last intensity. An empty list evaluates to silence.
pub fn evaluate(keys: &[WaveformKey], time: f32) -> f32 {
    let (Some(first), Some(last)) = (keys.first(), keys.last()) else {
        return 0.0;
    };
    if time <= first.time {
        return first.intensity;
    }
    if time >= last.time {
        return last.intensity;
    }

    match bracket(keys, time) {
        (Some(a), Some(b)) => {
            let span = b.time - a.time;
            if span <= f32::EPSILON {
                return b.intensity;
            }
            lerp(a.intensity, b.intensity, (time - a.time) / span)
        }
        (Some(k), None) | (None, Some(k)) => k.intensity,
        (None, None) => 0.0,
    }
}
