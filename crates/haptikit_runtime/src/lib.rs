// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback runtime for haptikit effects.
//!
//! This crate drives validated descriptors on a host haptic engine:
//! - Playback handles with an explicit lifecycle
//! - Self-releasing one-shot effects
//! - Delay-gated, cancellable sequences
//! - A service object exposing the whole surface
//!
//! ## Architecture
//!
//! The host engine sits behind the [`HapticBackend`] / [`HapticPrimitive`] traits.
//! Timed waits and completion notifications run on tokio; everything else is
//! synchronous and owned by the caller.

pub mod backend;
pub mod cancel;
pub mod controller;
pub mod notify;
pub mod oneshot;
pub mod sequencer;
pub mod service;

#[cfg(test)]
mod mock;

pub use backend::{HapticBackend, HapticPrimitive, PrimitiveSpec};
pub use cancel::CancelToken;
pub use controller::{EndOutcome, EndWait, HandleId, PlaybackHandle, PlaybackState};
pub use notify::{EndedListener, EndedSignal};
pub use oneshot::{play_one_shot, OneShot};
pub use sequencer::{
    play_sequence, SequenceCanceller, SequenceReport, SequenceRun, SequenceStep, StepEffect,
};
pub use service::{HapticService, ServiceHandle};
