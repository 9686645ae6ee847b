// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback handles owning one host primitive each.
//!
//! Lifecycle: `Idle -> Playing -> {Ended, Stopped}`. A fresh [`PlaybackHandle::play`]
//! re-arms a stopped or ended handle; calling it while playing fails with
//! `AlreadyPlaying`. [`PlaybackHandle::destroy`] releases the primitive from any
//! state, after which every operation fails with `HandleDestroyed`.

use crate::backend::{HapticBackend, HapticPrimitive, PrimitiveSpec};
use crate::cancel::CancelToken;
use crate::notify::{EndedListener, EndedSignal};
use futures::future::BoxFuture;
use futures::FutureExt;
use haptikit_core::{EffectDescriptor, HapticError, Result};
use std::fmt;
use tokio::sync::watch;
use uuid::Uuid;

/// Unique identifier for a playback handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleId(pub Uuid);

impl HandleId {
    /// Create a new random handle ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for HandleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Playback state of a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Created, never played
    #[default]
    Idle,
    /// Primitive is playing
    Playing,
    /// Stopped by the caller
    Stopped,
    /// Primitive reported completion
    Ended,
    /// Primitive released
    Destroyed,
}

/// How an [`EndWait`] resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndOutcome {
    /// The primitive finished playing
    Completed,
    /// The handle was destroyed first
    Released,
}

/// Owned future returned by [`PlaybackHandle::await_end`]
pub type EndWait = BoxFuture<'static, EndOutcome>;

/// Notification counts when a playback started
#[derive(Debug, Clone, Copy, Default)]
struct Baseline {
    /// Number of `play` calls so far
    generation: u64,
    device: u64,
    fallback: u64,
}

enum Output<P> {
    /// Live host primitive
    Device(P),
    /// The host could not build a primitive; playback is simulated
    Silent,
    Released,
}

/// A descriptor paired with the host primitive playing it.
///
/// The handle is the only owner of its primitive. Dropping a live handle stops and
/// releases the primitive as [`PlaybackHandle::destroy`] would.
pub struct PlaybackHandle<P: HapticPrimitive> {
    id: HandleId,
    descriptor: EffectDescriptor,
    output: Output<P>,
    state: PlaybackState,
    device_ended: Option<EndedListener>,
    /// Raised by the handle itself when the device cannot play
    fallback: EndedSignal,
    fallback_ended: EndedListener,
    armed: watch::Sender<Baseline>,
    released: CancelToken,
}

impl<P: HapticPrimitive> PlaybackHandle<P> {
    /// Construct the host primitive for a descriptor. The handle starts `Idle`.
    ///
    /// A backend answering `UnsupportedDevice` yields a silent handle whose
    /// playback completes immediately.
    pub fn create<B>(backend: &B, descriptor: EffectDescriptor) -> Result<Self>
    where
        B: HapticBackend<Primitive = P>,
    {
        let id = HandleId::new();
        let output = match backend.construct(&PrimitiveSpec::from(&descriptor)) {
            Ok(primitive) => Output::Device(primitive),
            Err(err) if err.is_unsupported_device() => {
                tracing::warn!(handle = %id, kind = %descriptor.kind(), %err, "Device unsupported, effect will be silent");
                Output::Silent
            }
            Err(err) => return Err(err),
        };
        let device_ended = match &output {
            Output::Device(primitive) => Some(primitive.ended()),
            Output::Silent | Output::Released => None,
        };
        let fallback = EndedSignal::new();
        let fallback_ended = fallback.listen();

        tracing::debug!(handle = %id, kind = %descriptor.kind(), "Created playback handle");
        Ok(Self {
            id,
            descriptor,
            output,
            state: PlaybackState::Idle,
            device_ended,
            fallback,
            fallback_ended,
            armed: watch::channel(Baseline::default()).0,
            released: CancelToken::new(),
        })
    }

    /// Handle identifier
    pub fn id(&self) -> HandleId {
        self.id
    }

    /// The descriptor this handle plays
    pub fn descriptor(&self) -> &EffectDescriptor {
        &self.descriptor
    }

    /// Whether a host primitive backs this handle
    pub fn is_silent(&self) -> bool {
        matches!(self.output, Output::Silent)
    }

    /// Current state, including completions not yet observed
    pub fn state(&self) -> PlaybackState {
        if self.state == PlaybackState::Playing && self.completion_pending() {
            PlaybackState::Ended
        } else {
            self.state
        }
    }

    fn completion_pending(&self) -> bool {
        self.fallback_ended.has_fired()
            || self.device_ended.as_ref().is_some_and(EndedListener::has_fired)
    }

    fn refresh(&mut self) -> Result<()> {
        if self.state == PlaybackState::Destroyed {
            return Err(HapticError::HandleDestroyed);
        }
        self.state = self.state();
        Ok(())
    }

    /// Apply `f` to the primitive, downgrading `UnsupportedDevice` to a warning.
    ///
    /// Returns whether the device honored the request.
    fn drive(&mut self, op: &'static str, f: impl FnOnce(&mut P) -> Result<()>) -> Result<bool> {
        let Output::Device(primitive) = &mut self.output else {
            return Ok(false);
        };
        match f(primitive) {
            Ok(()) => Ok(true),
            Err(err) if err.is_unsupported_device() => {
                tracing::warn!(handle = %self.id, op, %err, "Device could not honor request");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// Send the descriptor to the primitive and start playback
    pub fn play(&mut self) -> Result<()> {
        self.refresh()?;
        if self.state == PlaybackState::Playing {
            return Err(HapticError::AlreadyPlaying);
        }

        if let Some(listener) = self.device_ended.as_mut() {
            listener.mark_seen();
        }
        self.fallback_ended.mark_seen();
        let device = self.device_ended.as_ref().map_or(0, EndedListener::raised);
        let fallback = self.fallback_ended.raised();
        self.armed.send_modify(|baseline| {
            *baseline = Baseline {
                generation: baseline.generation + 1,
                device,
                fallback,
            };
        });

        // Without custom keys the device still plays its own rendition
        let waveform = self.descriptor.waveform().clone();
        let shaped = self.drive("set_waveform_keys", |primitive| {
            primitive.set_waveform_keys(waveform.keys())
        })?;
        let played = self.drive("play", P::play)?;
        self.state = PlaybackState::Playing;

        if !played && !self.descriptor.looped() {
            self.fallback.raise();
        }
        tracing::debug!(
            handle = %self.id,
            kind = %self.descriptor.kind(),
            shaped,
            silent = !played,
            "Playing"
        );
        Ok(())
    }

    /// Stop playback. No-op unless playing.
    pub fn stop(&mut self) -> Result<()> {
        self.refresh()?;
        if self.state != PlaybackState::Playing {
            return Ok(());
        }
        self.drive("stop", P::stop)?;
        self.state = PlaybackState::Stopped;
        tracing::debug!(handle = %self.id, "Stopped");
        Ok(())
    }

    /// Release the primitive. Pending [`EndWait`]s resolve as `Released`.
    pub fn destroy(&mut self) -> Result<()> {
        self.refresh()?;
        self.release();
        tracing::debug!(handle = %self.id, "Destroyed");
        Ok(())
    }

    fn release(&mut self) {
        if self.state() == PlaybackState::Playing {
            if let Err(err) = self.drive("stop", P::stop) {
                tracing::warn!(handle = %self.id, %err, "Stop failed while releasing");
            }
        }
        self.output = Output::Released;
        self.device_ended = None;
        self.state = PlaybackState::Destroyed;
        self.released.cancel();
    }

    /// Future resolving when the primitive signals completion.
    ///
    /// On a playing handle the wait tracks the current playback. On an idle or
    /// stopped handle it tracks the next [`PlaybackHandle::play`]; notifications
    /// raised before that play are ignored.
    ///
    /// Looped effects never complete on their own: the wait only resolves, as
    /// [`EndOutcome::Released`], once the handle is destroyed. Pair every wait on a
    /// looped effect with a stop and destroy, or it stays pending.
    pub fn await_end(&self) -> Result<EndWait> {
        if self.state == PlaybackState::Destroyed {
            return Err(HapticError::HandleDestroyed);
        }
        let state = self.state();
        if state == PlaybackState::Ended {
            return Ok(futures::future::ready(EndOutcome::Completed).boxed());
        }

        let current = self.armed.borrow().generation;
        let target = if state == PlaybackState::Playing { current } else { current + 1 };
        let armed = self.armed.subscribe();
        let device = self.device_ended.clone();
        let fallback = self.fallback_ended.clone();
        let released = self.released.clone();
        Ok(async move {
            tokio::select! {
                biased;
                true = completion(armed, target, device, fallback) => EndOutcome::Completed,
                _ = released.cancelled() => EndOutcome::Released,
            }
        }
        .boxed())
    }
}

/// Wait for the playback numbered `target` to start, then for its completion
async fn completion(
    mut armed: watch::Receiver<Baseline>,
    target: u64,
    device: Option<EndedListener>,
    mut fallback: EndedListener,
) -> bool {
    let baseline = match armed.wait_for(|baseline| baseline.generation >= target).await {
        Ok(baseline) => *baseline,
        Err(_) => return false,
    };
    tokio::select! {
        biased;
        true = device_fired_after(device, baseline.device) => true,
        true = fallback.raised_after(baseline.fallback) => true,
        else => false,
    }
}

async fn device_fired_after(listener: Option<EndedListener>, count: u64) -> bool {
    match listener {
        Some(mut listener) => listener.raised_after(count).await,
        None => false,
    }
}

impl<P: HapticPrimitive> Drop for PlaybackHandle<P> {
    fn drop(&mut self) {
        if self.state != PlaybackState::Destroyed {
            self.release();
        }
    }
}

impl<P: HapticPrimitive> fmt::Debug for PlaybackHandle<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackHandle")
            .field("id", &self.id)
            .field("kind", &self.descriptor.kind())
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Action, MockBackend};
    use haptikit_core::{EffectConfig, EffectFactory, EffectKind};
    use std::time::Duration;

    fn click() -> EffectDescriptor {
        EffectFactory::new().create_preset(EffectKind::UIClick, None).unwrap()
    }

    fn looping() -> EffectDescriptor {
        EffectFactory::new()
            .create_looping(&EffectConfig::of(EffectKind::GameplayExplosion))
            .unwrap()
    }

    #[tokio::test]
    async fn test_lifecycle() {
        let backend = MockBackend::manual();
        let mut handle = PlaybackHandle::create(&backend, click()).unwrap();
        assert_eq!(handle.state(), PlaybackState::Idle);
        assert_eq!(backend.live(), 1);

        // Stop before play is a no-op
        handle.stop().unwrap();
        assert_eq!(handle.state(), PlaybackState::Idle);

        handle.play().unwrap();
        assert_eq!(handle.state(), PlaybackState::Playing);
        assert_eq!(handle.play(), Err(HapticError::AlreadyPlaying));
        assert_eq!(backend.count(Action::Keys), 1);

        handle.stop().unwrap();
        assert_eq!(handle.state(), PlaybackState::Stopped);
        handle.stop().unwrap();
        assert_eq!(backend.count(Action::Stop), 1);

        // Re-arm
        handle.play().unwrap();
        assert_eq!(handle.state(), PlaybackState::Playing);
        assert_eq!(backend.count(Action::Play), 2);

        handle.destroy().unwrap();
        assert_eq!(handle.state(), PlaybackState::Destroyed);
        assert_eq!(backend.live(), 0);
        assert_eq!(handle.play(), Err(HapticError::HandleDestroyed));
        assert_eq!(handle.stop(), Err(HapticError::HandleDestroyed));
        assert_eq!(handle.destroy(), Err(HapticError::HandleDestroyed));
        assert!(matches!(handle.await_end(), Err(HapticError::HandleDestroyed)));
    }

    #[tokio::test]
    async fn test_ended_notification() {
        let backend = MockBackend::manual();
        let mut handle = PlaybackHandle::create(&backend, click()).unwrap();
        handle.play().unwrap();
        let wait = handle.await_end().unwrap();

        backend.raise_ended(0);
        assert_eq!(wait.await, EndOutcome::Completed);
        assert_eq!(handle.state(), PlaybackState::Ended);

        // Already ended resolves immediately
        assert_eq!(handle.await_end().unwrap().await, EndOutcome::Completed);

        // Ended re-arms on play
        handle.play().unwrap();
        assert_eq!(handle.state(), PlaybackState::Playing);
    }

    #[tokio::test]
    async fn test_stale_notification_does_not_end_new_playback() {
        let backend = MockBackend::manual();
        let mut handle = PlaybackHandle::create(&backend, click()).unwrap();
        backend.raise_ended(0);
        handle.play().unwrap();
        assert_eq!(handle.state(), PlaybackState::Playing);
    }

    #[tokio::test]
    async fn test_wait_before_play_ignores_earlier_notifications() {
        let backend = MockBackend::manual();
        let mut handle = PlaybackHandle::create(&backend, click()).unwrap();
        let mut wait = handle.await_end().unwrap();

        // Raised while idle, before the playback the wait is for
        backend.raise_ended(0);
        let early = tokio::time::timeout(Duration::from_millis(20), &mut wait).await;
        assert!(early.is_err());

        handle.play().unwrap();
        assert_eq!(handle.state(), PlaybackState::Playing);
        let pending = tokio::time::timeout(Duration::from_millis(20), &mut wait).await;
        assert!(pending.is_err());

        backend.raise_ended(0);
        assert_eq!(wait.await, EndOutcome::Completed);
        assert_eq!(handle.state(), PlaybackState::Ended);
    }

    #[tokio::test]
    async fn test_wait_on_stopped_handle_tracks_next_play() {
        let backend = MockBackend::manual();
        let mut handle = PlaybackHandle::create(&backend, click()).unwrap();
        handle.play().unwrap();
        handle.stop().unwrap();

        let wait = handle.await_end().unwrap();
        handle.play().unwrap();
        backend.raise_ended(0);
        assert_eq!(wait.await, EndOutcome::Completed);
    }

    #[tokio::test]
    async fn test_unsupported_keys_still_play() {
        let backend = MockBackend::without_custom_keys();
        let mut handle = PlaybackHandle::create(&backend, click()).unwrap();
        assert!(!handle.is_silent());

        handle.play().unwrap();
        assert_eq!(handle.state(), PlaybackState::Playing);
        assert_eq!(backend.count(Action::Play), 1);
        assert_eq!(backend.count(Action::Keys), 0);

        let wait = handle.await_end().unwrap();
        backend.raise_ended(0);
        assert_eq!(wait.await, EndOutcome::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_looped_wait_only_resolves_on_destroy() {
        let backend = MockBackend::auto_complete();
        let mut handle = PlaybackHandle::create(&backend, looping()).unwrap();
        handle.play().unwrap();
        let mut wait = handle.await_end().unwrap();

        let timed_out = tokio::time::timeout(Duration::from_secs(10), &mut wait).await;
        assert!(timed_out.is_err());

        handle.stop().unwrap();
        let timed_out = tokio::time::timeout(Duration::from_secs(10), &mut wait).await;
        assert!(timed_out.is_err());

        handle.destroy().unwrap();
        assert_eq!(wait.await, EndOutcome::Released);
    }

    #[tokio::test]
    async fn test_drop_releases_primitive() {
        let backend = MockBackend::manual();
        let mut handle = PlaybackHandle::create(&backend, click()).unwrap();
        handle.play().unwrap();
        let wait = handle.await_end().unwrap();
        drop(handle);

        assert_eq!(backend.live(), 0);
        assert_eq!(backend.count(Action::Stop), 1);
        assert_eq!(wait.await, EndOutcome::Released);
    }

    #[tokio::test]
    async fn test_unsupported_device_is_silent() {
        let backend = MockBackend::unsupported();
        let mut handle = PlaybackHandle::create(&backend, click()).unwrap();
        assert!(handle.is_silent());

        handle.play().unwrap();
        assert_eq!(handle.state(), PlaybackState::Ended);
        assert_eq!(handle.await_end().unwrap().await, EndOutcome::Completed);
        handle.destroy().unwrap();
    }
}
