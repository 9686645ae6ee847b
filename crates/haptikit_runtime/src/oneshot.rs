// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fire-and-forget playback that cleans up after itself.

use crate::backend::HapticBackend;
use crate::controller::{EndOutcome, HandleId, PlaybackHandle};
use haptikit_core::{EffectDescriptor, HapticError, Result};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// A dispatched one-shot effect.
///
/// The handle itself lives in a background task that destroys it on the
/// primitive's completion notification.
#[derive(Debug)]
pub struct OneShot {
    id: HandleId,
    task: JoinHandle<EndOutcome>,
}

impl OneShot {
    /// Identifier of the underlying handle
    pub fn id(&self) -> HandleId {
        self.id
    }

    /// Whether the handle has been released
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait until the handle has been released
    pub async fn finished(self) -> EndOutcome {
        self.task.await.unwrap_or(EndOutcome::Released)
    }
}

/// Create and play a handle, destroying it once the primitive reports completion.
///
/// Looped descriptors never complete and are rejected with `InvalidArgument`.
pub fn play_one_shot<B: HapticBackend>(
    runtime: &Handle,
    backend: &B,
    descriptor: EffectDescriptor,
) -> Result<OneShot> {
    if descriptor.looped() {
        return Err(HapticError::invalid(
            "looped effects never end and cannot be played as one-shots",
        ));
    }

    let mut handle = PlaybackHandle::create(backend, descriptor)?;
    handle.play()?;
    let wait = handle.await_end()?;
    let id = handle.id();

    let task = runtime.spawn(async move {
        let outcome = wait.await;
        if let Err(err) = handle.destroy() {
            tracing::warn!(handle = %id, %err, "One-shot cleanup failed");
        }
        tracing::debug!(handle = %id, ?outcome, "One-shot finished");
        outcome
    });
    Ok(OneShot { id, task })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBackend;
    use haptikit_core::{EffectConfig, EffectFactory, EffectKind};

    #[tokio::test(start_paused = true)]
    async fn test_no_live_handles_after_completion() {
        let backend = MockBackend::auto_complete();
        let factory = EffectFactory::new();
        let runtime = Handle::current();

        for &kind in EffectKind::presets() {
            let descriptor = factory.create_preset(kind, None).unwrap();
            let shot = play_one_shot(&runtime, &backend, descriptor).unwrap();
            assert_eq!(backend.live(), 1);
            assert_eq!(shot.finished().await, EndOutcome::Completed);
            assert_eq!(backend.live(), 0);
        }
    }

    #[tokio::test]
    async fn test_completion_notification_releases_handle() {
        let backend = MockBackend::manual();
        let descriptor = EffectFactory::new().create_preset(EffectKind::UIHover, None).unwrap();
        let shot = play_one_shot(&Handle::current(), &backend, descriptor).unwrap();

        tokio::task::yield_now().await;
        assert!(!shot.is_finished());
        assert_eq!(backend.live(), 1);

        backend.raise_ended(0);
        assert_eq!(shot.finished().await, EndOutcome::Completed);
        assert_eq!(backend.live(), 0);
    }

    #[tokio::test]
    async fn test_rejects_looped() {
        let backend = MockBackend::manual();
        let descriptor = EffectFactory::new()
            .create_looping(&EffectConfig::of(EffectKind::UIClick))
            .unwrap();
        let err = play_one_shot(&Handle::current(), &backend, descriptor).unwrap_err();
        assert!(matches!(err, HapticError::InvalidArgument(_)));
        assert_eq!(backend.live(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_device_still_finishes() {
        let backend = MockBackend::unsupported();
        let descriptor = EffectFactory::new()
            .create_preset(EffectKind::GameplayCollision, None)
            .unwrap();
        let shot = play_one_shot(&Handle::current(), &backend, descriptor).unwrap();
        assert_eq!(shot.finished().await, EndOutcome::Completed);
    }
}
