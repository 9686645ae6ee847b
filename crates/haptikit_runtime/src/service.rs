// SPDX-License-Identifier: MIT OR Apache-2.0
//! Entry point bundling the factory, the host backend and the async runtime.

use crate::backend::HapticBackend;
use crate::controller::{EndWait, PlaybackHandle};
use crate::oneshot::{play_one_shot, OneShot};
use crate::sequencer::{play_sequence, SequenceRun, SequenceStep};
use haptikit_core::{
    build_pattern, EffectConfig, EffectDescriptor, EffectFactory, EffectKind, Result, Vec3, WaveformKey,
    WaveformPattern,
};
use std::sync::Arc;
use tokio::runtime::Handle;

/// Handle type produced by a service over backend `B`
pub type ServiceHandle<B> = PlaybackHandle<<B as HapticBackend>::Primitive>;

/// Haptic effect service.
///
/// Create one per application and share it by reference or clone; clones share
/// the same backend and factory.
pub struct HapticService<B: HapticBackend> {
    backend: Arc<B>,
    factory: Arc<EffectFactory>,
    runtime: Handle,
}

impl<B: HapticBackend> Clone for HapticService<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            factory: Arc::clone(&self.factory),
            runtime: self.runtime.clone(),
        }
    }
}

impl<B: HapticBackend> HapticService<B> {
    /// Create a service spawning its background work on `runtime`
    pub fn new(backend: B, factory: EffectFactory, runtime: Handle) -> Self {
        Self {
            backend: Arc::new(backend),
            factory: Arc::new(factory),
            runtime,
        }
    }

    /// The host backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The descriptor factory
    pub fn factory(&self) -> &EffectFactory {
        &self.factory
    }

    /// Wrap an already built descriptor in an idle handle
    pub fn create_handle(&self, descriptor: EffectDescriptor) -> Result<ServiceHandle<B>> {
        PlaybackHandle::create(self.backend.as_ref(), descriptor)
    }

    /// Validate a config and create an idle handle for it
    pub fn create_effect(&self, config: &EffectConfig) -> Result<ServiceHandle<B>> {
        self.create_handle(self.factory.create(config)?)
    }

    /// Create and play an effect that releases itself when it ends
    pub fn play_one_shot(&self, config: &EffectConfig) -> Result<OneShot> {
        let descriptor = self.factory.create(config)?;
        play_one_shot(&self.runtime, self.backend.as_ref(), descriptor)
    }

    /// Create an idle handle for a custom waveform
    pub fn create_custom_effect(
        &self,
        keys: impl IntoIterator<Item = WaveformKey>,
        config: Option<EffectConfig>,
    ) -> Result<ServiceHandle<B>> {
        self.create_handle(self.factory.create_custom(keys, config)?)
    }

    fn create_preset(&self, kind: EffectKind, config: Option<EffectConfig>) -> Result<ServiceHandle<B>> {
        self.create_handle(self.factory.create_preset(kind, config)?)
    }

    /// Subtle hover tick
    pub fn ui_hover(&self, config: Option<EffectConfig>) -> Result<ServiceHandle<B>> {
        self.create_preset(EffectKind::UIHover, config)
    }

    /// Crisp click
    pub fn ui_click(&self, config: Option<EffectConfig>) -> Result<ServiceHandle<B>> {
        self.create_preset(EffectKind::UIClick, config)
    }

    /// Attention double pulse
    pub fn ui_notification(&self, config: Option<EffectConfig>) -> Result<ServiceHandle<B>> {
        self.create_preset(EffectKind::UINotification, config)
    }

    /// Large decaying rumble
    pub fn gameplay_explosion(&self, config: Option<EffectConfig>) -> Result<ServiceHandle<B>> {
        self.create_preset(EffectKind::GameplayExplosion, config)
    }

    /// Sharp immediate rumble
    pub fn gameplay_collision(&self, config: Option<EffectConfig>) -> Result<ServiceHandle<B>> {
        self.create_preset(EffectKind::GameplayCollision, config)
    }

    /// Create an idle handle that loops until stopped
    pub fn create_looping_effect(&self, config: &EffectConfig) -> Result<ServiceHandle<B>> {
        self.create_handle(self.factory.create_looping(config)?)
    }

    /// Stop a handle and release its primitive
    pub fn stop_and_destroy(&self, handle: &mut ServiceHandle<B>) -> Result<()> {
        handle.stop()?;
        handle.destroy()
    }

    /// Wait for a handle's completion notification.
    ///
    /// Never completes for looped effects until the handle is destroyed.
    pub fn await_end(&self, handle: &ServiceHandle<B>) -> Result<EndWait> {
        handle.await_end()
    }

    /// Dispatch steps on their delays; see [`crate::sequencer`] for the cancellation contract
    pub fn play_sequence(&self, steps: Vec<SequenceStep>) -> SequenceRun {
        play_sequence(
            &self.runtime,
            Arc::clone(&self.backend),
            Arc::clone(&self.factory),
            steps,
        )
    }

    /// Keys for a named waveform pattern
    pub fn create_waveform_pattern(
        &self,
        pattern: WaveformPattern,
        duration_ms: f32,
        intensity: f32,
    ) -> Result<Vec<WaveformKey>> {
        build_pattern(pattern, duration_ms, intensity)
    }

    /// Create an idle handle positioned from world coordinates
    pub fn create_directional_effect(
        &self,
        target: Vec3,
        reference: Vec3,
        max_distance: f32,
        config: &EffectConfig,
    ) -> Result<ServiceHandle<B>> {
        self.create_handle(
            self.factory
                .create_directional(target, reference, max_distance, config)?,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{EndOutcome, PlaybackState};
    use crate::mock::{Action, MockBackend};
    use haptikit_core::HapticError;

    fn service(backend: MockBackend) -> HapticService<MockBackend> {
        HapticService::new(backend, EffectFactory::new(), Handle::current())
    }

    #[tokio::test]
    async fn test_preset_constructors() {
        let service = service(MockBackend::manual());
        let handles = [
            service.ui_hover(None).unwrap(),
            service.ui_click(None).unwrap(),
            service.ui_notification(None).unwrap(),
            service.gameplay_explosion(None).unwrap(),
            service.gameplay_collision(Some(EffectConfig::new("UIClick").with_radius(0.9))).unwrap(),
        ];
        let kinds: Vec<EffectKind> = handles.iter().map(|h| h.descriptor().kind()).collect();
        assert_eq!(kinds, EffectKind::presets());
        assert_eq!(handles[4].descriptor().radius(), 0.9);
        assert!(handles.iter().all(|h| h.state() == PlaybackState::Idle));
        assert_eq!(service.backend().live(), 5);
        drop(handles);
        assert_eq!(service.backend().live(), 0);
    }

    #[tokio::test]
    async fn test_create_effect_validation_is_synchronous() {
        let service = service(MockBackend::manual());
        assert!(matches!(
            service.create_effect(&EffectConfig::new("Custom")),
            Err(HapticError::InvalidArgument(_))
        ));
        assert!(matches!(
            service.create_custom_effect([WaveformKey::new(0.0, 0.5)], None),
            Err(HapticError::InvalidArgument(_))
        ));
        // Nothing reached the host
        assert_eq!(service.backend().count(Action::Construct), 0);
    }

    #[tokio::test]
    async fn test_looping_effect_stop_and_destroy() {
        let service = service(MockBackend::manual());
        let mut handle = service
            .create_looping_effect(&EffectConfig::of(EffectKind::GameplayCollision))
            .unwrap();
        assert!(handle.descriptor().looped());
        handle.play().unwrap();
        let wait = service.await_end(&handle).unwrap();

        service.stop_and_destroy(&mut handle).unwrap();
        assert_eq!(wait.await, EndOutcome::Released);
        assert_eq!(service.backend().live(), 0);
        assert_eq!(service.stop_and_destroy(&mut handle), Err(HapticError::HandleDestroyed));
    }

    #[tokio::test]
    async fn test_waveform_pattern_and_custom_effect() {
        let service = service(MockBackend::manual());
        let keys = service
            .create_waveform_pattern(WaveformPattern::Pulse, 120.0, 0.7)
            .unwrap();
        assert_eq!(keys.len(), 3);

        let mut handle = service.create_custom_effect(keys, None).unwrap();
        assert_eq!(handle.descriptor().duration_ms(), 120.0);
        handle.play().unwrap();
        assert_eq!(service.backend().count(Action::Keys), 1);
    }

    #[tokio::test]
    async fn test_directional_effect() {
        let service = service(MockBackend::manual());
        let handle = service
            .create_directional_effect(
                [0.0, 0.0, 2.0],
                [0.0, 0.0, 0.0],
                8.0,
                &EffectConfig::of(EffectKind::GameplayExplosion),
            )
            .unwrap();
        let descriptor = handle.descriptor();
        assert!((descriptor.radius() - 0.75).abs() < 1e-6);
        assert!((descriptor.position()[1] - 1.0).abs() < 1e-6);
        assert!((descriptor.waveform().peak() - 0.75).abs() < 1e-6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_shot_and_sequence_through_service() {
        let service = service(MockBackend::auto_complete());
        let shot = service.play_one_shot(&EffectConfig::of(EffectKind::UIClick)).unwrap();
        assert_eq!(shot.finished().await, EndOutcome::Completed);

        let run = service.clone().play_sequence(vec![
            SequenceStep::new(0, EffectConfig::of(EffectKind::UIHover)),
            SequenceStep::new(20, EffectConfig::of(EffectKind::UIClick)),
        ]);
        let report = run.finished().await;
        assert_eq!(report.dispatched, vec![0, 1]);
        assert_eq!(service.backend().live(), 0);
    }
}
