// SPDX-License-Identifier: MIT OR Apache-2.0
//! Host backend that renders playback into the log.
//!
//! Each primitive plays its waveform on a tokio timer, logging the interpolated
//! intensity every tick, and raises `Ended` after one pass unless looped.

use haptikit_core::{evaluate, EffectKind, Result, WaveformKey};
use haptikit_runtime::{EndedListener, EndedSignal, HapticBackend, HapticPrimitive, PrimitiveSpec};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// One playback seen by the backend
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackRecord {
    /// Primitive number, in construction order
    pub primitive: usize,
    /// Effect type
    pub kind: EffectKind,
    /// Milliseconds since the backend was created
    pub started_ms: u64,
    /// Length of one waveform pass
    pub duration_ms: f32,
    /// Highest intensity of the waveform
    pub peak: f32,
    /// Normalized device position
    pub position: [f32; 3],
    /// Whether playback loops
    pub looped: bool,
}

#[derive(Debug)]
struct Shared {
    epoch: Instant,
    tick: Duration,
    next_id: AtomicUsize,
    live: AtomicUsize,
    history: Mutex<Vec<PlaybackRecord>>,
}

/// Backend logging every playback
#[derive(Debug, Clone)]
pub struct LogBackend {
    shared: Arc<Shared>,
}

impl LogBackend {
    /// Create a backend logging intensities every `tick_ms`
    pub fn new(tick_ms: u64) -> Self {
        Self {
            shared: Arc::new(Shared {
                epoch: Instant::now(),
                tick: Duration::from_millis(tick_ms.max(1)),
                next_id: AtomicUsize::new(0),
                live: AtomicUsize::new(0),
                history: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Every playback so far, in start order
    pub fn history(&self) -> Vec<PlaybackRecord> {
        self.shared.history.lock().clone()
    }

    /// Primitives not yet released
    pub fn live(&self) -> usize {
        self.shared.live.load(Ordering::SeqCst)
    }
}

impl HapticBackend for LogBackend {
    type Primitive = LogPrimitive;

    fn construct(&self, spec: &PrimitiveSpec) -> Result<LogPrimitive> {
        let id = self.shared.next_id.fetch_add(1, Ordering::SeqCst);
        self.shared.live.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(primitive = id, kind = %spec.kind, looped = spec.looped, "Constructed primitive");
        Ok(LogPrimitive {
            id,
            spec: spec.clone(),
            keys: Arc::from(Vec::new()),
            signal: EndedSignal::new(),
            shared: Arc::clone(&self.shared),
            runner: None,
        })
    }
}

/// Primitive produced by [`LogBackend`]
#[derive(Debug)]
pub struct LogPrimitive {
    id: usize,
    spec: PrimitiveSpec,
    keys: Arc<[WaveformKey]>,
    signal: EndedSignal,
    shared: Arc<Shared>,
    runner: Option<JoinHandle<()>>,
}

impl LogPrimitive {
    fn halt(&mut self) {
        if let Some(runner) = self.runner.take() {
            runner.abort();
        }
    }
}

impl HapticPrimitive for LogPrimitive {
    fn set_waveform_keys(&mut self, keys: &[WaveformKey]) -> Result<()> {
        self.keys = Arc::from(keys);
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        self.halt();
        let duration_ms = self.keys.last().map(|k| k.time).unwrap_or(0.0);
        let peak = self.keys.iter().map(|k| k.intensity).fold(0.0, f32::max);
        let started_ms = self.shared.epoch.elapsed().as_millis() as u64;

        tracing::info!(
            primitive = self.id,
            kind = %self.spec.kind,
            at_ms = started_ms,
            duration_ms,
            peak,
            position = ?self.spec.position,
            "Play"
        );
        self.shared.history.lock().push(PlaybackRecord {
            primitive: self.id,
            kind: self.spec.kind,
            started_ms,
            duration_ms,
            peak,
            position: self.spec.position,
            looped: self.spec.looped,
        });

        self.runner = Some(tokio::spawn(render(
            self.id,
            Arc::clone(&self.keys),
            self.spec.looped,
            self.shared.tick,
            self.signal.clone(),
        )));
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.halt();
        tracing::info!(primitive = self.id, kind = %self.spec.kind, "Stop");
        Ok(())
    }

    fn ended(&self) -> EndedListener {
        self.signal.listen()
    }
}

impl Drop for LogPrimitive {
    fn drop(&mut self) {
        self.halt();
        self.shared.live.fetch_sub(1, Ordering::SeqCst);
        tracing::debug!(primitive = self.id, "Released primitive");
    }
}

/// Step through the curve, wrapping around when looped
async fn render(id: usize, keys: Arc<[WaveformKey]>, looped: bool, tick: Duration, signal: EndedSignal) {
    let duration = Duration::from_secs_f32(keys.last().map(|k| k.time).unwrap_or(0.0) / 1000.0);
    let start = Instant::now();
    let mut interval = tokio::time::interval(tick);

    loop {
        interval.tick().await;
        let mut elapsed = start.elapsed();
        if !looped && elapsed >= duration {
            break;
        }
        if looped && !duration.is_zero() {
            elapsed = Duration::from_secs_f64(elapsed.as_secs_f64() % duration.as_secs_f64());
        }
        let t_ms = elapsed.as_secs_f32() * 1000.0;
        tracing::trace!(primitive = id, t_ms, intensity = evaluate(&keys, t_ms), "Tick");
    }

    tracing::debug!(primitive = id, "Ended");
    signal.raise();
}

#[cfg(test)]
mod tests {
    use super::*;
    use haptikit_core::{EffectFactory, EffectKind};

    #[tokio::test(start_paused = true)]
    async fn test_primitive_raises_ended_after_one_pass() {
        let backend = LogBackend::new(10);
        let descriptor = EffectFactory::new().create_preset(EffectKind::UIClick, None).unwrap();
        let mut primitive = backend.construct(&PrimitiveSpec::from(&descriptor)).unwrap();
        let mut ended = primitive.ended();

        primitive.set_waveform_keys(descriptor.waveform().keys()).unwrap();
        let start = Instant::now();
        primitive.play().unwrap();
        assert!(ended.fired().await);
        assert!(start.elapsed() >= Duration::from_millis(40));

        let history = backend.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind, EffectKind::UIClick);
        assert_eq!(history[0].duration_ms, 40.0);

        drop(primitive);
        assert_eq!(backend.live(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_looped_primitive_runs_until_stopped() {
        let backend = LogBackend::new(10);
        let descriptor = EffectFactory::new()
            .create_looping(&haptikit_core::EffectConfig::of(EffectKind::UIHover))
            .unwrap();
        let mut primitive = backend.construct(&PrimitiveSpec::from(&descriptor)).unwrap();
        let mut ended = primitive.ended();
        primitive.set_waveform_keys(descriptor.waveform().keys()).unwrap();
        primitive.play().unwrap();

        let waited = tokio::time::timeout(Duration::from_millis(500), ended.fired()).await;
        assert!(waited.is_err());
        primitive.stop().unwrap();
        assert!(history_is_looped(&backend));
    }

    fn history_is_looped(backend: &LogBackend) -> bool {
        backend.history().iter().all(|record| record.looped)
    }
}
