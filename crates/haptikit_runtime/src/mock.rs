// SPDX-License-Identifier: MIT OR Apache-2.0
//! Recording backend used by the runtime tests.

use crate::backend::{HapticBackend, HapticPrimitive, PrimitiveSpec};
use crate::notify::{EndedListener, EndedSignal};
use haptikit_core::{EffectKind, HapticError, Result, WaveformKey};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    Construct,
    Keys,
    Play,
    Stop,
    Release,
}

#[derive(Debug, Clone)]
pub(crate) struct Event {
    pub primitive: usize,
    pub kind: EffectKind,
    pub action: Action,
    pub at: Instant,
}

#[derive(Debug, Default)]
struct Shared {
    next_id: AtomicUsize,
    live: AtomicUsize,
    events: Mutex<Vec<Event>>,
    signals: Mutex<Vec<EndedSignal>>,
}

impl Shared {
    fn record(&self, primitive: usize, kind: EffectKind, action: Action) {
        self.events.lock().push(Event {
            primitive,
            kind,
            action,
            at: Instant::now(),
        });
    }
}

/// Backend whose primitives log every call and can finish on their own
#[derive(Debug, Clone, Default)]
pub(crate) struct MockBackend {
    shared: Arc<Shared>,
    auto_complete: bool,
    unsupported: bool,
    reject_keys: bool,
}

impl MockBackend {
    /// Primitives only end when the test raises them
    pub fn manual() -> Self {
        Self::default()
    }

    /// Primitives end after one pass through their waveform
    pub fn auto_complete() -> Self {
        Self {
            auto_complete: true,
            ..Self::default()
        }
    }

    /// Every construction fails with `UnsupportedDevice`
    pub fn unsupported() -> Self {
        Self {
            unsupported: true,
            ..Self::default()
        }
    }

    /// Primitives play but refuse custom waveform keys
    pub fn without_custom_keys() -> Self {
        Self {
            reject_keys: true,
            ..Self::default()
        }
    }

    pub fn live(&self) -> usize {
        self.shared.live.load(Ordering::SeqCst)
    }

    pub fn events(&self) -> Vec<Event> {
        self.shared.events.lock().clone()
    }

    pub fn plays(&self) -> Vec<Event> {
        self.events().into_iter().filter(|e| e.action == Action::Play).collect()
    }

    pub fn count(&self, action: Action) -> usize {
        self.events().iter().filter(|e| e.action == action).count()
    }

    /// Raise `Ended` on the primitive with this id
    pub fn raise_ended(&self, primitive: usize) {
        if let Some(signal) = self.shared.signals.lock().get(primitive) {
            signal.raise();
        }
    }
}

impl HapticBackend for MockBackend {
    type Primitive = MockPrimitive;

    fn construct(&self, spec: &PrimitiveSpec) -> Result<MockPrimitive> {
        if self.unsupported {
            return Err(HapticError::UnsupportedDevice("mock device has no actuator".into()));
        }
        let id = self.shared.next_id.fetch_add(1, Ordering::SeqCst);
        let signal = EndedSignal::new();
        self.shared.signals.lock().push(signal.clone());
        self.shared.live.fetch_add(1, Ordering::SeqCst);
        self.shared.record(id, spec.kind, Action::Construct);
        Ok(MockPrimitive {
            id,
            spec: spec.clone(),
            keys: Vec::new(),
            signal,
            shared: Arc::clone(&self.shared),
            auto_complete: self.auto_complete,
            reject_keys: self.reject_keys,
            runner: None,
        })
    }
}

pub(crate) struct MockPrimitive {
    id: usize,
    spec: PrimitiveSpec,
    keys: Vec<WaveformKey>,
    signal: EndedSignal,
    shared: Arc<Shared>,
    auto_complete: bool,
    reject_keys: bool,
    runner: Option<JoinHandle<()>>,
}

impl HapticPrimitive for MockPrimitive {
    fn set_waveform_keys(&mut self, keys: &[WaveformKey]) -> Result<()> {
        if self.reject_keys {
            return Err(HapticError::UnsupportedDevice("mock device has fixed waveforms".into()));
        }
        self.keys = keys.to_vec();
        self.shared.record(self.id, self.spec.kind, Action::Keys);
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        self.shared.record(self.id, self.spec.kind, Action::Play);
        if self.auto_complete && !self.spec.looped {
            let duration = self.keys.last().map(|k| k.time).unwrap_or(0.0);
            let signal = self.signal.clone();
            self.runner = Some(tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs_f32(duration / 1000.0)).await;
                signal.raise();
            }));
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(runner) = self.runner.take() {
            runner.abort();
        }
        self.shared.record(self.id, self.spec.kind, Action::Stop);
        Ok(())
    }

    fn ended(&self) -> EndedListener {
        self.signal.listen()
    }
}

impl Drop for MockPrimitive {
    fn drop(&mut self) {
        if let Some(runner) = self.runner.take() {
            runner.abort();
        }
        self.shared.live.fetch_sub(1, Ordering::SeqCst);
        self.shared.record(self.id, self.spec.kind, Action::Release);
    }
}
