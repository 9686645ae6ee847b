// SPDX-License-Identifier: MIT OR Apache-2.0
//! Delay-gated fan-out of one-shot effects.
//!
//! Each step waits its `delay_ms` after the previous step was *dispatched*, not
//! after it finished playing, so effects overlap freely. A run can be cancelled:
//! steps that have not been dispatched yet never start, while effects already
//! dispatched keep playing until they end on their own.
//!
//! A step that fails validation or construction is logged and skipped; the steps
//! after it still run on schedule.

use crate::backend::HapticBackend;
use crate::cancel::CancelToken;
use crate::oneshot::{play_one_shot, OneShot};
use haptikit_core::{EffectConfig, EffectDescriptor, EffectFactory, HapticError, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// What a step plays
#[derive(Debug, Clone)]
pub enum StepEffect {
    /// Already validated descriptor
    Descriptor(EffectDescriptor),
    /// Config validated when the step is dispatched
    Config(EffectConfig),
}

impl StepEffect {
    fn resolve(self, factory: &EffectFactory) -> Result<EffectDescriptor> {
        match self {
            Self::Descriptor(descriptor) => Ok(descriptor),
            Self::Config(config) => factory.create(&config),
        }
    }
}

impl From<EffectDescriptor> for StepEffect {
    fn from(descriptor: EffectDescriptor) -> Self {
        Self::Descriptor(descriptor)
    }
}

impl From<EffectConfig> for StepEffect {
    fn from(config: EffectConfig) -> Self {
        Self::Config(config)
    }
}

/// One entry of a sequence
#[derive(Debug, Clone)]
pub struct SequenceStep {
    /// Delay after the previous step's dispatch
    pub delay_ms: u64,
    /// Effect to dispatch
    pub effect: StepEffect,
}

impl SequenceStep {
    /// Create a step
    pub fn new(delay_ms: u64, effect: impl Into<StepEffect>) -> Self {
        Self {
            delay_ms,
            effect: effect.into(),
        }
    }
}

/// Summary of a finished run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SequenceReport {
    /// Indices of steps that were dispatched, in order
    pub dispatched: Vec<usize>,
    /// Steps skipped because they failed, with the reason
    pub failed: Vec<(usize, HapticError)>,
    /// Index of the first step prevented by cancellation
    pub cancelled_at: Option<usize>,
}

impl SequenceReport {
    /// Whether cancellation cut the run short
    pub fn was_cancelled(&self) -> bool {
        self.cancelled_at.is_some()
    }
}

/// Cancels the run it came from. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SequenceCanceller {
    token: CancelToken,
}

impl SequenceCanceller {
    /// Prevent every step not yet dispatched from starting
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

/// A sequence being played
#[derive(Debug)]
pub struct SequenceRun {
    token: CancelToken,
    task: JoinHandle<SequenceReport>,
}

impl SequenceRun {
    /// Prevent every step not yet dispatched from starting.
    ///
    /// Effects already dispatched are not stopped.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Detached cancel function for this run
    pub fn canceller(&self) -> SequenceCanceller {
        SequenceCanceller {
            token: self.token.clone(),
        }
    }

    /// Whether the run was cancelled
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait for the run and every effect it dispatched to be released
    pub async fn finished(self) -> SequenceReport {
        match self.task.await {
            Ok(report) => report,
            Err(err) => {
                tracing::error!(%err, "Sequence task failed");
                SequenceReport::default()
            }
        }
    }
}

/// Start playing `steps` in order.
pub fn play_sequence<B: HapticBackend>(
    runtime: &Handle,
    backend: Arc<B>,
    factory: Arc<EffectFactory>,
    steps: Vec<SequenceStep>,
) -> SequenceRun {
    let token = CancelToken::new();
    let task = runtime.spawn(run_steps(runtime.clone(), backend, factory, steps, token.clone()));
    SequenceRun { token, task }
}

async fn run_steps<B: HapticBackend>(
    runtime: Handle,
    backend: Arc<B>,
    factory: Arc<EffectFactory>,
    steps: Vec<SequenceStep>,
    token: CancelToken,
) -> SequenceReport {
    tracing::info!(steps = steps.len(), "Starting sequence");
    let mut report = SequenceReport::default();
    let mut spawned: Vec<OneShot> = Vec::with_capacity(steps.len());

    for (index, step) in steps.into_iter().enumerate() {
        let elapsed = step.delay_ms == 0 || token.sleep(Duration::from_millis(step.delay_ms)).await;
        if !elapsed || token.is_cancelled() {
            tracing::info!(step = index, "Sequence cancelled");
            report.cancelled_at = Some(index);
            break;
        }

        let dispatched = step
            .effect
            .resolve(&factory)
            .and_then(|descriptor| play_one_shot(&runtime, backend.as_ref(), descriptor));
        match dispatched {
            Ok(shot) => {
                tracing::debug!(step = index, handle = %shot.id(), "Dispatched sequence step");
                report.dispatched.push(index);
                spawned.push(shot);
            }
            Err(err) => {
                tracing::warn!(step = index, %err, "Skipping sequence step");
                report.failed.push((index, err));
            }
        }
    }

    futures::future::join_all(spawned.into_iter().map(OneShot::finished)).await;
    tracing::info!(
        dispatched = report.dispatched.len(),
        failed = report.failed.len(),
        cancelled = report.was_cancelled(),
        "Sequence finished"
    );
    report
}
