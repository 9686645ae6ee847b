// SPDX-License-Identifier: MIT OR Apache-2.0
//! Plays a preview script through the haptic service.

use crate::backend::{LogBackend, PlaybackRecord};
use crate::error::Result;
use crate::script::PreviewScript;
use haptikit_core::{EffectFactory, PresetLibrary, Waveform};
use haptikit_runtime::{EndOutcome, HapticService, SequenceReport};
use std::time::Duration;
use tokio::runtime::Handle;

/// Outcome of a preview run
#[derive(Debug, Clone)]
pub struct PreviewSummary {
    /// Every playback the backend saw
    pub history: Vec<PlaybackRecord>,
    /// Report of the timed sequence
    pub sequence: SequenceReport,
    /// Primitives still alive at the end
    pub leaked: usize,
}

/// Run every section of a script, in the order they appear in the file
pub async fn run_script(script: PreviewScript, runtime: Handle) -> Result<PreviewSummary> {
    let mut presets = PresetLibrary::builtin();
    if let Some(overrides) = script.presets.clone() {
        presets.merge(overrides)?;
    }
    let service = HapticService::new(
        LogBackend::new(script.tick_ms),
        EffectFactory::with_presets(presets),
        runtime,
    );

    for preview in &script.patterns {
        let keys = service.create_waveform_pattern(preview.pattern, preview.duration_ms, preview.intensity)?;
        let waveform = Waveform::new(keys)?;
        let step = (preview.duration_ms / 10.0).max(1.0);
        let samples: Vec<String> = waveform
            .sample(step)?
            .into_iter()
            .map(|(t, i)| format!("{t:.0}:{i:.2}"))
            .collect();
        tracing::info!(pattern = %preview.pattern, "Samples {}", samples.join(" "));
    }

    for preview in &script.looping {
        let mut handle = service.create_looping_effect(&preview.effect)?;
        handle.play()?;
        tokio::time::sleep(Duration::from_millis(preview.hold_ms)).await;
        service.stop_and_destroy(&mut handle)?;
    }

    for preview in &script.directional {
        let mut handle = service.create_directional_effect(
            preview.target,
            preview.reference,
            preview.max_distance,
            &preview.effect,
        )?;
        tracing::info!(
            radius = handle.descriptor().radius(),
            position = ?handle.descriptor().position(),
            "Directional effect"
        );
        handle.play()?;
        let outcome = service.await_end(&handle)?.await;
        if outcome != EndOutcome::Completed {
            tracing::warn!(?outcome, "Directional effect did not complete");
        }
        handle.destroy()?;
    }

    let sequence = service.play_sequence(script.sequence()).finished().await;
    for (index, err) in &sequence.failed {
        tracing::warn!(step = index, "Step skipped: {err}");
    }

    let history = service.backend().history();
    let leaked = service.backend().live();
    tracing::info!(playbacks = history.len(), leaked, "Preview complete");
    Ok(PreviewSummary {
        history,
        sequence,
        leaked,
    })
}
