// SPDX-License-Identifier: MIT OR Apache-2.0
//! Haptikit Preview - play haptic scripts without a device
//!
//! Runs a RON preview script against a backend that renders every effect into the
//! log:
//! - Waveform pattern samples
//! - Looping effects held and released
//! - Directional effects mapped from world positions
//! - Timed, cancellable sequences
//!
//! ## Usage
//!
//! `haptikit_preview [script.ron]`. Without a path the built-in demo script runs.
//! Set `RUST_LOG=haptikit_preview=trace` to see every intensity tick.

mod backend;
mod error;
mod player;
mod script;

use error::Result;
use script::PreviewScript;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn main() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("haptikit_preview=info,haptikit_runtime=info,haptikit_core=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Haptikit Preview v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(std::env::args_os().nth(1).map(PathBuf::from)) {
        tracing::error!("Preview failed: {e}");
        std::process::exit(1);
    }
}

fn run(path: Option<PathBuf>) -> Result<()> {
    let script = match path {
        Some(path) => PreviewScript::load(&path)?,
        None => PreviewScript::builtin()?,
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let summary = runtime.block_on(player::run_script(script, runtime.handle().clone()))?;

    for record in &summary.history {
        tracing::info!(
            "#{:<3} {:<18} at {:>6}ms  {:>6.0}ms  peak {:.2}  pos {:?}{}",
            record.primitive,
            record.kind.name(),
            record.started_ms,
            record.duration_ms,
            record.peak,
            record.position,
            if record.looped { "  (looped)" } else { "" }
        );
    }
    tracing::info!(
        dispatched = summary.sequence.dispatched.len(),
        skipped = summary.sequence.failed.len(),
        "Sequence summary"
    );
    if summary.leaked > 0 {
        tracing::warn!(leaked = summary.leaked, "Primitives were not released");
    }
    Ok(())
}
