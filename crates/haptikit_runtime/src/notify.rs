// SPDX-License-Identifier: MIT OR Apache-2.0
//! Completion notification raised by haptic primitives.

use std::sync::Arc;
use tokio::sync::watch;

/// Sending side of a primitive's `Ended` notification.
///
/// Backends raise it each time a non-looped playback finishes.
#[derive(Debug, Clone)]
pub struct EndedSignal {
    tx: Arc<watch::Sender<u64>>,
}

impl EndedSignal {
    /// Create a signal nobody has raised yet
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    /// Notify every listener that playback finished
    pub fn raise(&self) {
        self.tx.send_modify(|count| *count = count.wrapping_add(1));
    }

    /// Subscribe to future notifications
    pub fn listen(&self) -> EndedListener {
        EndedListener {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for EndedSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of an [`EndedSignal`]
#[derive(Debug, Clone)]
pub struct EndedListener {
    rx: watch::Receiver<u64>,
}

impl EndedListener {
    /// Forget notifications raised so far
    pub fn mark_seen(&mut self) {
        let _ = self.rx.borrow_and_update();
    }

    /// Whether a notification arrived since the last [`EndedListener::mark_seen`]
    pub fn has_fired(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Number of notifications raised so far
    pub fn raised(&self) -> u64 {
        *self.rx.borrow()
    }

    /// Wait until more than `count` notifications have been raised in total.
    ///
    /// Returns `false` if every signal was dropped first.
    pub async fn raised_after(&mut self, count: u64) -> bool {
        self.rx.wait_for(|&raised| raised > count).await.is_ok()
    }

    /// Wait for the next notification.
    ///
    /// Returns `false` if every signal was dropped without raising.
    pub async fn fired(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}
