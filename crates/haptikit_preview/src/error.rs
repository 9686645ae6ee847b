// SPDX-License-Identifier: MIT OR Apache-2.0
//! Errors surfaced by the preview tool.

use haptikit_core::HapticError;
use std::path::PathBuf;
use thiserror::Error;

/// Preview errors
#[derive(Debug, Error)]
pub enum PreviewError {
    /// Script file could not be read
    #[error("Failed to read {path:?}: {source}")]
    Read {
        /// Script path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Script text is not valid RON for a preview script
    #[error("Invalid preview script: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Runtime could not be started
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An effect was rejected
    #[error(transparent)]
    Haptic(#[from] HapticError),
}

/// Result type for preview operations
pub type Result<T> = std::result::Result<T, PreviewError>;
