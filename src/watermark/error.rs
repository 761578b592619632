//! Watermark error types.
//!
//! Defines errors that can occur while compositing a watermark. Every error is
//! raised before any output buffer is produced, so a failed call never yields
//! a partially watermarked image.

use thiserror::Error;

/// Errors that can occur during watermark processing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WatermarkError {
    /// The placement mode name is not one of the supported modes
    #[error("invalid configuration: unsupported watermark mode '{0}'")]
    UnsupportedMode(String),

    /// A tile or diagonal step resolved to zero or a negative pixel count
    #[error("degenerate step in {mode} mode: step resolved to {step}px, must be positive")]
    DegenerateStep { mode: &'static str, step: i64 },

    /// No usable font could be loaded
    #[error("font unavailable: {0}")]
    FontUnavailable(String),

    /// Style or mode parameters are out of range
    #[error("invalid watermark style: {0}")]
    InvalidStyle(String),
}
