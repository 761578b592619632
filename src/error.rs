// Error types module

use crate::watermark::WatermarkError;
use std::path::PathBuf;
use thiserror::Error;

/// Centralized error type for the batch watermarker
///
/// Core compositing failures are wrapped unchanged so callers can still match
/// on `WatermarkError` variants.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (invalid YAML, missing env vars, out-of-range values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The input path exists but is not a directory, or does not exist
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Decoding or encoding an image failed
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Watermark(#[from] WatermarkError),

    #[error("Worker pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, Error>;
