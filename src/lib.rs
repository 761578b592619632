// Shadowmark: batch text watermarking library

pub mod batch;
pub mod config;
pub mod error;
pub mod logging;
pub mod watermark;
