//! Directory batch driver.
//!
//! Scans one directory for images, watermarks each of them in parallel and
//! writes `<stem>_wm.<ext>` files to the output directory. Settings that do
//! not depend on the image (mode name, style, font) are resolved once up
//! front, so a bad mode or missing font fails the whole batch before any
//! file is touched. Failures on individual images are logged and reported
//! without aborting the rest of the batch.

pub mod orientation;

use crate::config::WatermarkConfig;
use crate::error::{Error, Result};
use crate::watermark::{
    composite, font_size_for, FaceProvider, FontSource, PlacementMode, StyleDescriptor,
    WatermarkMode,
};
use image::{DynamicImage, ImageOutputFormat, RgbaImage};
use rayon::prelude::*;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Suffix appended to the file stem of every output image
pub const OUTPUT_SUFFIX: &str = "_wm";

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Output files written, in input order
    pub written: Vec<PathBuf>,
    /// Inputs that could not be processed, with the reason
    pub failed: Vec<FailedImage>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.written.len() + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// An input image that failed to process.
#[derive(Debug)]
pub struct FailedImage {
    pub path: PathBuf,
    pub error: String,
}

/// Per-batch settings resolved from a [`WatermarkConfig`].
#[derive(Debug, Clone)]
pub struct BatchSettings {
    pub mode: WatermarkMode,
    pub style: StyleDescriptor,
    config: WatermarkConfig,
}

impl BatchSettings {
    /// Resolve the settings shared by every image.
    ///
    /// An unknown mode name surfaces here as
    /// [`WatermarkError::UnsupportedMode`](crate::watermark::WatermarkError::UnsupportedMode).
    pub fn from_config(config: &WatermarkConfig) -> Result<Self> {
        let mode: WatermarkMode = config.mode.parse()?;
        let style = config.style().map_err(Error::Config)?;

        Ok(Self {
            mode,
            style,
            config: config.clone(),
        })
    }

    /// Watermark one decoded image.
    ///
    /// Font size and margin are derived from this image's dimensions.
    pub fn apply(&self, image: &DynamicImage, fonts: &dyn FaceProvider) -> Result<RgbaImage> {
        let (width, height) = (image.width(), image.height());
        let config = &self.config;
        let size_px = font_size_for(width, height, config.font_size, config.font_ratio, config.fit);
        let params = config.mode_params(width.max(height));
        let mode = PlacementMode::new(self.mode, &params)?;
        let face = fonts.face(size_px);

        tracing::debug!(
            width = width,
            height = height,
            font_size = size_px,
            margin = params.margin,
            mode = %self.mode,
            "Compositing watermark"
        );

        Ok(composite(image, &config.text, face.as_ref(), &mode, &self.style)?)
    }
}

/// Watermark every image of `config.input_dir` using the configured font.
pub fn process_directory(config: &WatermarkConfig) -> Result<BatchReport> {
    // Mode and style errors should win over font errors
    let settings = BatchSettings::from_config(config)?;
    let fonts = FontSource::load(config.font_path.as_deref())?;
    tracing::info!(font = %fonts.path().display(), "Using font");
    run_batch(config, &settings, &fonts)
}

/// Watermark every image of `config.input_dir` with faces from `fonts`.
pub fn process_directory_with(
    config: &WatermarkConfig,
    fonts: &dyn FaceProvider,
) -> Result<BatchReport> {
    let settings = BatchSettings::from_config(config)?;
    run_batch(config, &settings, fonts)
}

fn run_batch(
    config: &WatermarkConfig,
    settings: &BatchSettings,
    fonts: &dyn FaceProvider,
) -> Result<BatchReport> {
    let inputs = list_images(config)?;
    if inputs.is_empty() {
        tracing::warn!(
            input_dir = %config.input_dir.display(),
            "No images found"
        );
        return Ok(BatchReport::default());
    }

    std::fs::create_dir_all(&config.output_dir)?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.jobs)
        .build()?;

    tracing::info!(
        images = inputs.len(),
        threads = pool.current_num_threads(),
        mode = %settings.mode,
        output_dir = %config.output_dir.display(),
        "Starting batch"
    );

    let start = Instant::now();
    let results: Vec<(PathBuf, Result<PathBuf>)> = pool.install(|| {
        inputs
            .par_iter()
            .map(|path| {
                let result = watermark_file(path, &config.output_dir, settings, fonts);
                (path.clone(), result)
            })
            .collect()
    });

    let mut report = BatchReport::default();
    for (path, result) in results {
        match result {
            Ok(output) => {
                tracing::info!(
                    input = %path.display(),
                    output = %output.display(),
                    "Watermarked image"
                );
                report.written.push(output);
            }
            Err(e) => {
                tracing::warn!(
                    input = %path.display(),
                    error = %e,
                    "Failed to watermark image"
                );
                report.failed.push(FailedImage {
                    path,
                    error: e.to_string(),
                });
            }
        }
    }

    tracing::info!(
        written = report.written.len(),
        failed = report.failed.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Batch finished"
    );

    Ok(report)
}

/// List the images directly inside `config.input_dir`, sorted by path.
pub fn list_images(config: &WatermarkConfig) -> Result<Vec<PathBuf>> {
    if !config.input_dir.is_dir() {
        return Err(Error::NotADirectory(config.input_dir.clone()));
    }

    let mut images = Vec::new();
    for entry in std::fs::read_dir(&config.input_dir)? {
        let path = entry?.path();
        if path.is_file() && config.accepts(&path) {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

/// Decode, orient, watermark and save one image; returns the output path.
pub fn watermark_file(
    input: &Path,
    output_dir: &Path,
    settings: &BatchSettings,
    fonts: &dyn FaceProvider,
) -> Result<PathBuf> {
    let image = image::open(input)?;
    let image = orientation::upright(input, image);
    let watermarked = settings.apply(&image, fonts)?;

    let (output, format) = output_target(output_dir, input, settings.config.jpeg_quality);
    save_rgb(watermarked, &output, format)?;
    Ok(output)
}

/// Output path and encoding for `input`.
///
/// The extension is kept except for formats without an encoder in this
/// build (WebP), which are written as PNG.
pub fn output_target(
    output_dir: &Path,
    input: &Path,
    jpeg_quality: u8,
) -> (PathBuf, ImageOutputFormat) {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = input
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();

    let (ext, format) = match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => (ext, ImageOutputFormat::Jpeg(jpeg_quality)),
        "bmp" => (ext, ImageOutputFormat::Bmp),
        "gif" => (ext, ImageOutputFormat::Gif),
        "png" => (ext, ImageOutputFormat::Png),
        _ => ("png".to_string(), ImageOutputFormat::Png),
    };

    let path = output_dir.join(format!("{}{}.{}", stem, OUTPUT_SUFFIX, ext));
    (path, format)
}

/// Drop alpha and encode `image` to `path`.
fn save_rgb(image: RgbaImage, path: &Path, format: ImageOutputFormat) -> Result<()> {
    let rgb = DynamicImage::ImageRgba8(image).to_rgb8();
    let mut writer = BufWriter::new(File::create(path)?);
    DynamicImage::ImageRgb8(rgb).write_to(&mut writer, format)?;
    Ok(())
}
