use anyhow::{anyhow, Context};
use clap::Parser;
use shadowmark::batch::process_directory;
use shadowmark::config::WatermarkConfig;
use shadowmark::logging::{init_subscriber, LogFormat};
use shadowmark::watermark::FontFit;
use std::path::PathBuf;

/// Shadowmark - batch text watermarking with shadow, stroke and tiling
#[derive(Parser, Debug)]
#[command(name = "shadowmark")]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory containing the images to watermark
    dir: Option<PathBuf>,

    /// Path to a YAML configuration file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Watermark text
    #[arg(short, long)]
    text: Option<String>,

    /// Placement: bottom-right, center, tile or diagonal-tile
    #[arg(short, long)]
    mode: Option<String>,

    /// Fixed font size in pixels (overrides --font-ratio)
    #[arg(long)]
    font_size: Option<u32>,

    /// Font size as a fraction of the --fit dimension
    #[arg(long)]
    font_ratio: Option<f32>,

    /// Dimension the font size follows: width, height, long, short, diag
    #[arg(long)]
    fit: Option<FontFit>,

    /// TTF/OTF/TTC font file
    #[arg(long)]
    font: Option<PathBuf>,

    /// Fill color (#RGB or #RRGGBB)
    #[arg(long)]
    color: Option<String>,

    /// Fill opacity 0-255
    #[arg(long)]
    opacity: Option<u8>,

    /// Margin as a fraction of the longer image side
    #[arg(long)]
    margin_ratio: Option<f32>,

    /// Stroke width in pixels
    #[arg(long)]
    stroke_width: Option<u32>,

    /// Shadow offset in pixels
    #[arg(long, num_args = 2, value_names = ["DX", "DY"], allow_negative_numbers = true)]
    shadow_offset: Option<Vec<i32>>,

    /// Shadow opacity 0-255
    #[arg(long)]
    shadow_alpha: Option<u8>,

    /// Shadow blur radius in pixels
    #[arg(long)]
    shadow_blur: Option<u32>,

    /// Tile step multipliers
    #[arg(long, num_args = 2, value_names = ["SX", "SY"])]
    tile_step: Option<Vec<f32>>,

    /// Diagonal step multiplier
    #[arg(long)]
    diag_step: Option<f32>,

    /// Worker threads (0 = one per CPU)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// JPEG output quality 1-100
    #[arg(long)]
    jpeg_quality: Option<u8>,

    /// Log output format: text or json
    #[arg(long, default_value = "text")]
    log_format: LogFormat,
}

impl Args {
    /// Overlay every flag that was given onto `config`.
    fn apply(self, config: &mut WatermarkConfig) {
        if let Some(dir) = self.dir {
            config.input_dir = dir;
        }
        if let Some(output) = self.output {
            config.output_dir = output;
        }
        if let Some(text) = self.text {
            config.text = text;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(size) = self.font_size {
            config.font_size = Some(size);
        }
        if let Some(ratio) = self.font_ratio {
            config.font_ratio = ratio;
        }
        if let Some(fit) = self.fit {
            config.fit = fit;
        }
        if let Some(font) = self.font {
            config.font_path = Some(font);
        }
        if let Some(color) = self.color {
            config.color = color;
        }
        if let Some(opacity) = self.opacity {
            config.opacity = opacity;
        }
        if let Some(ratio) = self.margin_ratio {
            config.margin_ratio = ratio;
        }
        if let Some(width) = self.stroke_width {
            config.stroke_width = width;
        }
        // num_args = 2 guarantees both values
        if let Some(offset) = self.shadow_offset {
            config.shadow_offset = (offset[0], offset[1]);
        }
        if let Some(alpha) = self.shadow_alpha {
            config.shadow_alpha = alpha;
        }
        if let Some(blur) = self.shadow_blur {
            config.shadow_blur = blur;
        }
        if let Some(step) = self.tile_step {
            config.tile_step = (step[0], step[1]);
        }
        if let Some(step) = self.diag_step {
            config.diag_step = step;
        }
        if let Some(jobs) = self.jobs {
            config.jobs = jobs;
        }
        if let Some(quality) = self.jpeg_quality {
            config.jpeg_quality = quality;
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    // Initialize logging subsystem
    init_subscriber(args.log_format)
        .map_err(|e| anyhow!("Failed to initialize logging subsystem: {}", e))?;

    let mut config = match &args.config {
        Some(path) => WatermarkConfig::from_file(path)
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?,
        None => WatermarkConfig::default(),
    };
    let config_file = args.config.clone();
    args.apply(&mut config);
    config
        .validate()
        .map_err(|e| anyhow!("Invalid configuration: {}", e))?;

    tracing::info!(
        config_file = ?config_file,
        input_dir = %config.input_dir.display(),
        output_dir = %config.output_dir.display(),
        mode = %config.mode,
        "Configuration loaded successfully"
    );

    let report = process_directory(&config).context("Batch failed")?;

    println!(
        "{} of {} image(s) watermarked into {}",
        report.written.len(),
        report.total(),
        config.output_dir.display()
    );
    for failed in &report.failed {
        eprintln!("failed: {}: {}", failed.path.display(), failed.error);
    }

    Ok(())
}
