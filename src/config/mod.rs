//! Batch watermarking configuration.
//!
//! Settings are read from an optional YAML file (with `${VAR}` environment
//! substitution) and then overridden by command-line flags. Every field has a
//! default, so an empty file is a valid configuration.

use crate::watermark::{parse_hex_color, FontFit, ModeParams, StyleDescriptor};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_input_dir() -> PathBuf {
    PathBuf::from("pics")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_extensions() -> Vec<String> {
    ["png", "jpg", "jpeg", "webp", "bmp"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_text() -> String {
    "sample".to_string()
}

fn default_mode() -> String {
    "bottom-right".to_string()
}

fn default_font_ratio() -> f32 {
    0.05
}

fn default_fit() -> FontFit {
    FontFit::Diag
}

fn default_color() -> String {
    "#FFFFFF".to_string()
}

fn default_opacity() -> u8 {
    128
}

fn default_margin_ratio() -> f32 {
    0.02
}

fn default_shadow_offset() -> (i32, i32) {
    (2, 2)
}

fn default_shadow_alpha() -> u8 {
    180
}

fn default_tile_step() -> (f32, f32) {
    (1.0, 1.0)
}

fn default_diag_step() -> f32 {
    1.5
}

fn default_jpeg_quality() -> u8 {
    95
}

/// Settings for one batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatermarkConfig {
    /// Directory scanned (non-recursively) for images
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,

    /// Directory receiving `<stem>_wm.<ext>` files, created if missing
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// File extensions to process, matched case-insensitively
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Watermark text; `\n` starts a new line
    #[serde(default = "default_text")]
    pub text: String,

    /// Placement mode name (bottom-right, center, tile, diagonal-tile)
    #[serde(default = "default_mode")]
    pub mode: String,

    /// Fixed font size in pixels; overrides `font_ratio`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,

    /// Font size as a fraction of the `fit` dimension
    #[serde(default = "default_font_ratio")]
    pub font_ratio: f32,

    /// Image dimension the font size is derived from
    #[serde(default = "default_fit")]
    pub fit: FontFit,

    /// TTF/OTF/TTC font file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,

    /// Fill color as #RGB or #RRGGBB
    #[serde(default = "default_color")]
    pub color: String,

    /// Fill opacity 0-255
    #[serde(default = "default_opacity")]
    pub opacity: u8,

    /// Margin as a fraction of the longer image side
    #[serde(default = "default_margin_ratio")]
    pub margin_ratio: f32,

    #[serde(default)]
    pub stroke_width: u32,

    #[serde(default = "default_shadow_offset")]
    pub shadow_offset: (i32, i32),

    /// Shadow opacity 0-255
    #[serde(default = "default_shadow_alpha")]
    pub shadow_alpha: u8,

    #[serde(default)]
    pub shadow_blur: u32,

    /// Tile mode step multipliers applied to `text + margin`
    #[serde(default = "default_tile_step")]
    pub tile_step: (f32, f32),

    /// Diagonal mode step multiplier applied to the longer text side
    #[serde(default = "default_diag_step")]
    pub diag_step: f32,

    /// Worker threads; 0 uses one per CPU
    #[serde(default)]
    pub jobs: usize,

    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
            extensions: default_extensions(),
            text: default_text(),
            mode: default_mode(),
            font_size: None,
            font_ratio: default_font_ratio(),
            fit: default_fit(),
            font_path: None,
            color: default_color(),
            opacity: default_opacity(),
            margin_ratio: default_margin_ratio(),
            stroke_width: 0,
            shadow_offset: default_shadow_offset(),
            shadow_alpha: default_shadow_alpha(),
            shadow_blur: 0,
            tile_step: default_tile_step(),
            diag_step: default_diag_step(),
            jobs: 0,
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

impl WatermarkConfig {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, String> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| e.to_string())?;

        // First, check that all referenced environment variables exist
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            std::env::var(var_name).map_err(|_| {
                format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                )
            })?;
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        // An empty document deserializes to unit, not to an empty mapping
        if substituted.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&substituted).map_err(|e| e.to_string())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.text.is_empty() {
            return Err("Watermark text cannot be empty".to_string());
        }

        if self.extensions.is_empty() {
            return Err("At least one image extension must be configured".to_string());
        }

        if self.font_size.is_none() && !(self.font_ratio.is_finite() && self.font_ratio > 0.0) {
            return Err(format!(
                "font_ratio must be a positive finite number, got {}",
                self.font_ratio
            ));
        }

        if !self.margin_ratio.is_finite() || self.margin_ratio < 0.0 {
            return Err(format!(
                "margin_ratio must be a finite number >= 0, got {}",
                self.margin_ratio
            ));
        }

        let (step_x, step_y) = self.tile_step;
        for (name, value) in [
            ("tile_step x", step_x),
            ("tile_step y", step_y),
            ("diag_step", self.diag_step),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!(
                    "{} must be a positive finite number, got {}",
                    name, value
                ));
            }
        }

        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(format!(
                "jpeg_quality must be between 1 and 100, got {}",
                self.jpeg_quality
            ));
        }

        // Bounds stroke, blur and shadow offset; also parses the color
        self.style()?.validate().map_err(|e| e.to_string())?;

        Ok(())
    }

    /// Style descriptor shared by every image of the batch.
    pub fn style(&self) -> Result<StyleDescriptor, String> {
        Ok(StyleDescriptor {
            fill: parse_hex_color(&self.color).map_err(|e| e.to_string())?,
            opacity: self.opacity,
            stroke_width: self.stroke_width,
            shadow_offset: self.shadow_offset,
            shadow_alpha: self.shadow_alpha,
            shadow_blur: self.shadow_blur,
        })
    }

    /// Mode parameters for an image whose longer side is `long_side` pixels.
    pub fn mode_params(&self, long_side: u32) -> ModeParams {
        ModeParams {
            margin: (long_side as f64 * self.margin_ratio as f64).max(0.0) as u32,
            tile_step: self.tile_step,
            diag_step: self.diag_step,
        }
    }

    /// Whether `path` has one of the configured extensions.
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}
