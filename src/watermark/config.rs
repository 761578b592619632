//! Watermark configuration types.
//!
//! This module defines the values the compositor consumes:
//! - Placement mode names as they appear in YAML and on the command line
//! - Mode parameters (margin, tile step factors, diagonal step factor)
//! - The style descriptor (fill, stroke, shadow)
//!
//! Mode names are parsed into a [`PlacementMode`], a tagged enum that carries
//! only the parameters its anchor algorithm needs.

use super::WatermarkError;
use image::Rgba;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Default values
fn default_margin() -> u32 {
    20
}

fn default_tile_step() -> (f32, f32) {
    (1.0, 1.0)
}

fn default_diag_step() -> f32 {
    1.5
}

/// Largest stroke width, shadow blur radius or shadow offset component, in
/// pixels.
pub const MAX_EFFECT_PX: u32 = 1024;

/// Watermark placement mode name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WatermarkMode {
    /// Single instance in the bottom-right corner
    BottomRight,
    /// Single instance centered on the image
    Center,
    /// Orthogonal grid starting at the top-left corner
    Tile,
    /// Grid rotated by 45 degrees (like stock photo watermarks)
    DiagonalTile,
}

impl WatermarkMode {
    pub const ALL: [WatermarkMode; 4] = [
        Self::BottomRight,
        Self::Center,
        Self::Tile,
        Self::DiagonalTile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BottomRight => "bottom-right",
            Self::Center => "center",
            Self::Tile => "tile",
            Self::DiagonalTile => "diagonal-tile",
        }
    }
}

impl fmt::Display for WatermarkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WatermarkMode {
    type Err = WatermarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| WatermarkError::UnsupportedMode(s.to_string()))
    }
}

/// Mode-specific parameters, shared by all modes.
///
/// Each mode picks the fields it needs when converted to a [`PlacementMode`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModeParams {
    /// Margin in pixels (corner offset, tile gap)
    #[serde(default = "default_margin")]
    pub margin: u32,

    /// Horizontal and vertical multipliers applied to `text + margin`
    #[serde(default = "default_tile_step")]
    pub tile_step: (f32, f32),

    /// Multiplier applied to the longer text side for the diagonal grid
    #[serde(default = "default_diag_step")]
    pub diag_step: f32,
}

impl Default for ModeParams {
    fn default() -> Self {
        Self {
            margin: default_margin(),
            tile_step: default_tile_step(),
            diag_step: default_diag_step(),
        }
    }
}

/// Placement mode with the parameters its anchor algorithm consumes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlacementMode {
    BottomRight { margin: u32 },
    Center,
    Tile { margin: u32, step_x: f32, step_y: f32 },
    DiagonalTile { step: f32 },
}

impl PlacementMode {
    /// Build a placement mode from a mode name and the shared parameters.
    pub fn new(mode: WatermarkMode, params: &ModeParams) -> Result<Self, WatermarkError> {
        let placement = match mode {
            WatermarkMode::BottomRight => Self::BottomRight {
                margin: params.margin,
            },
            WatermarkMode::Center => Self::Center,
            WatermarkMode::Tile => {
                let (step_x, step_y) = params.tile_step;
                ensure_finite("tile step x", step_x)?;
                ensure_finite("tile step y", step_y)?;
                Self::Tile {
                    margin: params.margin,
                    step_x,
                    step_y,
                }
            }
            WatermarkMode::DiagonalTile => {
                ensure_finite("diagonal step", params.diag_step)?;
                Self::DiagonalTile {
                    step: params.diag_step,
                }
            }
        };
        Ok(placement)
    }

    /// Parse a mode name, failing with `UnsupportedMode` for unknown names.
    pub fn parse(name: &str, params: &ModeParams) -> Result<Self, WatermarkError> {
        Self::new(name.parse()?, params)
    }

    pub fn kind(&self) -> WatermarkMode {
        match self {
            Self::BottomRight { .. } => WatermarkMode::BottomRight,
            Self::Center => WatermarkMode::Center,
            Self::Tile { .. } => WatermarkMode::Tile,
            Self::DiagonalTile { .. } => WatermarkMode::DiagonalTile,
        }
    }
}

fn ensure_finite(name: &str, value: f32) -> Result<(), WatermarkError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(WatermarkError::InvalidStyle(format!(
            "{} must be a finite number, got {}",
            name, value
        )))
    }
}

/// RGB color parsed from a hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255)
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0)
    }

    pub fn with_alpha(self, alpha: u8) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, alpha])
    }
}

/// Parse a hex color string (`#RGB` or `#RRGGBB`).
pub fn parse_hex_color(hex: &str) -> Result<Color, WatermarkError> {
    let digits = hex.strip_prefix('#').ok_or_else(|| {
        WatermarkError::InvalidStyle(format!("color must start with '#', got '{}'", hex))
    })?;

    let channel = |s: &str| {
        u8::from_str_radix(s, 16).map_err(|_| {
            WatermarkError::InvalidStyle(format!("invalid hex digits '{}' in '{}'", s, hex))
        })
    };

    match digits.len() {
        // #RGB: each digit is doubled, 0xA -> 0xAA
        3 => Ok(Color::new(
            channel(&digits[0..1])? * 17,
            channel(&digits[1..2])? * 17,
            channel(&digits[2..3])? * 17,
        )),
        6 => Ok(Color::new(
            channel(&digits[0..2])?,
            channel(&digits[2..4])?,
            channel(&digits[4..6])?,
        )),
        n => Err(WatermarkError::InvalidStyle(format!(
            "color must be #RGB or #RRGGBB, got {} digits",
            n
        ))),
    }
}

/// Styling applied to every text instance of one watermarking call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleDescriptor {
    /// Fill color; the stroke shares it
    pub fill: Color,
    /// Fill opacity, 0 (invisible) to 255 (opaque)
    pub opacity: u8,
    /// Stroke width in pixels
    pub stroke_width: u32,
    /// Shadow displacement from the text anchor
    pub shadow_offset: (i32, i32),
    /// Shadow opacity, 0 disables the shadow
    pub shadow_alpha: u8,
    /// Gaussian blur radius applied to the shadow
    pub shadow_blur: u32,
}

impl Default for StyleDescriptor {
    fn default() -> Self {
        Self {
            fill: Color::white(),
            opacity: 128,
            stroke_width: 0,
            shadow_offset: (2, 2),
            shadow_alpha: 180,
            shadow_blur: 0,
        }
    }
}

impl StyleDescriptor {
    pub fn fill_rgba(&self) -> Rgba<u8> {
        self.fill.with_alpha(self.opacity)
    }

    pub fn shadow_rgba(&self) -> Rgba<u8> {
        Color::black().with_alpha(self.shadow_alpha)
    }

    /// Whether the shadow pass runs.
    ///
    /// A zero offset disables the shadow even when `shadow_alpha` is set.
    pub fn has_shadow(&self) -> bool {
        self.shadow_alpha > 0 && self.shadow_offset != (0, 0)
    }

    /// Reject stroke, blur and offset values beyond [`MAX_EFFECT_PX`].
    pub fn validate(&self) -> Result<(), WatermarkError> {
        let (dx, dy) = self.shadow_offset;
        let checks = [
            ("stroke_width", self.stroke_width),
            ("shadow_blur", self.shadow_blur),
            ("shadow_offset x", dx.unsigned_abs()),
            ("shadow_offset y", dy.unsigned_abs()),
        ];
        for (name, value) in checks {
            if value > MAX_EFFECT_PX {
                return Err(WatermarkError::InvalidStyle(format!(
                    "{} must be at most {} px, got {}",
                    name, MAX_EFFECT_PX, value
                )));
            }
        }
        Ok(())
    }
}
