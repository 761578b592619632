//! Font faces for measuring and rasterizing watermark text.
//!
//! The compositor only needs two things from a font: the ink bounding box of
//! a string and its coverage mask. [`FontFace`] captures that, with
//! [`ScaledFont`] backed by `ab_glyph` for real TTF/OTF/TTC files and
//! [`BoxFace`] drawing every character as a solid cell.
//!
//! Coordinates are relative to the draw origin: the left edge of the first
//! glyph cell and the ascender line of the first line of text.

use super::WatermarkError;
use ab_glyph::{Font, FontArc, FontVec, PxScale, ScaleFont};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Fallback font looked up relative to the working directory.
pub const DEFAULT_FONT_PATH: &str = "fonts/NotoSansJP-Regular.ttf";

/// Extra pixels between lines of multi-line text.
const LINE_SPACING: f32 = 4.0;

/// Measured size of a rendered text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextMetrics {
    pub width: u32,
    pub height: u32,
}

/// Anti-aliased coverage of a text run, positioned relative to the origin.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GlyphMask {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
    /// Row-major coverage in `0.0..=1.0`
    pub coverage: Vec<f32>,
}

impl GlyphMask {
    pub fn new(left: i32, top: i32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
            coverage: vec![0.0; width as usize * height as usize],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Coverage at mask-local coordinates, zero outside the mask.
    pub fn get(&self, x: i32, y: i32) -> f32 {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return 0.0;
        }
        self.coverage[y as usize * self.width as usize + x as usize]
    }

    /// Accumulate coverage at mask-local coordinates, saturating at 1.0.
    fn add(&mut self, x: u32, y: u32, value: f32) {
        if x < self.width && y < self.height {
            let idx = y as usize * self.width as usize + x as usize;
            self.coverage[idx] = (self.coverage[idx] + value).min(1.0);
        }
    }

    /// Right/bottom edge of the ink relative to the origin.
    pub fn metrics(&self) -> TextMetrics {
        if self.is_empty() {
            return TextMetrics::default();
        }
        TextMetrics {
            width: (self.left + self.width as i32).max(0) as u32,
            height: (self.top + self.height as i32).max(0) as u32,
        }
    }
}

/// A size-specific font able to measure and rasterize text.
pub trait FontFace: Send + Sync {
    /// Rasterize `text` into a coverage mask.
    fn rasterize(&self, text: &str) -> GlyphMask;

    /// Measure the ink box of `text` drawn at the origin.
    fn measure(&self, text: &str) -> TextMetrics {
        self.rasterize(text).metrics()
    }
}

/// Produces a face for a requested pixel size.
///
/// Batch processing sizes the font per image, so it holds a provider rather
/// than a single face.
pub trait FaceProvider: Send + Sync {
    fn face(&self, size_px: u32) -> Box<dyn FontFace>;
}

/// An `ab_glyph` font scaled so that one em equals `size_px` pixels.
#[derive(Clone)]
pub struct ScaledFont {
    font: FontArc,
    size_px: f32,
}

impl fmt::Debug for ScaledFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScaledFont")
            .field("size_px", &self.size_px)
            .finish()
    }
}

impl ScaledFont {
    pub fn new(font: FontArc, size_px: f32) -> Self {
        Self { font, size_px }
    }

    pub fn size_px(&self) -> f32 {
        self.size_px
    }

    fn px_scale(&self) -> PxScale {
        // PxScale is the ascent-to-descent height, not the em size
        let height = self.font.height_unscaled();
        match self.font.units_per_em() {
            Some(upem) if height > 0.0 => PxScale::from(self.size_px * height / upem),
            _ => PxScale::from(self.size_px),
        }
    }
}

impl FontFace for ScaledFont {
    fn rasterize(&self, text: &str) -> GlyphMask {
        if text.is_empty() || !self.size_px.is_finite() || self.size_px <= 0.0 {
            return GlyphMask::default();
        }

        let scale = self.px_scale();
        let scaled_font = self.font.as_scaled(scale);
        let line_advance = scaled_font.height() + LINE_SPACING;

        let mut outlines = Vec::new();
        for (line_idx, line) in text.split('\n').enumerate() {
            let baseline_y = scaled_font.ascent() + line_idx as f32 * line_advance;
            let mut cursor_x = 0.0f32;
            let mut prev_glyph: Option<ab_glyph::GlyphId> = None;

            for c in line.chars() {
                let glyph_id = scaled_font.glyph_id(c);
                if let Some(prev) = prev_glyph {
                    cursor_x += scaled_font.kern(prev, glyph_id);
                }

                let glyph = glyph_id
                    .with_scale_and_position(scale, ab_glyph::point(cursor_x, baseline_y));
                if let Some(outlined) = self.font.outline_glyph(glyph) {
                    outlines.push(outlined);
                }

                cursor_x += scaled_font.h_advance(glyph_id);
                prev_glyph = Some(glyph_id);
            }
        }

        let Some(first) = outlines.first() else {
            return GlyphMask::default();
        };
        let mut bounds = first.px_bounds();
        for outlined in &outlines[1..] {
            let b = outlined.px_bounds();
            bounds.min.x = bounds.min.x.min(b.min.x);
            bounds.min.y = bounds.min.y.min(b.min.y);
            bounds.max.x = bounds.max.x.max(b.max.x);
            bounds.max.y = bounds.max.y.max(b.max.y);
        }

        let left = bounds.min.x.floor() as i32;
        let top = bounds.min.y.floor() as i32;
        let width = (bounds.max.x.ceil() as i32 - left).max(0) as u32;
        let height = (bounds.max.y.ceil() as i32 - top).max(0) as u32;
        let mut mask = GlyphMask::new(left, top, width, height);

        for outlined in &outlines {
            let b = outlined.px_bounds();
            let ox = (b.min.x as i32 - left) as u32;
            let oy = (b.min.y as i32 - top) as u32;
            outlined.draw(|px, py, coverage| {
                mask.add(ox + px, oy + py, coverage);
            });
        }

        mask
    }
}

/// A face that draws every non-whitespace character as a solid cell.
///
/// Metrics are exact and independent of any font file, which makes it
/// suitable for layout previews and reproducible benchmarks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxFace {
    pub cell_width: u32,
    pub cell_height: u32,
    /// Horizontal gap between consecutive cells
    pub gap: u32,
}

impl BoxFace {
    pub fn new(cell_width: u32, cell_height: u32) -> Self {
        Self {
            cell_width,
            cell_height,
            gap: 0,
        }
    }

    pub fn with_gap(mut self, gap: u32) -> Self {
        self.gap = gap;
        self
    }
}

impl FontFace for BoxFace {
    fn rasterize(&self, text: &str) -> GlyphMask {
        let advance = self.cell_width + self.gap;
        let line_advance = self.cell_height + LINE_SPACING as u32;

        let cells: Vec<(u32, u32)> = text
            .split('\n')
            .enumerate()
            .flat_map(|(row, line)| {
                line.chars()
                    .enumerate()
                    .filter(|(_, c)| !c.is_whitespace())
                    .map(move |(col, _)| (col as u32 * advance, row as u32 * line_advance))
            })
            .collect();

        if cells.is_empty() || self.cell_width == 0 || self.cell_height == 0 {
            return GlyphMask::default();
        }

        let left = cells.iter().map(|(x, _)| *x).min().unwrap_or(0);
        let top = cells.iter().map(|(_, y)| *y).min().unwrap_or(0);
        let right = cells.iter().map(|(x, _)| *x).max().unwrap_or(0) + self.cell_width;
        let bottom = cells.iter().map(|(_, y)| *y).max().unwrap_or(0) + self.cell_height;

        let mut mask = GlyphMask::new(left as i32, top as i32, right - left, bottom - top);
        for (cx, cy) in cells {
            for y in 0..self.cell_height {
                for x in 0..self.cell_width {
                    mask.add(cx - left + x, cy - top + y, 1.0);
                }
            }
        }
        mask
    }
}

/// Loaded font data, shareable across worker threads.
#[derive(Clone)]
pub struct FontSource {
    font: FontArc,
    path: PathBuf,
}

impl fmt::Debug for FontSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontSource")
            .field("path", &self.path)
            .finish()
    }
}

impl FontSource {
    /// Load the first usable font among the explicit path and the fallback.
    ///
    /// Collections (`.ttc`) use their first face.
    pub fn load(explicit: Option<&Path>) -> Result<Self, WatermarkError> {
        let candidates: Vec<PathBuf> = explicit
            .map(Path::to_path_buf)
            .into_iter()
            .chain(std::iter::once(PathBuf::from(DEFAULT_FONT_PATH)))
            .collect();

        for path in &candidates {
            match Self::from_file(path) {
                Ok(source) => {
                    tracing::debug!(font = %path.display(), "Loaded font");
                    return Ok(source);
                }
                Err(e) => {
                    tracing::debug!(font = %path.display(), error = %e, "Font candidate rejected");
                }
            }
        }

        let tried: Vec<String> = candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        Err(WatermarkError::FontUnavailable(format!(
            "no usable font among [{}]; pass a TTF/OTF/TTC file explicitly",
            tried.join(", ")
        )))
    }

    /// Load a single font file.
    pub fn from_file(path: &Path) -> Result<Self, WatermarkError> {
        let data = std::fs::read(path).map_err(|e| {
            WatermarkError::FontUnavailable(format!("{}: {}", path.display(), e))
        })?;
        Self::from_bytes(data, path)
    }

    /// Parse font data already in memory; `origin` is used for diagnostics.
    pub fn from_bytes(data: Vec<u8>, origin: &Path) -> Result<Self, WatermarkError> {
        let font = FontVec::try_from_vec_and_index(data, 0).map_err(|e| {
            WatermarkError::FontUnavailable(format!("{}: {}", origin.display(), e))
        })?;
        Ok(Self {
            font: FontArc::new(font),
            path: origin.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A face at `size_px` pixels per em.
    pub fn at_size(&self, size_px: u32) -> ScaledFont {
        ScaledFont::new(self.font.clone(), size_px as f32)
    }
}

impl FaceProvider for FontSource {
    fn face(&self, size_px: u32) -> Box<dyn FontFace> {
        Box::new(self.at_size(size_px))
    }
}

/// Box faces have fixed metrics and ignore the requested size.
impl FaceProvider for BoxFace {
    fn face(&self, _size_px: u32) -> Box<dyn FontFace> {
        Box::new(*self)
    }
}

/// Image dimension the automatic font size is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontFit {
    Width,
    Height,
    Long,
    Short,
    Diag,
}

impl FontFit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Width => "width",
            Self::Height => "height",
            Self::Long => "long",
            Self::Short => "short",
            Self::Diag => "diag",
        }
    }

    /// The reference length in pixels for an image of `width x height`.
    pub fn base(&self, width: u32, height: u32) -> u32 {
        match self {
            Self::Width => width,
            Self::Height => height,
            Self::Long => width.max(height),
            Self::Short => width.min(height),
            Self::Diag => (width as f64).hypot(height as f64) as u32,
        }
    }
}

impl FromStr for FontFit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "width" => Ok(Self::Width),
            "height" => Ok(Self::Height),
            "long" => Ok(Self::Long),
            "short" => Ok(Self::Short),
            "diag" => Ok(Self::Diag),
            other => Err(format!(
                "unknown font fit '{}', expected one of width, height, long, short, diag",
                other
            )),
        }
    }
}

/// Font size in pixels: `fixed` when set, otherwise `ratio` of the fit base.
pub fn font_size_for(width: u32, height: u32, fixed: Option<u32>, ratio: f32, fit: FontFit) -> u32 {
    match fixed {
        Some(size) if size > 0 => size,
        _ => (fit.base(width, height) as f64 * ratio as f64).max(0.0) as u32,
    }
}
