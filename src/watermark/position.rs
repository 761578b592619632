//! Anchor calculation for watermark placement.
//!
//! An anchor is the top-left corner (ascender line) at which one text
//! instance is drawn. Each placement mode derives its anchors from the image
//! size and the measured text:
//!
//! - **bottom-right**: one anchor `margin` pixels in from the bottom-right
//! - **center**: one anchor centering the text box
//! - **tile**: a grid from `(0, 0)` stepping by `(text + margin) * factor`
//! - **diagonal-tile**: a grid stepping by `max(tw, th) * factor`, drawn on a
//!   padded working layer that is later rotated by 45 degrees
//!
//! Grids are produced from explicit index ranges and every step is checked
//! to be positive before any anchor is generated.
//!
//! # Example
//!
//! ```ignore
//! use shadowmark::watermark::position::{corner_anchor, Anchor, ImageDimensions};
//! use shadowmark::watermark::TextMetrics;
//!
//! let image = ImageDimensions { width: 200, height: 100 };
//! let text = TextMetrics { width: 50, height: 20 };
//! assert_eq!(corner_anchor(&image, &text, 10), Anchor::new(140, 70));
//! ```

use super::font::TextMetrics;
use super::WatermarkError;

/// Dimensions of the target image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// A single position where a text instance is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub x: i32,
    pub y: i32,
}

impl Anchor {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<Anchor> for (i32, i32) {
    fn from(anchor: Anchor) -> Self {
        (anchor.x, anchor.y)
    }
}

/// Anchor for the bottom-right corner.
///
/// Coordinates go negative when the text plus margin is larger than the
/// image; no clamping is applied.
pub fn corner_anchor(image: &ImageDimensions, text: &TextMetrics, margin: u32) -> Anchor {
    Anchor::new(
        image.width as i32 - text.width as i32 - margin as i32,
        image.height as i32 - text.height as i32 - margin as i32,
    )
}

/// Anchor that centers the text box, flooring odd remainders.
pub fn center_anchor(image: &ImageDimensions, text: &TextMetrics) -> Anchor {
    Anchor::new(
        (image.width as i32 - text.width as i32).div_euclid(2),
        (image.height as i32 - text.height as i32).div_euclid(2),
    )
}

/// Round `length * factor` to a pixel step, rejecting non-positive results.
fn scaled_step(mode: &'static str, length: u32, factor: f32) -> Result<u32, WatermarkError> {
    let step = (length as f64 * factor as f64).round();
    if !step.is_finite() || step < 1.0 {
        return Err(WatermarkError::DegenerateStep {
            mode,
            step: if step.is_finite() { step as i64 } else { 0 },
        });
    }
    // Steps larger than any image collapse to a single row/column
    Ok(step.min(u32::MAX as f64) as u32)
}

/// Horizontal and vertical grid steps for tile mode.
pub fn tile_steps(
    text: &TextMetrics,
    margin: u32,
    factor_x: f32,
    factor_y: f32,
) -> Result<(u32, u32), WatermarkError> {
    let step_x = scaled_step("tile", text.width.saturating_add(margin), factor_x)?;
    let step_y = scaled_step("tile", text.height.saturating_add(margin), factor_y)?;
    Ok((step_x, step_y))
}

/// Grid anchors from `(0, 0)` while `x < width` and `y < height`.
///
/// Produces `ceil(height / step_y) * ceil(width / step_x)` anchors, row by row.
pub fn tile_anchors(image: &ImageDimensions, step_x: u32, step_y: u32) -> Vec<Anchor> {
    debug_assert!(step_x > 0 && step_y > 0);
    let cols = image.width.div_ceil(step_x);
    let rows = image.height.div_ceil(step_y);

    let mut anchors = Vec::with_capacity(cols as usize * rows as usize);
    for row in 0..rows as i64 {
        for col in 0..cols as i64 {
            anchors.push(Anchor::new(
                (col * step_x as i64) as i32,
                (row * step_y as i64) as i32,
            ));
        }
    }
    anchors
}

/// Grid step for diagonal-tile mode.
pub fn diagonal_step(text: &TextMetrics, factor: f32) -> Result<u32, WatermarkError> {
    scaled_step("diagonal-tile", text.width.max(text.height), factor)
}

/// Working layer for the diagonal mode.
///
/// The layer shares the image's centre and is at least as wide and tall as
/// the image diagonal, so rotating it by 45 degrees about its centre leaves no
/// uncovered corners once it is cropped back to the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagonalCanvas {
    /// Padding added on the left and right
    pub pad_x: u32,
    /// Padding added on the top and bottom
    pub pad_y: u32,
    pub width: u32,
    pub height: u32,
}

impl DiagonalCanvas {
    pub fn for_image(image: &ImageDimensions) -> Self {
        let diagonal = (image.width as f64).hypot(image.height as f64).ceil() as u32;
        // One extra pixel keeps bilinear samples at the corners inside
        let pad_x = diagonal.saturating_sub(image.width).div_ceil(2) + 1;
        let pad_y = diagonal.saturating_sub(image.height).div_ceil(2) + 1;
        Self {
            pad_x,
            pad_y,
            width: image.width + 2 * pad_x,
            height: image.height + 2 * pad_y,
        }
    }
}

/// Indices `k` such that `origin + k * step` walks from at or below `lo` up
/// to, but excluding, `hi`.
fn grid_range(origin: i64, lo: i64, hi: i64, step: i64) -> std::ops::Range<i64> {
    let first = (lo - origin).div_euclid(step);
    let last = (hi - origin + step - 1).div_euclid(step);
    first..last.max(first)
}

/// Diagonal grid anchors in image coordinates.
///
/// The grid is aligned on `(-W, -H)` and covers at least `[-W, 2W) x [-H, 2H)`,
/// extended on the same grid when the padded working layer reaches further.
pub fn diagonal_anchors(
    image: &ImageDimensions,
    canvas: &DiagonalCanvas,
    text: &TextMetrics,
    step: u32,
) -> Vec<Anchor> {
    debug_assert!(step > 0);
    let step = step as i64;
    let (w, h) = (image.width as i64, image.height as i64);
    let (pad_x, pad_y) = (canvas.pad_x as i64, canvas.pad_y as i64);

    let cols = grid_range(
        -w,
        (-w).min(-pad_x - text.width as i64),
        (2 * w).max(w + pad_x),
        step,
    );
    let rows = grid_range(
        -h,
        (-h).min(-pad_y - text.height as i64),
        (2 * h).max(h + pad_y),
        step,
    );

    let capacity = (cols.end - cols.start) as usize * (rows.end - rows.start) as usize;
    let mut anchors = Vec::with_capacity(capacity);
    for row in rows {
        for col in cols.clone() {
            anchors.push(Anchor::new(
                (-w + col * step) as i32,
                (-h + row * step) as i32,
            ));
        }
    }
    anchors
}
