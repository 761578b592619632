//! Watermark compositor for blending text overlays onto images.
//!
//! [`composite`] measures the text once, derives anchors for the placement
//! mode, stamps the prepared text at every anchor on a transparent overlay and
//! finally blends the overlay over an RGBA copy of the source. The source
//! image is never modified.
//!
//! # Example
//!
//! ```ignore
//! use shadowmark::watermark::{composite, BoxFace, ModeParams, PlacementMode, StyleDescriptor};
//!
//! let mode = PlacementMode::parse("tile", &ModeParams::default())?;
//! let face = BoxFace::new(8, 12);
//! let result = composite(&image, "SAMPLE", &face, &mode, &StyleDescriptor::default())?;
//! assert_eq!(result.dimensions(), (image.width(), image.height()));
//! ```

use super::font::FontFace;
use super::position::{
    center_anchor, corner_anchor, diagonal_anchors, diagonal_step, tile_anchors, tile_steps,
    Anchor, DiagonalCanvas, ImageDimensions,
};
use super::text_renderer::ShadowedText;
use super::{PlacementMode, StyleDescriptor, WatermarkError};
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};

/// Rotation applied to the diagonal working layer, counter-clockwise.
pub const DIAGONAL_ANGLE_DEGREES: f32 = 45.0;

/// Watermark `image` with `text` and return a new RGBA buffer.
///
/// Fails before drawing anything when the style is out of range or a tile or
/// diagonal step resolves to zero pixels.
pub fn composite(
    image: &DynamicImage,
    text: &str,
    face: &dyn FontFace,
    mode: &PlacementMode,
    style: &StyleDescriptor,
) -> Result<RgbaImage, WatermarkError> {
    style.validate()?;
    let (width, height) = image.dimensions();
    let dims = ImageDimensions { width, height };

    let prepared = ShadowedText::prepare(text, face, style);
    let overlay = build_overlay(&dims, &prepared, mode)?;

    let mut result = image.to_rgba8();
    alpha_composite(&mut result, &overlay, 0, 0);
    Ok(result)
}

/// Build the transparent `W x H` overlay holding every text instance.
pub fn build_overlay(
    dims: &ImageDimensions,
    prepared: &ShadowedText,
    mode: &PlacementMode,
) -> Result<RgbaImage, WatermarkError> {
    let metrics = prepared.metrics();
    let mut overlay = RgbaImage::new(dims.width, dims.height);

    match *mode {
        PlacementMode::BottomRight { margin } => {
            let anchor = corner_anchor(dims, &metrics, margin);
            tracing::debug!(x = anchor.x, y = anchor.y, "Placing bottom-right watermark");
            prepared.render(&mut overlay, anchor.into());
        }
        PlacementMode::Center => {
            let anchor = center_anchor(dims, &metrics);
            tracing::debug!(x = anchor.x, y = anchor.y, "Placing centered watermark");
            prepared.render(&mut overlay, anchor.into());
        }
        PlacementMode::Tile {
            margin,
            step_x,
            step_y,
        } => {
            let (sx, sy) = tile_steps(&metrics, margin, step_x, step_y)?;
            let anchors = tile_anchors(dims, sx, sy);
            tracing::debug!(
                step_x = sx,
                step_y = sy,
                anchors = anchors.len(),
                "Placing tiled watermark"
            );
            stamp_all(&mut overlay, prepared, &anchors, (0, 0));
        }
        PlacementMode::DiagonalTile { step } => {
            let step = diagonal_step(&metrics, step)?;
            let canvas = DiagonalCanvas::for_image(dims);
            let anchors = diagonal_anchors(dims, &canvas, &metrics, step);
            tracing::debug!(
                step,
                anchors = anchors.len(),
                layer_width = canvas.width,
                layer_height = canvas.height,
                "Placing diagonal watermark"
            );

            let mut working = RgbaImage::new(canvas.width, canvas.height);
            let offset = (canvas.pad_x as i32, canvas.pad_y as i32);
            stamp_all(&mut working, prepared, &anchors, offset);

            let rotated = rotate_layer(&working, DIAGONAL_ANGLE_DEGREES);
            alpha_composite(&mut overlay, &rotated, -offset.0, -offset.1);
        }
    }

    Ok(overlay)
}

/// Stamp the prepared text at each anchor shifted by `offset`, skipping
/// instances that cannot touch the layer.
fn stamp_all(
    layer: &mut RgbaImage,
    prepared: &ShadowedText,
    anchors: &[Anchor],
    offset: (i32, i32),
) {
    let Some((left, top, right, bottom)) = prepared.footprint() else {
        return;
    };
    let (w, h) = (layer.width() as i32, layer.height() as i32);

    for anchor in anchors {
        let x = anchor.x.saturating_add(offset.0);
        let y = anchor.y.saturating_add(offset.1);
        if x.saturating_add(right) <= 0
            || y.saturating_add(bottom) <= 0
            || x.saturating_add(left) >= w
            || y.saturating_add(top) >= h
        {
            continue;
        }
        prepared.render(layer, (x, y));
    }
}

/// Blend `top` over `base` with its top-left corner at `(x, y)`.
///
/// Pixels of `top` falling outside `base` are clipped.
pub fn alpha_composite(base: &mut RgbaImage, top: &RgbaImage, x: i32, y: i32) {
    let base_w = base.width() as i64;
    let base_h = base.height() as i64;
    let (x, y) = (x as i64, y as i64);

    let x_start = x.max(0);
    let y_start = y.max(0);
    let x_end = (x + top.width() as i64).min(base_w);
    let y_end = (y + top.height() as i64).min(base_h);

    for ty in y_start..y_end {
        for tx in x_start..x_end {
            let fg = *top.get_pixel((tx - x) as u32, (ty - y) as u32);
            if fg[3] == 0 {
                continue;
            }
            let bg = base.get_pixel_mut(tx as u32, ty as u32);
            *bg = blend_over(*bg, fg);
        }
    }
}

/// Porter-Duff "over": `foreground + background * (1 - foreground.alpha)`.
pub fn blend_over(background: Rgba<u8>, foreground: Rgba<u8>) -> Rgba<u8> {
    match (foreground[3], background[3]) {
        (0, _) => return background,
        (255, _) | (_, 0) => return foreground,
        _ => {}
    }

    let fg_alpha = foreground[3] as f32 / 255.0;
    let bg_alpha = background[3] as f32 / 255.0;
    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    let blend_channel = |fg: u8, bg: u8| -> u8 {
        let result =
            (fg as f32 * fg_alpha + bg as f32 * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        result.round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend_channel(foreground[0], background[0]),
        blend_channel(foreground[1], background[1]),
        blend_channel(foreground[2], background[2]),
        (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

/// Rotate `layer` counter-clockwise by `degrees` about its centre.
///
/// The canvas keeps its size; content rotated past the edges is dropped and
/// uncovered areas become transparent. Sampling is bilinear on premultiplied
/// alpha so transparent neighbours do not darken edges.
pub fn rotate_layer(layer: &RgbaImage, degrees: f32) -> RgbaImage {
    let (width, height) = layer.dimensions();
    let (sin, cos) = (degrees as f64).to_radians().sin_cos();
    let cx = width as f64 / 2.0;
    let cy = height as f64 / 2.0;

    RgbaImage::from_fn(width, height, |x, y| {
        let dx = x as f64 + 0.5 - cx;
        let dy = y as f64 + 0.5 - cy;
        // Inverse mapping: the source point rotated clockwise
        let sx = dx * cos - dy * sin + cx - 0.5;
        let sy = dx * sin + dy * cos + cy - 0.5;
        sample_bilinear(layer, sx, sy)
    })
}

fn sample_bilinear(image: &RgbaImage, sx: f64, sy: f64) -> Rgba<u8> {
    let x0 = sx.floor();
    let y0 = sy.floor();
    let fx = sx - x0;
    let fy = sy - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let fetch = |x: i64, y: i64| -> Rgba<u8> {
        if x < 0 || y < 0 || x >= image.width() as i64 || y >= image.height() as i64 {
            Rgba([0, 0, 0, 0])
        } else {
            *image.get_pixel(x as u32, y as u32)
        }
    };

    let taps = [
        (fetch(x0, y0), (1.0 - fx) * (1.0 - fy)),
        (fetch(x0 + 1, y0), fx * (1.0 - fy)),
        (fetch(x0, y0 + 1), (1.0 - fx) * fy),
        (fetch(x0 + 1, y0 + 1), fx * fy),
    ];

    let mut alpha = 0.0f64;
    let mut premultiplied = [0.0f64; 3];
    for (pixel, weight) in taps {
        let a = pixel[3] as f64 * weight;
        alpha += a;
        for (c, acc) in premultiplied.iter_mut().enumerate() {
            *acc += pixel[c] as f64 * a;
        }
    }

    let out_alpha = alpha.round().clamp(0.0, 255.0) as u8;
    if out_alpha == 0 {
        return Rgba([0, 0, 0, 0]);
    }
    let channel = |c: usize| (premultiplied[c] / alpha).round().clamp(0.0, 255.0) as u8;
    Rgba([channel(0), channel(1), channel(2), out_alpha])
}
