//! Shadowed text rendering.
//!
//! Draws one instance of a text string onto a transparent layer, bottom to
//! top:
//!
//! 1. a black drop shadow at `position + shadow_offset`, optionally blurred,
//! 2. the text body in the fill color.
//!
//! Both passes include the stroke when `stroke_width > 0`. The stroke shares
//! the fill color, so it thickens the glyphs rather than outlining them in a
//! second color.
//!
//! Tiled modes stamp the same text hundreds of times, so rasterization,
//! stroking and blurring happen once in [`ShadowedText::prepare`] and
//! [`ShadowedText::render`] only composites the prepared sprites.
//!
//! # Example
//!
//! ```ignore
//! use shadowmark::watermark::{render_shadowed_text, BoxFace, StyleDescriptor};
//! use image::RgbaImage;
//!
//! let mut layer = RgbaImage::new(200, 100);
//! let face = BoxFace::new(8, 12);
//! render_shadowed_text(&mut layer, (10, 10), "Hello", &face, &StyleDescriptor::default());
//! ```

use super::compositor::alpha_composite;
use super::font::{FontFace, GlyphMask, TextMetrics};
use super::StyleDescriptor;
use image::{imageops, Rgba, RgbaImage};

/// Gaussian support kept around a blurred shadow, in multiples of sigma.
const BLUR_EXTENT: u32 = 3;

/// A pre-rendered layer positioned relative to the text anchor.
#[derive(Debug, Clone)]
struct Sprite {
    image: RgbaImage,
    left: i32,
    top: i32,
}

/// Text prepared for repeated stamping with one style.
#[derive(Debug, Clone)]
pub struct ShadowedText {
    metrics: TextMetrics,
    shadow: Option<Sprite>,
    body: Option<Sprite>,
}

impl ShadowedText {
    /// Rasterize `text` with `face` and bake stroke, shadow and blur.
    pub fn prepare(text: &str, face: &dyn FontFace, style: &StyleDescriptor) -> Self {
        let mask = face.rasterize(text);
        let metrics = mask.metrics();
        if mask.is_empty() {
            return Self {
                metrics,
                shadow: None,
                body: None,
            };
        }

        let stroked = dilate(&mask, style.stroke_width);

        // Offset (0, 0) disables the shadow even with a non-zero alpha
        let shadow = style.has_shadow().then(|| {
            let (dx, dy) = style.shadow_offset;
            let sprite = paint(&stroked, style.shadow_rgba());
            let sprite = if style.shadow_blur > 0 {
                blur(sprite, style.shadow_blur)
            } else {
                sprite
            };
            Sprite {
                left: sprite.left.saturating_add(dx),
                top: sprite.top.saturating_add(dy),
                image: sprite.image,
            }
        });

        let body = (style.opacity > 0).then(|| paint(&stroked, style.fill_rgba()));

        Self {
            metrics,
            shadow,
            body,
        }
    }

    /// Metrics of the unstroked text, as used for placement.
    pub fn metrics(&self) -> TextMetrics {
        self.metrics
    }

    /// Composite the shadow and then the body onto `layer` at `position`.
    ///
    /// Anything outside the layer is clipped.
    pub fn render(&self, layer: &mut RgbaImage, position: (i32, i32)) {
        let (x, y) = position;
        for sprite in self.shadow.iter().chain(self.body.iter()) {
            alpha_composite(
                layer,
                &sprite.image,
                x.saturating_add(sprite.left),
                y.saturating_add(sprite.top),
            );
        }
    }

    /// Bounding box `(left, top, right, bottom)` of everything `render`
    /// draws, relative to the anchor. `None` when nothing is drawn.
    pub fn footprint(&self) -> Option<(i32, i32, i32, i32)> {
        self.shadow
            .iter()
            .chain(self.body.iter())
            .map(|s| {
                (
                    s.left,
                    s.top,
                    s.left.saturating_add(s.image.width() as i32),
                    s.top.saturating_add(s.image.height() as i32),
                )
            })
            .reduce(|a, b| (a.0.min(b.0), a.1.min(b.1), a.2.max(b.2), a.3.max(b.3)))
    }
}

/// Draw `text` at `position` on `layer` with shadow and stroke.
pub fn render_shadowed_text(
    layer: &mut RgbaImage,
    position: (i32, i32),
    text: &str,
    face: &dyn FontFace,
    style: &StyleDescriptor,
) {
    ShadowedText::prepare(text, face, style).render(layer, position);
}

/// Grow the mask by a disc of radius `radius`.
fn dilate(mask: &GlyphMask, radius: u32) -> GlyphMask {
    if radius == 0 {
        return mask.clone();
    }

    let r = radius as i32;
    let r_sq = r as i64 * r as i64;
    let offsets: Vec<(i32, i32)> = (-r..=r)
        .flat_map(|dy| (-r..=r).map(move |dx| (dx, dy)))
        .filter(|(dx, dy)| (*dx as i64).pow(2) + (*dy as i64).pow(2) <= r_sq)
        .collect();

    let mut out = GlyphMask::new(
        mask.left - r,
        mask.top - r,
        mask.width + 2 * radius,
        mask.height + 2 * radius,
    );
    let out_width = out.width as usize;
    for y in 0..out.height as i32 {
        for x in 0..out.width as i32 {
            // (x, y) in `out` is (x - r, y - r) in `mask`
            let value = offsets
                .iter()
                .map(|(dx, dy)| mask.get(x - r + dx, y - r + dy))
                .fold(0.0f32, f32::max);
            out.coverage[y as usize * out_width + x as usize] = value;
        }
    }
    out
}

/// Turn coverage into a sprite of `color`, scaling its alpha.
fn paint(mask: &GlyphMask, color: Rgba<u8>) -> Sprite {
    let alpha = color[3] as f32;
    let image = RgbaImage::from_fn(mask.width, mask.height, |x, y| {
        let coverage = mask.get(x as i32, y as i32);
        let a = (alpha * coverage).round().clamp(0.0, 255.0) as u8;
        Rgba([color[0], color[1], color[2], a])
    });
    Sprite {
        image,
        left: mask.left,
        top: mask.top,
    }
}

/// Gaussian-blur a sprite, padding it so the blur is not cut off.
fn blur(sprite: Sprite, radius: u32) -> Sprite {
    let pad = radius * BLUR_EXTENT;
    let mut padded = RgbaImage::new(
        sprite.image.width() + 2 * pad,
        sprite.image.height() + 2 * pad,
    );
    imageops::replace(&mut padded, &sprite.image, pad as i64, pad as i64);
    Sprite {
        image: imageops::blur(&padded, radius as f32),
        left: sprite.left - pad as i32,
        top: sprite.top - pad as i32,
    }
}
