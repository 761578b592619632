//! Watermark module for compositing shadowed text onto images.
//!
//! This is the pure core of the crate: given a decoded image, a font face, a
//! placement mode and a style, it produces a new watermarked RGBA buffer.
//! Nothing here touches the filesystem except [`FontSource`] loading.
//!
//! # Features
//!
//! - **4 placement modes**: bottom-right, center, tile, diagonal-tile
//! - **Drop shadow** with offset, opacity and Gaussian blur
//! - **Fill-colored stroke** to thicken glyphs
//! - **Pluggable faces**: `ab_glyph` fonts or fixed-metrics box cells
//!
//! # Configuration Example
//!
//! ```yaml
//! text: "© example"
//! mode: diagonal-tile
//! opacity: 96
//! stroke_width: 1
//! shadow_offset: [2, 2]
//! shadow_alpha: 180
//! shadow_blur: 2
//! diag_step: 1.5
//! ```

pub mod compositor;
pub mod config;
pub mod error;
pub mod font;
pub mod position;
pub mod text_renderer;

// Re-export main types for convenience
pub use compositor::{alpha_composite, blend_over, build_overlay, composite, rotate_layer};
pub use config::{
    parse_hex_color, Color, ModeParams, PlacementMode, StyleDescriptor, WatermarkMode,
    MAX_EFFECT_PX,
};
pub use error::WatermarkError;
pub use font::{
    font_size_for, BoxFace, FaceProvider, FontFace, FontFit, FontSource, GlyphMask, ScaledFont,
    TextMetrics,
};
pub use position::{Anchor, DiagonalCanvas, ImageDimensions};
pub use text_renderer::{render_shadowed_text, ShadowedText};
