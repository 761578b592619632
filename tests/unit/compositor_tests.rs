// Compositing tests
//
// These tests drive the public watermark API end to end with the
// deterministic BoxFace so that pixel expectations are exact.

use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use rstest::rstest;
use shadowmark::watermark::position::{corner_anchor, tile_anchors};
use shadowmark::watermark::{
    composite, BoxFace, Color, FontFace, ModeParams, PlacementMode, StyleDescriptor, TextMetrics,
    WatermarkError, WatermarkMode,
};
use shadowmark::watermark::{FontSource, ImageDimensions};
use std::path::PathBuf;

const GRAY: Rgba<u8> = Rgba([100, 100, 100, 255]);

fn gray_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, GRAY))
}

/// 10x16 cells with a 2px gap: "SAMPLE" measures 70x16.
fn sample_face() -> BoxFace {
    BoxFace::new(10, 16).with_gap(2)
}

fn all_modes(margin: u32) -> Vec<PlacementMode> {
    let params = ModeParams {
        margin,
        ..ModeParams::default()
    };
    WatermarkMode::ALL
        .iter()
        .map(|mode| PlacementMode::new(*mode, &params).unwrap())
        .collect()
}

/// Test: end-to-end bottom-right watermark
///
/// 400x300 image, "SAMPLE", margin 20, opacity 128, default shadow (2, 2).
/// Every changed pixel must lie inside the text box extended by the shadow
/// offset, and the box must actually be drawn.
#[test]
fn test_bottom_right_changes_confined_to_text_box() {
    let image = gray_image(400, 300);
    let face = sample_face();
    assert_eq!(
        face.measure("SAMPLE"),
        TextMetrics {
            width: 70,
            height: 16
        }
    );

    let mode = PlacementMode::BottomRight { margin: 20 };
    let style = StyleDescriptor::default();
    let result = composite(&image, "SAMPLE", &face, &mode, &style).unwrap();
    assert_eq!(result.dimensions(), (400, 300));

    // Anchor (310, 264); shadow extends 2px right and down
    let (x0, y0, x1, y1) = (310, 264, 310 + 70 + 2, 264 + 16 + 2);
    let mut changed = 0;
    for (x, y, pixel) in result.enumerate_pixels() {
        let inside = x >= x0 && x < x1 && y >= y0 && y < y1;
        if *pixel != GRAY {
            assert!(inside, "pixel ({}, {}) changed outside the text box", x, y);
            changed += 1;
        }
    }
    assert!(changed > 70 * 16 / 2);

    // Body only (the shadow starts 2px further in): white at 128 over gray
    let body = result.get_pixel(311, 265);
    assert!((170..=186).contains(&body.0[0]), "got {:?}", body);
    assert_eq!(body.0[3], 255);

    // Shadow only, below the last text row
    let shadow = result.get_pixel(320, 281);
    assert!(shadow.0[0] < GRAY.0[0], "got {:?}", shadow);
}

#[test]
fn test_output_keeps_dimensions_for_every_mode() {
    let image = gray_image(123, 77);
    for mode in all_modes(5) {
        let result = composite(&image, "Hi", &BoxFace::new(6, 9), &mode, &StyleDescriptor::default())
            .unwrap();
        assert_eq!(result.dimensions(), image.dimensions(), "mode {}", mode.kind());
    }
}

#[test]
fn test_zero_opacity_is_identity_for_every_mode() {
    let image = gray_image(96, 64);
    let style = StyleDescriptor {
        opacity: 0,
        shadow_alpha: 0,
        stroke_width: 3,
        shadow_blur: 2,
        ..StyleDescriptor::default()
    };

    for mode in all_modes(4) {
        let result = composite(&image, "WM", &BoxFace::new(8, 8), &mode, &style).unwrap();
        assert_eq!(result, image.to_rgba8(), "mode {}", mode.kind());
    }
}

#[test]
fn test_zero_shadow_offset_disables_shadow() {
    let image = gray_image(80, 40);
    let style = StyleDescriptor {
        opacity: 0,
        shadow_alpha: 255,
        shadow_offset: (0, 0),
        ..StyleDescriptor::default()
    };

    let result = composite(&image, "X", &BoxFace::new(10, 10), &PlacementMode::Center, &style)
        .unwrap();
    assert_eq!(result, image.to_rgba8());
}

#[test]
fn test_fill_color_is_used() {
    let image = gray_image(60, 40);
    let style = StyleDescriptor {
        fill: Color::new(255, 0, 0),
        opacity: 255,
        shadow_alpha: 0,
        ..StyleDescriptor::default()
    };

    let result = composite(&image, "X", &BoxFace::new(10, 10), &PlacementMode::Center, &style)
        .unwrap();
    // Center anchor (25, 15)
    assert_eq!(*result.get_pixel(30, 20), Rgba([255, 0, 0, 255]));
    assert_eq!(*result.get_pixel(5, 5), GRAY);
}

#[test]
fn test_corner_anchor_reference_case() {
    let anchor = corner_anchor(
        &ImageDimensions {
            width: 200,
            height: 100,
        },
        &TextMetrics {
            width: 50,
            height: 20,
        },
        10,
    );
    assert_eq!((anchor.x, anchor.y), (140, 70));
}

/// Test: tile grid size
///
/// The grid holds ceil(H / sy) * ceil(W / sx) anchors starting at (0, 0).
#[rstest]
#[case(100, 100, 10, 10, 100)]
#[case(101, 100, 10, 10, 110)]
#[case(400, 300, 90, 36, 45)]
#[case(7, 5, 100, 100, 1)]
#[case(1, 1, 1, 1, 1)]
fn test_tile_anchor_count(
    #[case] width: u32,
    #[case] height: u32,
    #[case] step_x: u32,
    #[case] step_y: u32,
    #[case] expected: usize,
) {
    let anchors = tile_anchors(&ImageDimensions { width, height }, step_x, step_y);
    assert_eq!(anchors.len(), expected);
    assert_eq!((anchors[0].x, anchors[0].y), (0, 0));
    assert!(anchors
        .iter()
        .all(|a| (a.x as u32) < width && (a.y as u32) < height));
}

#[test]
fn test_tile_covers_whole_image() {
    let image = gray_image(90, 60);
    let style = StyleDescriptor {
        opacity: 255,
        shadow_alpha: 0,
        ..StyleDescriptor::default()
    };
    // Cells 10x10, margin 0, step 1.0: the grid is gap-free
    let mode = PlacementMode::Tile {
        margin: 0,
        step_x: 1.0,
        step_y: 1.0,
    };
    let result = composite(&image, "X", &BoxFace::new(10, 10), &mode, &style).unwrap();
    assert!(result.pixels().all(|p| *p == Rgba([255, 255, 255, 255])));
}

#[rstest]
#[case(PlacementMode::Tile { margin: 0, step_x: 1.0, step_y: 1.0 }, "", "tile")]
#[case(PlacementMode::Tile { margin: 5, step_x: 0.01, step_y: 1.0 }, "AB", "tile")]
#[case(PlacementMode::Tile { margin: 5, step_x: 1.0, step_y: -2.0 }, "AB", "tile")]
#[case(PlacementMode::DiagonalTile { step: 0.01 }, "AB", "diagonal-tile")]
#[case(PlacementMode::DiagonalTile { step: 1.5 }, "", "diagonal-tile")]
fn test_degenerate_steps_fail(
    #[case] mode: PlacementMode,
    #[case] text: &str,
    #[case] expected_mode: &str,
) {
    let image = gray_image(50, 50);
    let err = composite(&image, text, &BoxFace::new(4, 4), &mode, &StyleDescriptor::default())
        .unwrap_err();
    match err {
        WatermarkError::DegenerateStep { mode, step } => {
            assert_eq!(mode, expected_mode);
            assert!(step <= 0);
        }
        other => panic!("expected DegenerateStep, got {:?}", other),
    }
}

#[test]
fn test_out_of_range_style_is_rejected_before_drawing() {
    let image = gray_image(50, 50);
    let styles = [
        StyleDescriptor {
            shadow_offset: (i32::MAX, 0),
            ..StyleDescriptor::default()
        },
        StyleDescriptor {
            stroke_width: 46341,
            ..StyleDescriptor::default()
        },
    ];

    for style in styles {
        let err = composite(&image, "X", &BoxFace::new(5, 5), &PlacementMode::Center, &style)
            .unwrap_err();
        assert!(matches!(err, WatermarkError::InvalidStyle(_)), "{:?}", err);
    }
}

#[test]
fn test_unknown_mode_name() {
    let err = PlacementMode::parse("spiral", &ModeParams::default()).unwrap_err();
    assert_eq!(err, WatermarkError::UnsupportedMode("spiral".to_string()));
}

#[test]
fn test_diagonal_reaches_all_corners() {
    let image = gray_image(120, 90);
    let style = StyleDescriptor {
        opacity: 255,
        shadow_alpha: 0,
        ..StyleDescriptor::default()
    };
    let mode = PlacementMode::DiagonalTile { step: 1.0 };
    let result = composite(&image, "W", &BoxFace::new(14, 14), &mode, &style).unwrap();

    // Step 14 on 14px cells leaves no gaps once rotated, so every 10x10
    // corner block contains watermark pixels.
    let corners = [(0, 0), (110, 0), (0, 80), (110, 80)];
    for (cx, cy) in corners {
        let touched = (cx..cx + 10)
            .flat_map(|x| (cy..cy + 10).map(move |y| (x, y)))
            .any(|(x, y)| *result.get_pixel(x, y) != GRAY);
        assert!(touched, "corner ({}, {}) untouched", cx, cy);
    }
}

const DEFAULT_TEST_FONT: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";

/// Real fonts are optional on CI machines.
///
/// `SHADOWMARK_TEST_FONT` points at another font file; setting
/// `SHADOWMARK_REQUIRE_FONT` turns a missing font into a failure instead of a
/// reported skip.
#[test]
fn test_real_font_renders_when_available() {
    let path: PathBuf = std::env::var_os("SHADOWMARK_TEST_FONT")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TEST_FONT));
    if !path.exists() {
        assert!(
            std::env::var_os("SHADOWMARK_REQUIRE_FONT").is_none(),
            "SHADOWMARK_REQUIRE_FONT is set but {} does not exist",
            path.display()
        );
        println!(
            "SKIPPED test_real_font_renders_when_available: {} not installed \
             (set SHADOWMARK_TEST_FONT to a TTF/OTF file)",
            path.display()
        );
        return;
    }

    let fonts = FontSource::load(Some(&path)).unwrap();
    let face = fonts.at_size(32);
    let metrics = face.measure("SAMPLE");
    assert!(metrics.width > 60 && metrics.height > 15, "{:?}", metrics);

    let image = gray_image(400, 300);
    let result = composite(
        &image,
        "SAMPLE",
        &face,
        &PlacementMode::BottomRight { margin: 20 },
        &StyleDescriptor::default(),
    )
    .unwrap();
    assert!(result.pixels().any(|p| *p != GRAY));
    assert_eq!(*result.get_pixel(0, 0), GRAY);
}
