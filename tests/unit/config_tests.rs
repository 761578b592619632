// Configuration tests
//
// Loading from disk, YAML overrides on top of defaults, and the mapping from
// configuration to compositing parameters.

use shadowmark::config::WatermarkConfig;
use shadowmark::watermark::{
    font_size_for, Color, FontFit, PlacementMode, WatermarkError, WatermarkMode,
};
use std::io::Write;
use std::path::PathBuf;

#[test]
fn test_from_file_reads_yaml() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r##"
input_dir: shots
mode: tile
color: "#0F0"
tile_step: [2.0, 1.5]
"##
    )
    .unwrap();

    let config = WatermarkConfig::from_file(file.path()).unwrap();
    assert_eq!(config.input_dir, PathBuf::from("shots"));
    assert_eq!(config.mode, "tile");
    assert_eq!(config.tile_step, (2.0, 1.5));
    // Unspecified fields keep their defaults
    assert_eq!(config.output_dir, PathBuf::from("output"));
    assert_eq!(config.opacity, 128);

    let style = config.style().unwrap();
    assert_eq!(style.fill, Color::new(0, 255, 0));
}

#[test]
fn test_from_file_missing() {
    let err = WatermarkConfig::from_file("/nonexistent/shadowmark.yaml").unwrap_err();
    assert!(err.contains("Failed to read config file"));
}

#[test]
fn test_env_substitution_in_paths() {
    std::env::set_var("SHADOWMARK_IT_OUTPUT", "/tmp/shadowmark-out");
    let config = WatermarkConfig::from_yaml_with_env("output_dir: ${SHADOWMARK_IT_OUTPUT}/wm")
        .unwrap();
    assert_eq!(config.output_dir, PathBuf::from("/tmp/shadowmark-out/wm"));
}

#[test]
fn test_mode_names_round_trip() {
    for mode in WatermarkMode::ALL {
        let config = WatermarkConfig {
            mode: mode.as_str().to_string(),
            ..Default::default()
        };
        let placement = PlacementMode::parse(&config.mode, &config.mode_params(500)).unwrap();
        assert_eq!(placement.kind(), mode);
    }
}

#[test]
fn test_mode_params_feed_placement() {
    let config = WatermarkConfig {
        margin_ratio: 0.05,
        tile_step: (1.5, 2.0),
        ..Default::default()
    };
    let params = config.mode_params(400);

    assert_eq!(
        PlacementMode::new(WatermarkMode::BottomRight, &params).unwrap(),
        PlacementMode::BottomRight { margin: 20 }
    );
    assert_eq!(
        PlacementMode::new(WatermarkMode::Tile, &params).unwrap(),
        PlacementMode::Tile {
            margin: 20,
            step_x: 1.5,
            step_y: 2.0
        }
    );
}

#[test]
fn test_unknown_mode_is_reported_by_name() {
    let config = WatermarkConfig {
        mode: "Diagonal".to_string(),
        ..Default::default()
    };
    // validate() leaves mode checking to placement parsing
    assert!(config.validate().is_ok());
    assert_eq!(
        PlacementMode::parse(&config.mode, &config.mode_params(100)).unwrap_err(),
        WatermarkError::UnsupportedMode("Diagonal".to_string())
    );
}

#[test]
fn test_font_size_follows_fit() {
    let config = WatermarkConfig::default();
    // diag of 300x400 is 500; 5% of it
    assert_eq!(
        font_size_for(300, 400, config.font_size, config.font_ratio, config.fit),
        25
    );
    assert_eq!(font_size_for(300, 400, None, 0.1, FontFit::Width), 30);
    assert_eq!(font_size_for(300, 400, None, 0.1, FontFit::Long), 40);
    assert_eq!(font_size_for(300, 400, Some(64), 0.1, FontFit::Short), 64);
}
