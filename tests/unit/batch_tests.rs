// Batch driver tests
//
// Every test works in its own temporary directory and injects a BoxFace so
// no font file is needed.

use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use shadowmark::batch::{list_images, process_directory, process_directory_with};
use shadowmark::config::WatermarkConfig;
use shadowmark::error::Error;
use shadowmark::watermark::{BoxFace, WatermarkError};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn face() -> BoxFace {
    BoxFace::new(8, 12)
}

fn write_image(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_pixel(width, height, Rgb([40, 80, 120]));
    DynamicImage::ImageRgb8(img).save(path).unwrap();
}

fn config_for(dir: &TempDir) -> WatermarkConfig {
    WatermarkConfig {
        input_dir: dir.path().join("in"),
        output_dir: dir.path().join("out"),
        text: "WM".to_string(),
        ..Default::default()
    }
}

#[test]
fn test_batch_writes_suffixed_outputs() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir);
    fs::create_dir_all(&config.input_dir).unwrap();
    write_image(&config.input_dir.join("b.png"), 120, 80);
    write_image(&config.input_dir.join("a.jpg"), 64, 48);
    fs::write(config.input_dir.join("notes.txt"), "not an image").unwrap();

    let report = process_directory_with(&config, &face()).unwrap();

    assert!(report.is_success(), "{:?}", report.failed);
    assert_eq!(
        report.written,
        vec![
            config.output_dir.join("a_wm.jpg"),
            config.output_dir.join("b_wm.png"),
        ]
    );

    let png = image::open(config.output_dir.join("b_wm.png")).unwrap();
    assert_eq!(png.dimensions(), (120, 80));
    // Alpha is dropped on save
    assert!(png.as_rgb8().is_some());

    let jpg = image::open(config.output_dir.join("a_wm.jpg")).unwrap();
    assert_eq!(jpg.dimensions(), (64, 48));
    assert!(!config.output_dir.join("notes_wm.txt").exists());
}

#[test]
fn test_batch_watermark_is_visible() {
    let dir = TempDir::new().unwrap();
    let config = WatermarkConfig {
        opacity: 255,
        margin_ratio: 0.0,
        ..config_for(&dir)
    };
    fs::create_dir_all(&config.input_dir).unwrap();
    write_image(&config.input_dir.join("plain.png"), 50, 40);

    process_directory_with(&config, &face()).unwrap();

    let out = image::open(config.output_dir.join("plain_wm.png"))
        .unwrap()
        .to_rgb8();
    // "WM" is 16x12 at the bottom-right corner with no margin
    assert_eq!(*out.get_pixel(45, 35), Rgb([255, 255, 255]));
    assert_eq!(*out.get_pixel(0, 0), Rgb([40, 80, 120]));
}

#[test]
fn test_corrupt_file_does_not_stop_batch() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir);
    fs::create_dir_all(&config.input_dir).unwrap();
    write_image(&config.input_dir.join("good1.png"), 40, 30);
    fs::write(config.input_dir.join("broken.png"), b"\x89PNG garbage").unwrap();
    write_image(&config.input_dir.join("good2.bmp"), 40, 30);

    let report = process_directory_with(&config, &face()).unwrap();

    assert_eq!(report.total(), 3);
    assert_eq!(report.written.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].path, config.input_dir.join("broken.png"));
    assert!(config.output_dir.join("good1_wm.png").exists());
    assert!(config.output_dir.join("good2_wm.bmp").exists());
    assert!(!config.output_dir.join("broken_wm.png").exists());
}

#[test]
fn test_degenerate_step_fails_per_image() {
    let dir = TempDir::new().unwrap();
    let config = WatermarkConfig {
        mode: "tile".to_string(),
        tile_step: (0.01, 1.0),
        margin_ratio: 0.0,
        ..config_for(&dir)
    };
    fs::create_dir_all(&config.input_dir).unwrap();
    write_image(&config.input_dir.join("x.png"), 40, 30);

    let report = process_directory_with(&config, &face()).unwrap();
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].error.contains("degenerate step"));
}

#[test]
fn test_empty_directory_yields_empty_report() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir);
    fs::create_dir_all(&config.input_dir).unwrap();

    let report = process_directory_with(&config, &face()).unwrap();
    assert_eq!(report.total(), 0);
    assert!(!config.output_dir.exists());
}

#[test]
fn test_unknown_mode_fails_before_reading_files() {
    let dir = TempDir::new().unwrap();
    let config = WatermarkConfig {
        mode: "spiral".to_string(),
        ..config_for(&dir)
    };
    // Input directory deliberately missing: the mode error wins
    let err = process_directory(&config).unwrap_err();
    assert!(matches!(
        err,
        Error::Watermark(WatermarkError::UnsupportedMode(ref name)) if name == "spiral"
    ));
}

#[test]
fn test_input_must_be_directory() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("file.png");
    write_image(&file, 4, 4);
    let config = WatermarkConfig {
        input_dir: file.clone(),
        ..config_for(&dir)
    };

    assert!(matches!(
        list_images(&config),
        Err(Error::NotADirectory(path)) if path == file
    ));
}

#[test]
fn test_explicit_thread_count() {
    let dir = TempDir::new().unwrap();
    let config = WatermarkConfig {
        jobs: 2,
        ..config_for(&dir)
    };
    fs::create_dir_all(&config.input_dir).unwrap();
    for i in 0..5 {
        write_image(&config.input_dir.join(format!("img{}.png", i)), 32, 32);
    }

    let report = process_directory_with(&config, &face()).unwrap();
    assert_eq!(report.written.len(), 5);
}
