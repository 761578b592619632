//! EXIF orientation handling.
//!
//! Camera JPEGs often store pixels sideways and record the intended rotation
//! in the EXIF `Orientation` tag. Watermark placement must happen on the
//! upright image, so the transform is applied right after decoding.

use image::DynamicImage;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Read the primary image's EXIF orientation (1-8), if any.
///
/// Missing files, files without EXIF and malformed tags all yield `None`.
pub fn read_orientation(path: &Path) -> Option<u32> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut reader).ok()?;
    let field = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
    field.value.get_uint(0)
}

/// Transform `image` so that orientation `1` (upright) results.
///
/// Unknown values leave the image untouched.
pub fn apply_orientation(image: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => image.fliph(),
        3 => image.rotate180(),
        4 => image.flipv(),
        // transpose
        5 => image.rotate90().fliph(),
        6 => image.rotate90(),
        // transverse
        7 => image.rotate270().fliph(),
        8 => image.rotate270(),
        _ => image,
    }
}

/// Apply the orientation stored in `path`'s EXIF data to its decoded `image`.
pub fn upright(path: &Path, image: DynamicImage) -> DynamicImage {
    match read_orientation(path) {
        Some(orientation) if orientation != 1 => {
            tracing::debug!(
                path = %path.display(),
                orientation = orientation,
                "Applying EXIF orientation"
            );
            apply_orientation(image, orientation)
        }
        _ => image,
    }
}
