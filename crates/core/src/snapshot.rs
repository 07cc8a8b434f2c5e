//! PNG loading and saving for CPU-side [`Image`]s.
//!
//! Only available with the `png` feature. Channels are stored as 8-bit
//! RGBA; values outside `[0, 1]` are clamped on write.

use crate::cpu::Image;
use crate::error::BlurError;
use std::path::Path;

/// Reads a PNG (any color type) into an RGBA image.
///
/// # Errors
///
/// Returns `BlurError::Io` if the file cannot be opened or decoded.
pub fn load_png(path: &Path) -> Result<Image, BlurError> {
    let decoded = image::open(path)
        .map_err(|e| BlurError::Io(format!("failed to read {}: {e}", path.display())))?
        .into_rgba8();
    let (width, height) = decoded.dimensions();
    Image::from_rgba8(width, height, decoded.as_raw())
}

/// Writes `img` as an 8-bit RGBA PNG.
///
/// # Errors
///
/// Returns `BlurError::Io` if encoding or writing fails.
pub fn write_png(img: &Image, path: &Path) -> Result<(), BlurError> {
    let buffer = image::RgbaImage::from_raw(img.width(), img.height(), img.to_rgba8())
        .ok_or_else(|| BlurError::Io("pixel buffer does not match image size".to_string()))?;
    buffer
        .save(path)
        .map_err(|e| BlurError::Io(format!("failed to write {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn write_then_load_preserves_quantized_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grad.png");

        let mut img = Image::new(4, 3);
        img.set(0, 0, Vec4::new(1.0, 0.0, 0.0, 1.0));
        img.set(3, 2, Vec4::new(0.0, 0.5, 1.0, 1.0));
        write_png(&img, &path).unwrap();

        let loaded = load_png(&path).unwrap();
        assert_eq!(loaded.width(), 4);
        assert_eq!(loaded.height(), 3);
        assert_eq!(loaded.to_rgba8(), img.to_rgba8());
    }

    #[test]
    fn write_clamps_out_of_range_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hdr.png");
        let img = Image::filled(2, 2, Vec4::new(3.0, -1.0, 0.5, 1.0));
        write_png(&img, &path).unwrap();
        let loaded = load_png(&path).unwrap();
        assert_eq!(&loaded.to_rgba8()[..4], &[255, 0, 128, 255]);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_png(&dir.path().join("missing.png")).unwrap_err();
        assert!(matches!(err, BlurError::Io(_)), "got {err:?}");
        assert!(err.to_string().contains("missing.png"));
    }
}
