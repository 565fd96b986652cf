use std::{io::Cursor, path::Path};

use image::{imageops::FilterType, ImageFormat};

use crate::Result;

/// Image collaborator: square resize of a local asset.
pub trait ImageResizer: Send + Sync {
    /// Resize the image at `path` to `size`×`size` pixels and return PNG bytes.
    fn resize_square(&self, path: &Path, size: u32) -> Result<Vec<u8>>;
}

/// `image`-crate resizer. Aspect ratio is not preserved (emoji are square).
#[derive(Clone, Copy, Debug, Default)]
pub struct PngResizer;

impl ImageResizer for PngResizer {
    fn resize_square(&self, path: &Path, size: u32) -> Result<Vec<u8>> {
        let img = image::open(path)?;
        let resized = img.resize_exact(size, size, FilterType::CatmullRom);

        let mut out = Cursor::new(Vec::new());
        resized.write_to(&mut out, ImageFormat::Png)?;
        Ok(out.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba, RgbaImage};

    #[test]
    fn resizes_to_exact_square_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.png");
        RgbaImage::from_pixel(8, 4, Rgba([255, 0, 0, 255]))
            .save(&path)
            .unwrap();

        let bytes = PngResizer.resize_square(&path, 3).unwrap();
        let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Png).unwrap();
        assert_eq!(decoded.dimensions(), (3, 3));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(PngResizer
            .resize_square(&dir.path().join("nope.png"), 24)
            .is_err());
    }
}
