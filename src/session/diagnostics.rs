//! PNG output of diagnostic views

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat};

use crate::core::error::Error;
use crate::core::types::Result;

/// Write `image` as `<dir>/<name>.png`, creating `dir` if needed
pub fn write_png(dir: &Path, name: &str, image: impl Into<DynamicImage>) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.png", name));
    let image: DynamicImage = image.into();
    image
        .save_with_format(&path, ImageFormat::Png)
        .map_err(|e| Error::Persistence(format!("{}: {}", path.display(), e)))?;
    log::debug!("Wrote {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn test_write_png() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("diag");
        let path = write_png(&out, "mask", GrayImage::from_pixel(3, 2, Luma([255]))).unwrap();
        assert_eq!(path, out.join("mask.png"));
        let back = image::open(&path).unwrap().to_luma8();
        assert_eq!(back.dimensions(), (3, 2));
        assert_eq!(back.get_pixel(2, 1), &Luma([255]));
    }
}
