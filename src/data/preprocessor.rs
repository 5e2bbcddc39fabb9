// ============================================================
// Layer 4 — Image Preprocessor
// ============================================================
// Turns an image file into the flat float buffer the network
// consumes:
//
//   1. Decode (jpg / png / bmp) with the `image` crate
//   2. Resize to image_size × image_size (Triangle filter)
//   3. Convert to RGB, scale each channel to [0, 1]
//   4. Lay out channel-major (CHW): all R, then all G, then all B
//
// Training, evaluation and prediction all go through this one
// function so a checkpoint always sees inputs in the same form.

use std::path::Path;

use anyhow::{Context, Result};
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};

/// Number of colour channels fed to the network
pub const CHANNELS: usize = 3;

#[derive(Debug, Clone, Copy)]
pub struct ImagePreprocessor {
    image_size: usize,
}

impl ImagePreprocessor {
    pub fn new(image_size: usize) -> Self {
        Self { image_size }
    }

    pub fn image_size(&self) -> usize {
        self.image_size
    }

    /// Length of the buffer produced for one image
    pub fn pixel_count(&self) -> usize {
        CHANNELS * self.image_size * self.image_size
    }

    /// Decode and normalise the image at `path`
    pub fn load(&self, path: &Path) -> Result<Vec<f32>> {
        let img = ImageReader::open(path)
            .with_context(|| format!("Cannot open image '{}'", path.display()))?
            .with_guessed_format()
            .with_context(|| format!("Cannot read image '{}'", path.display()))?
            .decode()
            .with_context(|| format!("Cannot decode image '{}'", path.display()))?;
        Ok(self.process(&img))
    }

    /// Read only the header of the image at `path`
    pub fn check(&self, path: &Path) -> Result<(u32, u32)> {
        ImageReader::open(path)
            .with_context(|| format!("Cannot open image '{}'", path.display()))?
            .with_guessed_format()
            .with_context(|| format!("Cannot read image '{}'", path.display()))?
            .into_dimensions()
            .with_context(|| format!("Not a readable image '{}'", path.display()))
    }

    /// Resize and normalise an already decoded image
    pub fn process(&self, img: &DynamicImage) -> Vec<f32> {
        let size = self.image_size as u32;
        let rgb  = img.resize_exact(size, size, FilterType::Triangle).to_rgb8();

        let plane   = self.image_size * self.image_size;
        let mut out = vec![0.0f32; self.pixel_count()];
        for (x, y, pixel) in rgb.enumerate_pixels() {
            let offset = y as usize * self.image_size + x as usize;
            for c in 0..CHANNELS {
                out[c * plane + offset] = pixel[c] as f32 / 255.0;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    #[test]
    fn test_process_layout_and_range() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 6, Rgb([255, 0, 51])));
        let pre = ImagePreprocessor::new(4);
        let out = pre.process(&img);

        assert_eq!(out.len(), 3 * 4 * 4);
        // channel-major: first plane red, second green, third blue
        assert!(out[..16].iter().all(|&v| (v - 1.0).abs() < 1e-6));
        assert!(out[16..32].iter().all(|&v| v.abs() < 1e-6));
        assert!(out[32..].iter().all(|&v| (v - 0.2).abs() < 1e-6));
    }

    #[test]
    fn test_load_from_disk() {
        let dir  = TempDir::new().unwrap();
        let path = dir.path().join("px.png");
        RgbImage::from_pixel(3, 3, Rgb([0, 255, 0])).save(&path).unwrap();

        let out = ImagePreprocessor::new(2).load(&path).unwrap();
        assert_eq!(out.len(), 12);
        assert!((out[4] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir  = TempDir::new().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();
        assert!(ImagePreprocessor::new(8).load(&path).is_err());
    }

    #[test]
    fn test_check_reads_header_only() {
        let dir  = TempDir::new().unwrap();
        let good = dir.path().join("good.png");
        RgbImage::from_pixel(7, 3, Rgb([1, 2, 3])).save(&good).unwrap();
        let bad  = dir.path().join("bad.png");
        std::fs::write(&bad, b"\x89PNG but not really").unwrap();

        let pre = ImagePreprocessor::new(4);
        assert_eq!(pre.check(&good).unwrap(), (7, 3));
        assert!(pre.check(&bad).is_err());
    }
}
