// ============================================================
// Layer 4 — Image Dataset
// ============================================================
// Implements Burn's Dataset trait over a list of samples.
// By default images are decoded lazily on every get(), inside
// the DataLoader's worker threads, after `verify` has read every
// header once; `preload` decodes the whole list up front. Either
// way the first unreadable file is an error before training.

use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::data::preprocessor::ImagePreprocessor;
use crate::domain::sample::Sample;

/// One decoded image ready for batching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageItem {
    /// CHW float pixels in [0, 1]
    pub pixels: Vec<f32>,
    pub label:  usize,
}

pub struct ImageDataset {
    samples:      Vec<Sample>,
    preprocessor: ImagePreprocessor,
    cached:       Option<Vec<ImageItem>>,
}

impl ImageDataset {
    pub fn new(samples: Vec<Sample>, preprocessor: ImagePreprocessor) -> Self {
        Self { samples, preprocessor, cached: None }
    }

    /// Decode every image now, failing on the first unreadable file.
    pub fn preload(samples: Vec<Sample>, preprocessor: ImagePreprocessor) -> anyhow::Result<Self> {
        let cached = samples
            .iter()
            .map(|s| {
                preprocessor
                    .load(&s.path)
                    .map(|pixels| ImageItem { pixels, label: s.label })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self { samples, preprocessor, cached: Some(cached) })
    }

    /// Check that every sample is a readable image.
    pub fn verify(&self) -> anyhow::Result<()> {
        if self.cached.is_some() {
            return Ok(());
        }
        for sample in &self.samples {
            self.preprocessor.check(&sample.path)?;
        }
        tracing::debug!("Verified {} image headers", self.samples.len());
        Ok(())
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }
}

impl Dataset<ImageItem> for ImageDataset {
    fn get(&self, index: usize) -> Option<ImageItem> {
        if let Some(cached) = &self.cached {
            return cached.get(index).cloned();
        }

        let sample = self.samples.get(index)?;
        match self.preprocessor.load(&sample.path) {
            Ok(pixels) => Some(ImageItem { pixels, label: sample.label }),
            Err(e) => {
                // Ends the pass; the trainer fails the run on a short pass.
                tracing::error!("{:#}", e);
                None
            }
        }
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    #[test]
    fn test_lazy_and_preloaded_agree() {
        let dir = TempDir::new().unwrap();
        let mut samples = Vec::new();
        for (i, shade) in [10u8, 200].into_iter().enumerate() {
            let path = dir.path().join(format!("{i}.png"));
            RgbImage::from_pixel(5, 5, Rgb([shade, shade, shade])).save(&path).unwrap();
            samples.push(Sample::new(path, i));
        }

        let pre     = ImagePreprocessor::new(4);
        let lazy    = ImageDataset::new(samples.clone(), pre);
        let preload = ImageDataset::preload(samples, pre).unwrap();

        assert_eq!(lazy.len(), 2);
        assert_eq!(preload.len(), 2);
        let a = lazy.get(1).unwrap();
        let b = preload.get(1).unwrap();
        assert_eq!(a.label, 1);
        assert_eq!(a.pixels, b.pixels);
        assert!(lazy.get(2).is_none());
    }

    #[test]
    fn test_preload_surfaces_bad_file() {
        let dir  = TempDir::new().unwrap();
        let path = dir.path().join("bad.png");
        std::fs::write(&path, b"nope").unwrap();
        let result = ImageDataset::preload(vec![Sample::new(path, 0)], ImagePreprocessor::new(4));
        assert!(result.is_err());
    }

    #[test]
    fn test_verify_finds_unreadable_file() {
        let dir  = TempDir::new().unwrap();
        let good = dir.path().join("good.png");
        RgbImage::from_pixel(3, 3, Rgb([5, 5, 5])).save(&good).unwrap();
        let bad  = dir.path().join("corrupt.png");
        std::fs::write(&bad, b"garbage").unwrap();

        let pre = ImagePreprocessor::new(4);
        assert!(ImageDataset::new(vec![Sample::new(&good, 0)], pre).verify().is_ok());

        let err = ImageDataset::new(vec![Sample::new(&good, 0), Sample::new(&bad, 1)], pre)
            .verify()
            .unwrap_err();
        assert!(format!("{:#}", err).contains("corrupt.png"));
    }
}
